//! Graph theory: reachability, distance, maximum flow, acyclicity and
//! minimum spanning tree weight
//!
//! Edges are switched on and off by their enable literal and carry either a
//! constant or a bitvector weight. Predicates are bound to fresh literals and
//! checked on complete models. A violated predicate yields a lemma built from
//! a witness (a path, a cut, a flow, a cycle or a spanning tree) of the model graph.

use super::algorithms::{self, Arc, INFINITY, MaxFlow, ShortestPaths, SpanningTree};
use crate::bv::{BvId, BvTheory, Comparison, model_value};
use crate::theory::{Lemma, Theory, TheoryEnv, TheoryResult};
use bvgraph_core::{Error, Result};
use bvgraph_sat::{LBool, Lit, Solver as SatSolver};
use rustc_hash::FxHashMap;
use tracing::trace;

/// Handle of a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GraphId(u32);

impl GraphId {
    /// Create from a raw id
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw id
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Index for per-graph tables
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of a node within its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Create from a raw id
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw id
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Index for per-node tables
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Edge weight: a length for distances, a capacity for flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weight {
    /// Fixed weight
    Const(u64),
    /// Weight given by a bitvector
    Bv(BvId),
}

/// Bound of a distance or flow predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    /// Fixed bound
    Const(u64),
    /// Bound given by a bitvector
    Bv(BvId),
    /// No bound: plain reachability
    Unbounded,
}

/// How path lengths are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Every edge has length 1
    Hops,
    /// Edges have their weights as lengths
    Weighted,
}

/// A graph predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// `dist(source, target) <= bound` (or `<` when strict)
    Distance {
        /// Start node
        source: NodeId,
        /// End node
        target: NodeId,
        /// Length measure
        metric: Metric,
        /// Upper bound
        bound: Bound,
        /// Strict comparison
        strict: bool,
    },
    /// `maxflow(source, target) >= bound` (or `>` when strict)
    MaxFlow {
        /// Flow source
        source: NodeId,
        /// Flow sink
        target: NodeId,
        /// Lower bound
        bound: Bound,
        /// Strict comparison
        strict: bool,
    },
    /// The enabled edges contain no (directed) cycle
    Acyclic {
        /// Directed cycles only
        directed: bool,
    },
    /// The enabled edges, read as undirected, span every node with a
    /// minimum spanning tree of weight `<= bound` (or `<` when strict).
    ///
    /// A disconnected graph has no spanning tree, so the predicate is false.
    SpanningTree {
        /// Upper bound on the tree weight
        bound: Bound,
        /// Strict comparison
        strict: bool,
    },
}

impl Predicate {
    /// Reachability of `target` from `source`
    #[must_use]
    pub fn reach(source: NodeId, target: NodeId) -> Self {
        Self::Distance {
            source,
            target,
            metric: Metric::Hops,
            bound: Bound::Unbounded,
            strict: false,
        }
    }
}

/// An edge of the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Tail
    pub from: NodeId,
    /// Head
    pub to: NodeId,
    /// True iff the edge is present
    pub lit: Lit,
    /// Length or capacity
    pub weight: Weight,
}

/// Counters of the graph theory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Models checked
    pub checks: u64,
    /// Lemmas produced
    pub lemmas: u64,
}

/// Enabled edges of a model, as arcs
#[derive(Debug)]
struct ModelGraph {
    arcs: Vec<Arc>,
    /// Edge index of each arc
    edge_of_arc: Vec<usize>,
}

/// A graph and its predicates
#[derive(Debug)]
pub struct GraphTheory {
    id: GraphId,
    num_nodes: u32,
    edges: Vec<Edge>,
    edge_index: FxHashMap<Lit, usize>,
    atoms: Vec<(Lit, Predicate)>,
    atom_index: FxHashMap<Lit, usize>,
    stats: GraphStats,
}

impl GraphTheory {
    /// Create an empty graph
    #[must_use]
    pub fn new(id: GraphId) -> Self {
        Self {
            id,
            num_nodes: 0,
            edges: Vec::new(),
            edge_index: FxHashMap::default(),
            atoms: Vec::new(),
            atom_index: FxHashMap::default(),
            stats: GraphStats::default(),
        }
    }

    /// Graph handle
    #[must_use]
    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Number of nodes
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes as usize
    }

    /// All edges, in creation order
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// All predicates with their literals
    #[must_use]
    pub fn atoms(&self) -> &[(Lit, Predicate)] {
        &self.atoms
    }

    /// Counters
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        self.stats
    }

    /// Add a node
    pub fn add_node(&mut self) -> NodeId {
        let node = NodeId(self.num_nodes);
        self.num_nodes += 1;
        node
    }

    fn check_node(&self, node: NodeId) -> Result<()> {
        if node.0 >= self.num_nodes {
            return Err(Error::UnknownNode {
                graph: self.id.0,
                node: node.0,
            });
        }
        Ok(())
    }

    /// Add an edge; returns its enable literal
    pub fn add_edge(
        &mut self,
        sat: &mut SatSolver,
        from: NodeId,
        to: NodeId,
        weight: Weight,
    ) -> Result<Lit> {
        self.check_node(from)?;
        self.check_node(to)?;
        let lit = Lit::pos(sat.new_var());
        self.edge_index.insert(lit, self.edges.len());
        self.edges.push(Edge {
            from,
            to,
            lit,
            weight,
        });
        Ok(lit)
    }

    /// Edge enabled by `lit`
    #[must_use]
    pub fn edge(&self, lit: Lit) -> Option<&Edge> {
        self.edge_index.get(&lit).map(|&i| &self.edges[i])
    }

    /// Bind `predicate` to a fresh literal
    pub fn add_predicate(&mut self, sat: &mut SatSolver, predicate: Predicate) -> Result<Lit> {
        match predicate {
            Predicate::Distance { source, target, .. } | Predicate::MaxFlow { source, target, .. } => {
                self.check_node(source)?;
                self.check_node(target)?;
            }
            Predicate::Acyclic { .. } | Predicate::SpanningTree { .. } => {}
        }
        let lit = Lit::pos(sat.new_var());
        self.atom_index.insert(lit, self.atoms.len());
        self.atoms.push((lit, predicate));
        Ok(lit)
    }

    /// Predicate bound to `lit`
    #[must_use]
    pub fn predicate(&self, lit: Lit) -> Option<Predicate> {
        self.atom_index.get(&lit).map(|&i| self.atoms[i].1)
    }

    fn weight_value(weight: Weight, model: &[LBool], bv: &BvTheory) -> Result<u64> {
        match weight {
            Weight::Const(w) => Ok(w),
            Weight::Bv(id) => bv.value(model, id),
        }
    }

    fn bound_value(bound: Bound, model: &[LBool], bv: &BvTheory) -> Result<Option<u64>> {
        match bound {
            Bound::Const(b) => Ok(Some(b)),
            Bound::Bv(id) => bv.value(model, id).map(Some),
            Bound::Unbounded => Ok(None),
        }
    }

    fn model_graph(&self, model: &[LBool], bv: &BvTheory, hops: bool) -> Result<ModelGraph> {
        let mut arcs = Vec::new();
        let mut edge_of_arc = Vec::new();
        for (i, edge) in self.edges.iter().enumerate() {
            if !model_value(model, edge.lit).is_true() {
                continue;
            }
            let weight = if hops {
                1
            } else {
                Self::weight_value(edge.weight, model, bv)?
            };
            arcs.push(Arc {
                from: edge.from.index(),
                to: edge.to.index(),
                weight,
            });
            edge_of_arc.push(i);
        }
        Ok(ModelGraph { arcs, edge_of_arc })
    }

    fn shortest_paths(&self, graph: &ModelGraph, source: NodeId, metric: Metric) -> ShortestPaths {
        match metric {
            Metric::Hops => algorithms::bfs(self.num_nodes(), &graph.arcs, source.index()),
            Metric::Weighted => algorithms::dijkstra(self.num_nodes(), &graph.arcs, source.index()),
        }
    }

    fn atom(&self, lit: Lit) -> Result<Predicate> {
        self.predicate(lit)
            .ok_or(Error::NotAGraphLiteral(lit.var().id()))
    }

    /// Edges of a shortest path witnessing a reach/distance literal in `model`.
    ///
    /// `None` when the target is unreachable.
    pub fn path_edges(
        &self,
        model: &[LBool],
        bv: &BvTheory,
        lit: Lit,
    ) -> Result<Option<Vec<Lit>>> {
        let Predicate::Distance {
            source,
            target,
            metric,
            ..
        } = self.atom(lit)?
        else {
            return Err(Error::NotAGraphLiteral(lit.var().id()));
        };
        let graph = self.model_graph(model, bv, metric == Metric::Hops)?;
        let sp = self.shortest_paths(&graph, source, metric);
        Ok(sp.path_to(&graph.arcs, target.index()).map(|path| {
            path.into_iter()
                .map(|a| self.edges[graph.edge_of_arc[a]].lit)
                .collect()
        }))
    }

    /// Nodes of a shortest path witnessing a reach/distance literal in `model`
    pub fn path_nodes(
        &self,
        model: &[LBool],
        bv: &BvTheory,
        lit: Lit,
    ) -> Result<Option<Vec<NodeId>>> {
        let Predicate::Distance {
            source,
            target,
            metric,
            ..
        } = self.atom(lit)?
        else {
            return Err(Error::NotAGraphLiteral(lit.var().id()));
        };
        let graph = self.model_graph(model, bv, metric == Metric::Hops)?;
        let sp = self.shortest_paths(&graph, source, metric);
        Ok(sp
            .nodes_to(&graph.arcs, source.index(), target.index())
            .map(|nodes| nodes.into_iter().map(|n| NodeId(n as u32)).collect()))
    }

    /// Length of a shortest path for a reach/distance literal in `model`.
    ///
    /// Counted in hops or summed weights depending on the metric; `None`
    /// when the target is unreachable.
    pub fn path_length(&self, model: &[LBool], bv: &BvTheory, lit: Lit) -> Result<Option<u64>> {
        let Predicate::Distance {
            source,
            target,
            metric,
            ..
        } = self.atom(lit)?
        else {
            return Err(Error::NotAGraphLiteral(lit.var().id()));
        };
        let graph = self.model_graph(model, bv, metric == Metric::Hops)?;
        let dist = self.shortest_paths(&graph, source, metric).dist[target.index()];
        Ok((dist != INFINITY).then_some(dist))
    }

    fn flow(&self, model: &[LBool], bv: &BvTheory, lit: Lit) -> Result<(ModelGraph, MaxFlow)> {
        let Predicate::MaxFlow { source, target, .. } = self.atom(lit)? else {
            return Err(Error::NotAGraphLiteral(lit.var().id()));
        };
        let graph = self.model_graph(model, bv, false)?;
        let flow = algorithms::max_flow(self.num_nodes(), &graph.arcs, source.index(), target.index());
        Ok((graph, flow))
    }

    /// Maximum flow value of a flow literal's network in `model`
    pub fn max_flow_value(&self, model: &[LBool], bv: &BvTheory, lit: Lit) -> Result<u64> {
        Ok(self.flow(model, bv, lit)?.1.value)
    }

    /// Flow on the edge enabled by `edge_lit` in a maximum flow of `flow_lit`
    pub fn edge_flow(
        &self,
        model: &[LBool],
        bv: &BvTheory,
        flow_lit: Lit,
        edge_lit: Lit,
    ) -> Result<u64> {
        let edge = *self
            .edge_index
            .get(&edge_lit)
            .ok_or(Error::NotAGraphLiteral(edge_lit.var().id()))?;
        let (graph, flow) = self.flow(model, bv, flow_lit)?;
        Ok(graph
            .edge_of_arc
            .iter()
            .position(|&e| e == edge)
            .map_or(0, |arc| flow.flow[arc]))
    }

    fn spanning_tree(&self, model: &[LBool], bv: &BvTheory) -> Result<(ModelGraph, SpanningTree)> {
        let graph = self.model_graph(model, bv, false)?;
        let tree = algorithms::minimum_spanning_tree(self.num_nodes(), &graph.arcs);
        Ok((graph, tree))
    }

    /// Weight of a minimum spanning tree for a spanning tree literal in `model`.
    ///
    /// `None` when the enabled edges leave the graph disconnected.
    pub fn spanning_tree_weight(
        &self,
        model: &[LBool],
        bv: &BvTheory,
        lit: Lit,
    ) -> Result<Option<u64>> {
        let Predicate::SpanningTree { .. } = self.atom(lit)? else {
            return Err(Error::NotAGraphLiteral(lit.var().id()));
        };
        let tree = self.spanning_tree(model, bv)?.1;
        Ok(tree.is_connected().then_some(tree.weight))
    }

    fn check_distance(
        &self,
        model: &[LBool],
        env: &mut TheoryEnv<'_>,
        cache: &mut FxHashMap<(NodeId, Metric), (ModelGraph, ShortestPaths)>,
        lit: Lit,
        predicate: Predicate,
    ) -> Result<Option<Lemma>> {
        let Predicate::Distance {
            source,
            target,
            metric,
            bound,
            strict,
        } = predicate
        else {
            return Ok(None);
        };
        let asserted = model_value(model, lit);
        if asserted.is_undef() {
            return Ok(None);
        }
        let limit = Self::bound_value(bound, model, env.bv)?;
        let within = |d: u64| {
            d != INFINITY
                && match limit {
                    None => true,
                    Some(b) if strict => d < b,
                    Some(b) => d <= b,
                }
        };

        if !cache.contains_key(&(source, metric)) {
            let graph = self.model_graph(model, env.bv, metric == Metric::Hops)?;
            let sp = self.shortest_paths(&graph, source, metric);
            cache.insert((source, metric), (graph, sp));
        }
        let Some((graph, sp)) = cache.get(&(source, metric)) else {
            return Ok(None);
        };
        let reached = within(sp.dist[target.index()]);

        if asserted.is_true() && !reached {
            // Every path leaves the set of nodes within the bound
            let mut lemma = vec![!lit];
            for edge in &self.edges {
                if !within(sp.dist[edge.from.index()]) {
                    continue;
                }
                if !model_value(model, edge.lit).is_true() {
                    lemma.push(edge.lit);
                } else if let (Metric::Weighted, Weight::Bv(w)) = (metric, edge.weight) {
                    let current = env.bv.value(model, w)?;
                    lemma.push(env.bv.compare_const(env.sat, Comparison::Lt, w, current)?);
                }
            }
            if let (Bound::Bv(b), Some(current)) = (bound, limit) {
                lemma.push(env.bv.compare_const(env.sat, Comparison::Gt, b, current)?);
            }
            trace!(graph = self.id.0, ?lit, size = lemma.len(), "distance cut lemma");
            return Ok(Some(lemma));
        }

        if asserted.is_false() && reached {
            // The witness path keeps the distance within the bound
            let length = sp.dist[target.index()];
            let path = sp.path_to(&graph.arcs, target.index()).unwrap_or_default();
            let mut lemma = vec![lit];
            for arc in path {
                let edge = self.edges[graph.edge_of_arc[arc]];
                lemma.push(!edge.lit);
                if let (Metric::Weighted, Weight::Bv(w)) = (metric, edge.weight) {
                    let current = env.bv.value(model, w)?;
                    lemma.push(env.bv.compare_const(env.sat, Comparison::Gt, w, current)?);
                }
            }
            if let Bound::Bv(b) = bound {
                let op = if strict { Comparison::Leq } else { Comparison::Lt };
                lemma.push(env.bv.compare_const(env.sat, op, b, length)?);
            }
            trace!(graph = self.id.0, ?lit, size = lemma.len(), "distance path lemma");
            return Ok(Some(lemma));
        }

        Ok(None)
    }

    fn check_flow(
        &self,
        model: &[LBool],
        env: &mut TheoryEnv<'_>,
        lit: Lit,
        predicate: Predicate,
    ) -> Result<Option<Lemma>> {
        let Predicate::MaxFlow {
            source,
            target,
            bound,
            strict,
        } = predicate
        else {
            return Ok(None);
        };
        let asserted = model_value(model, lit);
        if asserted.is_undef() {
            return Ok(None);
        }
        let limit = Self::bound_value(bound, model, env.bv)?.unwrap_or(0);
        let graph = self.model_graph(model, env.bv, false)?;
        let flow = algorithms::max_flow(self.num_nodes(), &graph.arcs, source.index(), target.index());
        let holds = if strict {
            flow.value > limit
        } else {
            flow.value >= limit
        };

        if asserted.is_true() && !holds {
            // The minimum cut caps the flow
            let mut lemma = vec![!lit];
            for edge in &self.edges {
                if !flow.source_side[edge.from.index()] || flow.source_side[edge.to.index()] {
                    continue;
                }
                if !model_value(model, edge.lit).is_true() {
                    lemma.push(edge.lit);
                } else if let Weight::Bv(c) = edge.weight {
                    let current = env.bv.value(model, c)?;
                    lemma.push(env.bv.compare_const(env.sat, Comparison::Gt, c, current)?);
                }
            }
            if let Bound::Bv(b) = bound {
                let op = if strict { Comparison::Lt } else { Comparison::Leq };
                lemma.push(env.bv.compare_const(env.sat, op, b, flow.value)?);
            }
            trace!(graph = self.id.0, ?lit, cut = flow.value, "flow cut lemma");
            return Ok(Some(lemma));
        }

        if asserted.is_false() && holds {
            // The current flow stays feasible
            let mut lemma = vec![lit];
            for (arc, &amount) in flow.flow.iter().enumerate() {
                if amount == 0 {
                    continue;
                }
                let edge = self.edges[graph.edge_of_arc[arc]];
                lemma.push(!edge.lit);
                if let Weight::Bv(c) = edge.weight {
                    lemma.push(env.bv.compare_const(env.sat, Comparison::Lt, c, amount)?);
                }
            }
            if let Bound::Bv(b) = bound {
                let op = if strict { Comparison::Geq } else { Comparison::Gt };
                lemma.push(env.bv.compare_const(env.sat, op, b, flow.value)?);
            }
            trace!(graph = self.id.0, ?lit, flow = flow.value, "flow witness lemma");
            return Ok(Some(lemma));
        }

        Ok(None)
    }

    fn check_spanning_tree(
        &self,
        model: &[LBool],
        env: &mut TheoryEnv<'_>,
        lit: Lit,
        bound: Bound,
        strict: bool,
    ) -> Result<Option<Lemma>> {
        let asserted = model_value(model, lit);
        if asserted.is_undef() {
            return Ok(None);
        }
        let limit = Self::bound_value(bound, model, env.bv)?;
        let (graph, tree) = self.spanning_tree(model, env.bv)?;
        let holds = tree.is_connected()
            && match limit {
                None => true,
                Some(b) if strict => tree.weight < b,
                Some(b) => tree.weight <= b,
            };

        if asserted.is_true() && !holds {
            // Only a new edge or a lighter one can lower the tree weight
            let mut lemma = vec![!lit];
            for edge in &self.edges {
                if !model_value(model, edge.lit).is_true() {
                    lemma.push(edge.lit);
                } else if let Weight::Bv(w) = edge.weight {
                    let current = env.bv.value(model, w)?;
                    lemma.push(env.bv.compare_const(env.sat, Comparison::Lt, w, current)?);
                }
            }
            if let (Bound::Bv(b), Some(current), true) = (bound, limit, tree.is_connected()) {
                lemma.push(env.bv.compare_const(env.sat, Comparison::Gt, b, current)?);
            }
            trace!(graph = self.id.0, ?lit, weight = tree.weight, "spanning tree cut lemma");
            return Ok(Some(lemma));
        }

        if asserted.is_false() && holds {
            // The current tree stays available
            let mut lemma = vec![lit];
            for &arc in &tree.arcs {
                let edge = self.edges[graph.edge_of_arc[arc]];
                lemma.push(!edge.lit);
                if let Weight::Bv(w) = edge.weight {
                    let current = env.bv.value(model, w)?;
                    lemma.push(env.bv.compare_const(env.sat, Comparison::Gt, w, current)?);
                }
            }
            if let Bound::Bv(b) = bound {
                let op = if strict { Comparison::Leq } else { Comparison::Lt };
                lemma.push(env.bv.compare_const(env.sat, op, b, tree.weight)?);
            }
            trace!(graph = self.id.0, ?lit, weight = tree.weight, "spanning tree lemma");
            return Ok(Some(lemma));
        }

        Ok(None)
    }

    fn check_acyclic(
        &self,
        model: &[LBool],
        bv: &BvTheory,
        lit: Lit,
        directed: bool,
    ) -> Result<Option<Lemma>> {
        let asserted = model_value(model, lit);
        if asserted.is_undef() {
            return Ok(None);
        }
        let graph = self.model_graph(model, bv, true)?;
        let cycle = if directed {
            algorithms::find_directed_cycle(self.num_nodes(), &graph.arcs)
        } else {
            algorithms::find_undirected_cycle(self.num_nodes(), &graph.arcs)
        };

        match (asserted.is_true(), cycle) {
            (true, Some(cycle)) => {
                let mut lemma = vec![!lit];
                lemma.extend(cycle.into_iter().map(|a| !self.edges[graph.edge_of_arc[a]].lit));
                trace!(graph = self.id.0, ?lit, "cycle lemma");
                Ok(Some(lemma))
            }
            (false, None) => {
                let mut lemma = vec![lit];
                lemma.extend(
                    self.edges
                        .iter()
                        .filter(|e| !model_value(model, e.lit).is_true())
                        .map(|e| e.lit),
                );
                trace!(graph = self.id.0, ?lit, "acyclic witness lemma");
                Ok(Some(lemma))
            }
            _ => Ok(None),
        }
    }
}

impl Theory for GraphTheory {
    fn name(&self) -> &str {
        "graph"
    }

    fn check(&mut self, model: &[LBool], env: &mut TheoryEnv<'_>) -> Result<TheoryResult> {
        self.stats.checks += 1;
        let mut cache = FxHashMap::default();
        let mut lemmas = Vec::new();

        for i in 0..self.atoms.len() {
            let (lit, predicate) = self.atoms[i];
            let lemma = match predicate {
                Predicate::Distance { .. } => {
                    self.check_distance(model, env, &mut cache, lit, predicate)?
                }
                Predicate::MaxFlow { .. } => self.check_flow(model, env, lit, predicate)?,
                Predicate::Acyclic { directed } => self.check_acyclic(model, env.bv, lit, directed)?,
                Predicate::SpanningTree { bound, strict } => {
                    self.check_spanning_tree(model, env, lit, bound, strict)?
                }
            };
            lemmas.extend(lemma);
        }

        if lemmas.is_empty() {
            Ok(TheoryResult::Consistent)
        } else {
            self.stats.lemmas += lemmas.len() as u64;
            Ok(TheoryResult::Lemmas(lemmas))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bvgraph_sat::SolverResult;

    fn setup() -> (SatSolver, BvTheory, GraphTheory) {
        let mut sat = SatSolver::new();
        let t = Lit::pos(sat.new_var());
        sat.add_clause([t]);
        (sat, BvTheory::new(t), GraphTheory::new(GraphId::new(0)))
    }

    /// Solve, check, add lemmas until the graph agrees
    fn solve(sat: &mut SatSolver, bv: &mut BvTheory, g: &mut GraphTheory) -> bool {
        loop {
            if sat.solve() != SolverResult::Sat {
                return false;
            }
            let model = sat.model().to_vec();
            let mut env = TheoryEnv {
                sat: &mut *sat,
                bv: &mut *bv,
            };
            match g.check(&model, &mut env).unwrap() {
                TheoryResult::Consistent => return true,
                TheoryResult::Lemmas(lemmas) => {
                    for lemma in lemmas {
                        for &l in &lemma {
                            assert!(!model_value(&model, l).is_true(), "lemma satisfied by model");
                        }
                        sat.add_clause(lemma);
                    }
                }
            }
        }
    }

    #[test]
    fn test_unknown_node_rejected() {
        let (mut sat, _, mut g) = setup();
        let a = g.add_node();
        assert_eq!(
            g.add_edge(&mut sat, a, NodeId::new(3), Weight::Const(1)),
            Err(Error::UnknownNode { graph: 0, node: 3 })
        );
    }

    #[test]
    fn test_reach_forces_an_edge() {
        let (mut sat, mut bv, mut g) = setup();
        let n: Vec<NodeId> = (0..3).map(|_| g.add_node()).collect();
        let e01 = g.add_edge(&mut sat, n[0], n[1], Weight::Const(1)).unwrap();
        let e12 = g.add_edge(&mut sat, n[1], n[2], Weight::Const(1)).unwrap();
        let reach = g.add_predicate(&mut sat, Predicate::reach(n[0], n[2])).unwrap();
        sat.add_clause([reach]);

        assert!(solve(&mut sat, &mut bv, &mut g));
        assert!(sat.model_value(e01).is_true());
        assert!(sat.model_value(e12).is_true());

        sat.add_clause([!e12]);
        assert!(!solve(&mut sat, &mut bv, &mut g));
    }

    #[test]
    fn test_unreachable_forces_disabled_path() {
        let (mut sat, mut bv, mut g) = setup();
        let n: Vec<NodeId> = (0..3).map(|_| g.add_node()).collect();
        let e01 = g.add_edge(&mut sat, n[0], n[1], Weight::Const(1)).unwrap();
        let e12 = g.add_edge(&mut sat, n[1], n[2], Weight::Const(1)).unwrap();
        let reach = g.add_predicate(&mut sat, Predicate::reach(n[0], n[2])).unwrap();
        sat.add_clause([!reach]);
        sat.add_clause([e01]);

        assert!(solve(&mut sat, &mut bv, &mut g));
        assert!(sat.model_value(e12).is_false());
    }

    #[test]
    fn test_weighted_distance_with_bitvector_weight() {
        let (mut sat, mut bv, mut g) = setup();
        let n: Vec<NodeId> = (0..2).map(|_| g.add_node()).collect();
        let w = bv.new_bv(&mut sat, 4).unwrap();
        let e = g.add_edge(&mut sat, n[0], n[1], Weight::Bv(w)).unwrap();
        let dist = Predicate::Distance {
            source: n[0],
            target: n[1],
            metric: Metric::Weighted,
            bound: Bound::Const(3),
            strict: false,
        };
        let p = g.add_predicate(&mut sat, dist).unwrap();
        let w_big = bv.compare_const(&mut sat, Comparison::Geq, w, 2).unwrap();
        sat.add_clause([p]);
        sat.add_clause([e]);
        sat.add_clause([w_big]);

        assert!(solve(&mut sat, &mut bv, &mut g));
        let value = bv.value(sat.model(), w).unwrap();
        assert!((2..=3).contains(&value));
    }

    #[test]
    fn test_acyclic_directed_breaks_cycle() {
        let (mut sat, mut bv, mut g) = setup();
        let n: Vec<NodeId> = (0..3).map(|_| g.add_node()).collect();
        let edges: Vec<Lit> = (0..3)
            .map(|i| g.add_edge(&mut sat, n[i], n[(i + 1) % 3], Weight::Const(1)).unwrap())
            .collect();
        let acyclic = g
            .add_predicate(&mut sat, Predicate::Acyclic { directed: true })
            .unwrap();
        sat.add_clause([acyclic]);
        sat.add_clause([edges[0]]);
        sat.add_clause([edges[1]]);

        assert!(solve(&mut sat, &mut bv, &mut g));
        assert!(sat.model_value(edges[2]).is_false());
        assert!(g.stats().checks >= 1);
    }

    #[test]
    fn test_max_flow_bound() {
        let (mut sat, mut bv, mut g) = setup();
        let n: Vec<NodeId> = (0..3).map(|_| g.add_node()).collect();
        let a = g.add_edge(&mut sat, n[0], n[1], Weight::Const(2)).unwrap();
        let b = g.add_edge(&mut sat, n[1], n[2], Weight::Const(3)).unwrap();
        let c = g.add_edge(&mut sat, n[0], n[2], Weight::Const(1)).unwrap();
        let flow = Predicate::MaxFlow {
            source: n[0],
            target: n[2],
            bound: Bound::Const(3),
            strict: false,
        };
        let p = g.add_predicate(&mut sat, flow).unwrap();
        sat.add_clause([p]);

        assert!(solve(&mut sat, &mut bv, &mut g));
        for e in [a, b, c] {
            assert!(sat.model_value(e).is_true());
        }
        let model = sat.model().to_vec();
        assert_eq!(g.max_flow_value(&model, &bv, p).unwrap(), 3);
        assert_eq!(g.edge_flow(&model, &bv, p, c).unwrap(), 1);
    }

    #[test]
    fn test_path_length_by_metric() {
        let (mut sat, mut bv, mut g) = setup();
        let n: Vec<NodeId> = (0..3).map(|_| g.add_node()).collect();
        let e01 = g.add_edge(&mut sat, n[0], n[1], Weight::Const(4)).unwrap();
        let e12 = g.add_edge(&mut sat, n[1], n[2], Weight::Const(5)).unwrap();
        let hops = g.add_predicate(&mut sat, Predicate::reach(n[0], n[2])).unwrap();
        let weighted = Predicate::Distance {
            source: n[0],
            target: n[2],
            metric: Metric::Weighted,
            bound: Bound::Unbounded,
            strict: false,
        };
        let weighted = g.add_predicate(&mut sat, weighted).unwrap();
        sat.add_clause([e01]);
        sat.add_clause([e12]);

        assert!(solve(&mut sat, &mut bv, &mut g));
        let model = sat.model().to_vec();
        assert_eq!(g.path_length(&model, &bv, hops).unwrap(), Some(2));
        assert_eq!(g.path_length(&model, &bv, weighted).unwrap(), Some(9));

        sat.add_clause([!e12]);
        assert!(solve(&mut sat, &mut bv, &mut g));
        let model = sat.model().to_vec();
        assert_eq!(g.path_length(&model, &bv, hops).unwrap(), None);
        assert!(g.path_length(&model, &bv, e01).is_err());
    }

    #[test]
    fn test_spanning_tree_weight_bound() {
        let (mut sat, mut bv, mut g) = setup();
        let n: Vec<NodeId> = (0..3).map(|_| g.add_node()).collect();
        let cheap = g.add_edge(&mut sat, n[0], n[1], Weight::Const(1)).unwrap();
        let mid = g.add_edge(&mut sat, n[2], n[1], Weight::Const(2)).unwrap();
        g.add_edge(&mut sat, n[0], n[2], Weight::Const(5)).unwrap();
        let tree = Predicate::SpanningTree {
            bound: Bound::Const(3),
            strict: false,
        };
        let p = g.add_predicate(&mut sat, tree).unwrap();
        sat.add_clause([p]);

        assert!(solve(&mut sat, &mut bv, &mut g));
        assert!(sat.model_value(cheap).is_true());
        assert!(sat.model_value(mid).is_true());
        let model = sat.model().to_vec();
        assert_eq!(g.spanning_tree_weight(&model, &bv, p).unwrap(), Some(3));

        // Without the middle edge the best tree weighs 6
        sat.add_clause([!mid]);
        assert!(!solve(&mut sat, &mut bv, &mut g));
    }

    #[test]
    fn test_spanning_tree_false_forces_heavier_or_disconnected() {
        let (mut sat, mut bv, mut g) = setup();
        let n: Vec<NodeId> = (0..2).map(|_| g.add_node()).collect();
        let w = bv.new_bv(&mut sat, 3).unwrap();
        let e = g.add_edge(&mut sat, n[0], n[1], Weight::Bv(w)).unwrap();
        let strict = Predicate::SpanningTree {
            bound: Bound::Const(4),
            strict: true,
        };
        let p = g.add_predicate(&mut sat, strict).unwrap();
        sat.add_clause([!p]);
        sat.add_clause([e]);

        assert!(solve(&mut sat, &mut bv, &mut g));
        let model = sat.model().to_vec();
        assert!(bv.value(&model, w).unwrap() >= 4);
        assert_eq!(
            g.spanning_tree_weight(&model, &bv, p).unwrap(),
            Some(bv.value(&model, w).unwrap())
        );
    }
}
