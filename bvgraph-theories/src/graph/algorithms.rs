//! Graph algorithms over a fixed (model) graph
//!
//! Graphs here are arc lists: arc `i` goes from `arcs[i].from` to
//! `arcs[i].to` with a non-negative weight. Distances saturate at
//! [`INFINITY`], which stands for "unreachable".

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

/// Distance of an unreachable node
pub const INFINITY: u64 = u64::MAX;

/// A weighted arc
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arc {
    /// Tail node
    pub from: usize,
    /// Head node
    pub to: usize,
    /// Length or capacity
    pub weight: u64,
}

/// Outgoing arc indices per node
#[must_use]
pub fn adjacency(num_nodes: usize, arcs: &[Arc]) -> Vec<Vec<usize>> {
    let mut out = vec![Vec::new(); num_nodes];
    for (i, arc) in arcs.iter().enumerate() {
        out[arc.from].push(i);
    }
    out
}

/// Single-source shortest paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPaths {
    /// Distance per node, [`INFINITY`] if unreachable.
    pub dist: Vec<u64>,
    /// Arc used to reach each node on a shortest path.
    pub parent: Vec<Option<usize>>,
}

impl ShortestPaths {
    /// Arcs of a shortest path from the source to `target`, in order.
    #[must_use]
    pub fn path_to(&self, arcs: &[Arc], target: usize) -> Option<Vec<usize>> {
        if self.dist[target] == INFINITY {
            return None;
        }
        let mut path = Vec::new();
        let mut node = target;
        while let Some(arc) = self.parent[node] {
            path.push(arc);
            node = arcs[arc].from;
        }
        path.reverse();
        Some(path)
    }

    /// Nodes of a shortest path from the source to `target`, in order.
    #[must_use]
    pub fn nodes_to(&self, arcs: &[Arc], source: usize, target: usize) -> Option<Vec<usize>> {
        let path = self.path_to(arcs, target)?;
        let mut nodes = Vec::with_capacity(path.len() + 1);
        nodes.push(source);
        nodes.extend(path.iter().map(|&a| arcs[a].to));
        Some(nodes)
    }
}

/// Breadth-first search counting every arc as length 1.
#[must_use]
pub fn bfs(num_nodes: usize, arcs: &[Arc], source: usize) -> ShortestPaths {
    let adj = adjacency(num_nodes, arcs);
    let mut dist = vec![INFINITY; num_nodes];
    let mut parent = vec![None; num_nodes];
    let mut queue = VecDeque::new();
    dist[source] = 0;
    queue.push_back(source);

    while let Some(u) = queue.pop_front() {
        for &a in &adj[u] {
            let v = arcs[a].to;
            if dist[v] == INFINITY {
                dist[v] = dist[u] + 1;
                parent[v] = Some(a);
                queue.push_back(v);
            }
        }
    }
    ShortestPaths { dist, parent }
}

/// Dijkstra over arc weights
#[must_use]
pub fn dijkstra(num_nodes: usize, arcs: &[Arc], source: usize) -> ShortestPaths {
    let adj = adjacency(num_nodes, arcs);
    let mut dist = vec![INFINITY; num_nodes];
    let mut parent = vec![None; num_nodes];
    let mut heap = BinaryHeap::new();
    dist[source] = 0;
    heap.push(Reverse((0u64, source)));

    while let Some(Reverse((d, u))) = heap.pop() {
        if d > dist[u] {
            continue;
        }
        for &a in &adj[u] {
            let v = arcs[a].to;
            let candidate = d.saturating_add(arcs[a].weight);
            if candidate < dist[v] {
                dist[v] = candidate;
                parent[v] = Some(a);
                heap.push(Reverse((candidate, v)));
            }
        }
    }
    ShortestPaths { dist, parent }
}

/// Maximum flow with its certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxFlow {
    /// Flow value
    pub value: u64,
    /// Flow on each arc
    pub flow: Vec<u64>,
    /// Nodes reachable from the source in the final residual graph.
    pub source_side: Vec<bool>,
}

impl MaxFlow {
    /// Arcs of the minimum cut: from the source side to the sink side.
    #[must_use]
    pub fn cut_arcs(&self, arcs: &[Arc]) -> Vec<usize> {
        arcs.iter()
            .enumerate()
            .filter(|(_, a)| self.source_side[a.from] && !self.source_side[a.to])
            .map(|(i, _)| i)
            .collect()
    }
}

/// Edmonds-Karp maximum flow from `source` to `sink`, arc weights as capacities.
#[must_use]
pub fn max_flow(num_nodes: usize, arcs: &[Arc], source: usize, sink: usize) -> MaxFlow {
    // Residual arc 2i is arc i, 2i+1 its reverse
    let mut residual: Vec<u64> = arcs.iter().flat_map(|a| [a.weight, 0]).collect();
    let mut adj = vec![Vec::new(); num_nodes];
    for (i, arc) in arcs.iter().enumerate() {
        adj[arc.from].push(2 * i);
        adj[arc.to].push(2 * i + 1);
    }
    let head = |r: usize| {
        let arc = &arcs[r / 2];
        if r % 2 == 0 { arc.to } else { arc.from }
    };

    let mut value = 0u64;
    loop {
        let mut parent: Vec<Option<usize>> = vec![None; num_nodes];
        let mut visited = vec![false; num_nodes];
        visited[source] = true;
        let mut queue = VecDeque::from([source]);
        while let Some(u) = queue.pop_front() {
            if u == sink {
                break;
            }
            for &r in &adj[u] {
                let v = head(r);
                if !visited[v] && residual[r] > 0 {
                    visited[v] = true;
                    parent[v] = Some(r);
                    queue.push_back(v);
                }
            }
        }

        if source == sink || !visited[sink] {
            let flow = arcs
                .iter()
                .enumerate()
                .map(|(i, a)| a.weight - residual[2 * i])
                .collect();
            return MaxFlow {
                value,
                flow,
                source_side: visited,
            };
        }

        let mut bottleneck = u64::MAX;
        let mut node = sink;
        while let Some(r) = parent[node] {
            bottleneck = bottleneck.min(residual[r]);
            node = head(r ^ 1);
        }
        let mut node = sink;
        while let Some(r) = parent[node] {
            residual[r] -= bottleneck;
            residual[r ^ 1] = residual[r ^ 1].saturating_add(bottleneck);
            node = head(r ^ 1);
        }
        value = value.saturating_add(bottleneck);
    }
}

/// A directed cycle as arc indices, if one exists.
#[must_use]
pub fn find_directed_cycle(num_nodes: usize, arcs: &[Arc]) -> Option<Vec<usize>> {
    const WHITE: u8 = 0;
    const GREY: u8 = 1;
    const BLACK: u8 = 2;

    let adj = adjacency(num_nodes, arcs);
    let mut color = vec![WHITE; num_nodes];
    let mut parent: Vec<Option<usize>> = vec![None; num_nodes];

    for root in 0..num_nodes {
        if color[root] != WHITE {
            continue;
        }
        // (node, next adjacency position)
        let mut stack = vec![(root, 0usize)];
        color[root] = GREY;
        while let Some(top) = stack.last_mut() {
            let u = top.0;
            if let Some(&a) = adj[u].get(top.1) {
                top.1 += 1;
                let v = arcs[a].to;
                match color[v] {
                    WHITE => {
                        color[v] = GREY;
                        parent[v] = Some(a);
                        stack.push((v, 0));
                    }
                    GREY => {
                        // Back arc closes a cycle through the grey path
                        let mut cycle = vec![a];
                        let mut node = u;
                        while node != v {
                            let Some(p) = parent[node] else {
                                break;
                            };
                            cycle.push(p);
                            node = arcs[p].from;
                        }
                        cycle.reverse();
                        return Some(cycle);
                    }
                    _ => {}
                }
            } else {
                color[u] = BLACK;
                stack.pop();
            }
        }
    }
    None
}

/// Disjoint-set forest with path halving
#[derive(Debug, Clone)]
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// False if `x` and `y` were already connected.
    fn union(&mut self, x: usize, y: usize) -> bool {
        let (rx, ry) = (self.find(x), self.find(y));
        if rx == ry {
            return false;
        }
        self.parent[rx] = ry;
        true
    }
}

/// A cycle of the graph read as undirected, as arc indices.
#[must_use]
pub fn find_undirected_cycle(num_nodes: usize, arcs: &[Arc]) -> Option<Vec<usize>> {
    let mut uf = UnionFind::new(num_nodes);
    let mut forest: Vec<Vec<(usize, usize)>> = vec![Vec::new(); num_nodes];

    for (i, arc) in arcs.iter().enumerate() {
        if !uf.union(arc.from, arc.to) {
            // Close the cycle through the forest path between the endpoints
            let mut parent: Vec<Option<(usize, usize)>> = vec![None; num_nodes];
            let mut visited = vec![false; num_nodes];
            visited[arc.from] = true;
            let mut queue = VecDeque::from([arc.from]);
            while let Some(u) = queue.pop_front() {
                for &(v, a) in &forest[u] {
                    if !visited[v] {
                        visited[v] = true;
                        parent[v] = Some((u, a));
                        queue.push_back(v);
                    }
                }
            }
            let mut cycle = vec![i];
            let mut node = arc.to;
            while let Some((prev, a)) = parent[node] {
                cycle.push(a);
                node = prev;
            }
            return Some(cycle);
        }
        forest[arc.from].push((arc.to, i));
        forest[arc.to].push((arc.from, i));
    }
    None
}

/// Minimum spanning tree of the graph read as undirected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanningTree {
    /// Total weight, [`INFINITY`] if the graph is disconnected.
    pub weight: u64,
    /// Arcs chosen for the tree (a forest when disconnected).
    pub arcs: Vec<usize>,
}

impl SpanningTree {
    /// True if every node is spanned.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.weight != INFINITY
    }
}

/// Kruskal's algorithm; a graph with at most one node has weight 0.
#[must_use]
pub fn minimum_spanning_tree(num_nodes: usize, arcs: &[Arc]) -> SpanningTree {
    let mut order: Vec<usize> = (0..arcs.len()).collect();
    order.sort_by_key(|&i| (arcs[i].weight, i));

    let mut uf = UnionFind::new(num_nodes);
    let mut chosen = Vec::new();
    let mut weight = 0u64;
    for i in order {
        if uf.union(arcs[i].from, arcs[i].to) {
            chosen.push(i);
            weight = weight.saturating_add(arcs[i].weight);
        }
    }
    if chosen.len() + 1 < num_nodes {
        weight = INFINITY;
    }
    SpanningTree {
        weight,
        arcs: chosen,
    }
}
