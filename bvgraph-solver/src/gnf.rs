//! GNF reader: DIMACS CNF extended with graph and bitvector declarations
//!
//! Clause lines and the problem line are plain DIMACS. Every other line
//! starts with a keyword:
//!
//! ```text
//! digraph <nodes> <edges> <gid>
//! edge <gid> <from> <to> <var> [<weight>]
//! edge_bv <gid> <from> <to> <var> <bvid>
//! bv <bvid> <width> <var>...
//! bv const <bvid> <width> <value>
//! bv + <result> <a> <b>
//! bv - <result> <a> <b>
//! bv <op> <var> <bvid> <const>
//! bv <op> bv <var> <bvid> <bvid>
//! reach <gid> <from> <to> <var>
//! distance_leq <gid> <from> <to> <var> <const>
//! distance_lt <gid> <from> <to> <var> <const>
//! distance_leq_bv <gid> <from> <to> <var> <bvid>
//! distance_lt_bv <gid> <from> <to> <var> <bvid>
//! maximum_flow_geq <gid> <s> <t> <var> <const>
//! maximum_flow_geq_bv <gid> <s> <t> <var> <bvid>
//! acyclic <gid> <var>
//! acyclic_undirected <gid> <var>
//! mst_weight_leq <gid> <var> <const>
//! mst_weight_lt <gid> <var> <const>
//! ```
//!
//! Variables are 1-based; a theory atom declared on `<var>` is made
//! equivalent to it.

use std::collections::BTreeMap;
use std::io::{BufRead, Cursor};

use bvgraph_core::{Error, Result};
use bvgraph_sat::{DimacsCnf, Lit, Var};
use bvgraph_theories::{BvId, Comparison, GraphId, NodeId};
use tracing::debug;

use crate::context::Context;

/// Handles created while reading a GNF file, keyed by their file ids
#[derive(Debug, Clone, Default)]
pub struct GnfProblem {
    vars: Vec<Var>,
    bitvectors: BTreeMap<u32, BvId>,
    graphs: BTreeMap<u32, GraphId>,
}

impl GnfProblem {
    /// Context literal of a DIMACS literal
    #[must_use]
    pub fn lit(&self, dimacs: i32) -> Option<Lit> {
        let index = (dimacs.unsigned_abs() as usize).checked_sub(1)?;
        let var = *self.vars.get(index)?;
        Some(Lit::new(var, dimacs > 0))
    }

    /// DIMACS literal of a context literal over a file variable
    #[must_use]
    pub fn dimacs(&self, lit: Lit) -> Option<i32> {
        let index = self.vars.iter().position(|&v| v == lit.var())?;
        let id = index as i32 + 1;
        Some(if lit.is_neg() { -id } else { id })
    }

    /// Number of file variables
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    /// Bitvector declared with file id `id`
    #[must_use]
    pub fn bitvector(&self, id: u32) -> Option<BvId> {
        self.bitvectors.get(&id).copied()
    }

    /// All bitvectors, ordered by file id
    pub fn bitvectors(&self) -> impl Iterator<Item = (u32, BvId)> + '_ {
        self.bitvectors.iter().map(|(&k, &v)| (k, v))
    }

    /// Graph declared with file id `id`
    #[must_use]
    pub fn graph(&self, id: u32) -> Option<GraphId> {
        self.graphs.get(&id).copied()
    }
}

/// Tokens of one theory line with positional accessors
struct Line<'a> {
    number: usize,
    tokens: Vec<&'a str>,
}

impl<'a> Line<'a> {
    fn err(&self, message: impl Into<String>) -> Error {
        Error::parse(self.number, message)
    }

    fn arity(&self, expected: usize) -> Result<()> {
        if self.tokens.len() != expected {
            return Err(self.err(format!(
                "'{}' expects {} fields, found {}",
                self.tokens[0],
                expected - 1,
                self.tokens.len() - 1
            )));
        }
        Ok(())
    }

    fn token(&self, i: usize) -> Result<&'a str> {
        self.tokens
            .get(i)
            .copied()
            .ok_or_else(|| self.err(format!("missing field {i} of '{}'", self.tokens[0])))
    }

    fn num<T: std::str::FromStr>(&self, i: usize) -> Result<T> {
        let token = self.token(i)?;
        token
            .parse()
            .map_err(|_| self.err(format!("invalid number '{token}'")))
    }
}

struct Reader<'c> {
    ctx: &'c mut Context,
    problem: GnfProblem,
}

impl Reader<'_> {
    fn var(&mut self, line: &Line<'_>, i: usize) -> Result<Var> {
        let id: u32 = line.num(i)?;
        if id == 0 {
            return Err(line.err("variable 0 is not allowed"));
        }
        Ok(self.file_var(id))
    }

    fn file_var(&mut self, id: u32) -> Var {
        while self.problem.vars.len() < id as usize {
            let var = self.ctx.new_var();
            self.problem.vars.push(var);
        }
        self.problem.vars[id as usize - 1]
    }

    fn graph(&self, line: &Line<'_>, i: usize) -> Result<GraphId> {
        let id: u32 = line.num(i)?;
        self.problem
            .graph(id)
            .ok_or_else(|| line.err(format!("undeclared graph {id}")))
    }

    fn node(&self, line: &Line<'_>, g: GraphId, i: usize) -> Result<NodeId> {
        let id: u32 = line.num(i)?;
        if id as usize >= self.ctx.num_nodes(g)? {
            return Err(line.err(format!("node {id} out of range")));
        }
        Ok(NodeId::new(id))
    }

    fn bitvector(&self, line: &Line<'_>, i: usize) -> Result<BvId> {
        let id: u32 = line.num(i)?;
        self.problem
            .bitvector(id)
            .ok_or_else(|| line.err(format!("undeclared bitvector {id}")))
    }

    fn declare_bv(&mut self, line: &Line<'_>, file_id: u32, bv: BvId) -> Result<()> {
        if self.problem.bitvectors.insert(file_id, bv).is_some() {
            return Err(line.err(format!("bitvector {file_id} declared twice")));
        }
        Ok(())
    }

    /// Make file variable `var` equivalent to `lit`
    fn bind(&mut self, var: Var, lit: Lit) -> Result<()> {
        let v = Lit::pos(var);
        self.ctx.add_clause(&[!v, lit])?;
        self.ctx.add_clause(&[v, !lit])
    }

    fn theory_line(&mut self, line: &Line<'_>) -> Result<()> {
        match line.tokens[0] {
            "digraph" => {
                line.arity(4)?;
                let nodes: u32 = line.num(1)?;
                let file_id: u32 = line.num(3)?;
                if self.problem.graphs.contains_key(&file_id) {
                    return Err(line.err(format!("graph {file_id} declared twice")));
                }
                let g = self.ctx.new_graph();
                for _ in 0..nodes {
                    self.ctx.add_node(g)?;
                }
                self.problem.graphs.insert(file_id, g);
            }
            "edge" => {
                if !(5..=6).contains(&line.tokens.len()) {
                    line.arity(6)?;
                }
                let g = self.graph(line, 1)?;
                let (from, to) = (self.node(line, g, 2)?, self.node(line, g, 3)?);
                let var = self.var(line, 4)?;
                let weight = if line.tokens.len() == 6 { line.num(5)? } else { 1 };
                let lit = self.ctx.add_edge(g, from, to, weight)?;
                self.bind(var, lit)?;
            }
            "edge_bv" => {
                line.arity(6)?;
                let g = self.graph(line, 1)?;
                let (from, to) = (self.node(line, g, 2)?, self.node(line, g, 3)?);
                let var = self.var(line, 4)?;
                let weight = self.bitvector(line, 5)?;
                let lit = self.ctx.add_edge_bv(g, from, to, weight)?;
                self.bind(var, lit)?;
            }
            "reach" => {
                line.arity(5)?;
                let g = self.graph(line, 1)?;
                let (from, to) = (self.node(line, g, 2)?, self.node(line, g, 3)?);
                let var = self.var(line, 4)?;
                let lit = self.ctx.reaches(g, from, to)?;
                self.bind(var, lit)?;
            }
            keyword @ ("distance_leq" | "distance_lt" | "maximum_flow_geq") => {
                line.arity(6)?;
                let g = self.graph(line, 1)?;
                let (from, to) = (self.node(line, g, 2)?, self.node(line, g, 3)?);
                let var = self.var(line, 4)?;
                let bound: u64 = line.num(5)?;
                let lit = match keyword {
                    "distance_leq" => self.ctx.distance_leq(g, from, to, bound)?,
                    "distance_lt" => self.ctx.distance_lt(g, from, to, bound)?,
                    _ => self.ctx.maximum_flow_geq(g, from, to, bound)?,
                };
                self.bind(var, lit)?;
            }
            keyword @ ("distance_leq_bv" | "distance_lt_bv" | "maximum_flow_geq_bv") => {
                line.arity(6)?;
                let g = self.graph(line, 1)?;
                let (from, to) = (self.node(line, g, 2)?, self.node(line, g, 3)?);
                let var = self.var(line, 4)?;
                let bound = self.bitvector(line, 5)?;
                let lit = match keyword {
                    "distance_leq_bv" => self.ctx.distance_leq_bv(g, from, to, bound)?,
                    "distance_lt_bv" => self.ctx.distance_lt_bv(g, from, to, bound)?,
                    _ => self.ctx.maximum_flow_geq_bv(g, from, to, bound)?,
                };
                self.bind(var, lit)?;
            }
            keyword @ ("acyclic" | "acyclic_undirected") => {
                line.arity(3)?;
                let g = self.graph(line, 1)?;
                let var = self.var(line, 2)?;
                let lit = self.ctx.acyclic(g, keyword == "acyclic")?;
                self.bind(var, lit)?;
            }
            keyword @ ("mst_weight_leq" | "mst_weight_lt") => {
                line.arity(4)?;
                let g = self.graph(line, 1)?;
                let var = self.var(line, 2)?;
                let bound: u64 = line.num(3)?;
                let lit = if keyword == "mst_weight_leq" {
                    self.ctx.minimum_spanning_tree_leq(g, bound)?
                } else {
                    self.ctx.minimum_spanning_tree_lt(g, bound)?
                };
                self.bind(var, lit)?;
            }
            "bv" => self.bv_line(line)?,
            other => return Err(line.err(format!("unknown keyword '{other}'"))),
        }
        Ok(())
    }

    fn bv_line(&mut self, line: &Line<'_>) -> Result<()> {
        let kind = line.token(1)?;
        match kind {
            "const" => {
                line.arity(5)?;
                let file_id: u32 = line.num(2)?;
                let width: u32 = line.num(3)?;
                let value: u64 = line.num(4)?;
                let bv = self.ctx.bv_const(width, value)?;
                self.declare_bv(line, file_id, bv)?;
            }
            "+" | "-" => {
                line.arity(5)?;
                let file_id: u32 = line.num(2)?;
                let (a, b) = (self.bitvector(line, 3)?, self.bitvector(line, 4)?);
                let bv = if kind == "+" {
                    self.ctx.bv_add(a, b)?
                } else {
                    self.ctx.bv_sub(a, b)?
                };
                self.declare_bv(line, file_id, bv)?;
            }
            _ => {
                if let Ok(op) = kind.parse::<Comparison>() {
                    if line.token(2)? == "bv" {
                        line.arity(6)?;
                        let var = self.var(line, 3)?;
                        let (a, b) = (self.bitvector(line, 4)?, self.bitvector(line, 5)?);
                        let lit = self.ctx.bv_compare(op, a, b)?;
                        return self.bind(var, lit);
                    }
                    line.arity(5)?;
                    let var = self.var(line, 2)?;
                    let a = self.bitvector(line, 3)?;
                    let value: u64 = line.num(4)?;
                    let lit = self.ctx.bv_compare_const(op, a, value)?;
                    return self.bind(var, lit);
                }

                let file_id: u32 = line.num(1)?;
                let width: u32 = line.num(2)?;
                if line.tokens.len() != width as usize + 3 {
                    return Err(line.err(format!(
                        "bitvector {file_id} of width {width} lists {} variables",
                        line.tokens.len() - 3
                    )));
                }
                let mut bits = Vec::with_capacity(width as usize);
                for i in 3..line.tokens.len() {
                    bits.push(Lit::pos(self.var(line, i)?));
                }
                let bv = self.ctx.bv_from_lits(&bits)?;
                self.declare_bv(line, file_id, bv)?;
            }
        }
        Ok(())
    }
}

/// True for lines handled by the DIMACS parser
fn is_cnf_line(trimmed: &str) -> bool {
    match trimmed.chars().next() {
        None => true,
        Some(c) => c == 'c' || c == 'p' || c == '%' || c == '-' || c.is_ascii_digit(),
    }
}

impl Context {
    /// Read a GNF problem into this context.
    ///
    /// Theory lines are applied in file order; clauses are added once the
    /// whole file has been read. Errors carry the 1-based line number.
    pub fn read_gnf<R: BufRead>(&mut self, reader: R) -> Result<GnfProblem> {
        let mut cnf_text = String::new();
        let mut reader_state = Reader {
            ctx: self,
            problem: GnfProblem::default(),
        };

        for (index, text) in reader.lines().enumerate() {
            let text = text?;
            let trimmed = text.trim();
            // Theory lines are blanked so DIMACS line numbers stay aligned
            if is_cnf_line(trimmed) {
                cnf_text.push_str(trimmed);
            } else {
                let line = Line {
                    number: index + 1,
                    tokens: trimmed.split_whitespace().collect(),
                };
                reader_state.theory_line(&line)?;
            }
            cnf_text.push('\n');
        }

        let cnf = DimacsCnf::parse(Cursor::new(cnf_text)).map_err(|e| Error::Parse {
            line: e.line,
            message: e.message,
        })?;
        if cnf.num_vars > 0 {
            reader_state.file_var(cnf.num_vars as u32);
        }
        for clause in &cnf.clauses {
            let lits: Vec<Lit> = clause
                .iter()
                .map(|&l| reader_state.file_var(l.unsigned_abs()))
                .zip(clause)
                .map(|(var, &l)| Lit::new(var, l > 0))
                .collect();
            reader_state.ctx.add_clause(&lits)?;
        }

        let problem = reader_state.problem;
        debug!(
            vars = problem.num_vars(),
            clauses = cnf.clauses.len(),
            bitvectors = problem.bitvectors.len(),
            graphs = problem.graphs.len(),
            "read GNF problem"
        );
        Ok(problem)
    }
}
