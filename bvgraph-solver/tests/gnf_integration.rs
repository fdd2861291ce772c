//! Reading GNF problems into a context

use bvgraph_solver::{Context, Error, SolveResult};

const WEIGHTS_ADD: &str = "\
c bitvector weights whose distances add up to 10
p cnf 34 10
digraph 4 4 0
bv 0 4 5 6 7 8
bv 1 4 9 10 11 12
bv 2 4 13 14 15 16
bv 3 4 17 18 19 20
bv 4 4 21 22 23 24
bv 5 4 25 26 27 28
edge_bv 0 0 1 1 0
edge_bv 0 0 2 2 1
edge_bv 0 1 2 3 2
edge_bv 0 2 3 4 3
distance_leq_bv 0 0 3 29 4
distance_lt_bv 0 0 3 30 4
distance_leq_bv 0 1 3 31 5
distance_lt_bv 0 1 3 32 5
bv + 6 4 5
bv == 33 6 10
bv > 34 5 4
1 0
2 0
3 0
4 0
29 0
-30 0
31 0
-32 0
33 0
34 0
";

#[test]
fn test_weights_add_from_gnf() {
    let mut ctx = Context::new();
    let problem = ctx.read_gnf(WEIGHTS_ADD.as_bytes()).unwrap();
    assert!(ctx.solve().unwrap());

    let value = |id: u32| ctx.bv_value(problem.bitvector(id).unwrap()).unwrap();
    let (w1, w2, w3, w4) = (value(0), value(1), value(2), value(3));
    let (d1, d2) = (value(4), value(5));
    assert_eq!(d1 + d2, 10);
    assert!(d2 > 4);
    assert_eq!(d1, (w1 + w3).min(w2) + w4);
    assert_eq!(d2, w3 + w4);
    assert_eq!(value(6), 10);

    // File literals keep their meaning
    let e1 = problem.lit(1).unwrap();
    assert_eq!(ctx.lit_value(e1).unwrap(), Some(true));
}

#[test]
fn test_assumptions_over_file_literals() {
    let input = "\
p cnf 3 0
digraph 3 2 0
edge 0 0 1 1 4
edge 0 1 2 2 4
distance_leq 0 0 2 3 8
";
    let mut ctx = Context::new();
    let problem = ctx.read_gnf(input.as_bytes()).unwrap();
    let (e2, near) = (problem.lit(2).unwrap(), problem.lit(3).unwrap());

    assert_eq!(ctx.solve_limited(&[near, !e2]).unwrap(), SolveResult::Unsat);
    assert!(ctx.conflict_clause().iter().all(|&l| l == !near || l == e2));
    assert_eq!(ctx.solve_limited(&[near]).unwrap(), SolveResult::Sat);
    assert_eq!(ctx.lit_value(e2).unwrap(), Some(true));
}

#[test]
fn test_flow_and_acyclic_lines() {
    let input = "\
p cnf 5 2
digraph 3 3 7
edge 7 0 1 1 3
edge 7 1 2 2 3
edge 7 2 0 3 3
maximum_flow_geq 7 0 2 4 3
acyclic 7 5
4 0
5 0
";
    let mut ctx = Context::new();
    let problem = ctx.read_gnf(input.as_bytes()).unwrap();
    assert!(problem.graph(7).is_some());
    assert!(ctx.solve().unwrap());
    assert_eq!(ctx.lit_value(problem.lit(3).unwrap()).unwrap(), Some(false));
}

#[test]
fn test_redeclared_bitvector() {
    let input = "p cnf 2 0\nbv 0 1 1\nbv 0 1 2\n";
    let mut ctx = Context::new();
    let err = ctx.read_gnf(input.as_bytes()).unwrap_err();
    assert_eq!(err, Error::parse(3, "bitvector 0 declared twice"));
}

#[test]
fn test_width_errors_are_api_errors() {
    let input = "p cnf 0 0\nbv const 0 4 99\n";
    let mut ctx = Context::new();
    let err = ctx.read_gnf(input.as_bytes()).unwrap_err();
    assert_eq!(err, Error::ConstantOutOfRange { value: 99, width: 4 });
}

#[test]
fn test_spanning_tree_lines() {
    let input = "\
p cnf 5 1
digraph 3 3 0
edge 0 0 1 1 1
edge 0 1 2 2 2
edge 0 2 0 3 5
mst_weight_leq 0 4 3
mst_weight_lt 0 5 3
4 0
";
    let mut ctx = Context::new();
    let problem = ctx.read_gnf(input.as_bytes()).unwrap();
    assert!(ctx.solve().unwrap());
    let (leq, lt) = (problem.lit(4).unwrap(), problem.lit(5).unwrap());
    assert_eq!(ctx.min_spanning_tree_weight(leq).unwrap(), Some(3));
    assert_eq!(ctx.lit_value(lt).unwrap(), Some(false));
    assert_eq!(ctx.lit_value(problem.lit(1).unwrap()).unwrap(), Some(true));
}
