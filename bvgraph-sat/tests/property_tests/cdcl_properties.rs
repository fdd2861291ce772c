//! Property-based tests for the CDCL solver
//!
//! Tests:
//! - Agreement with brute force on small random CNFs
//! - Models satisfy every clause
//! - Conflict clauses under assumptions are implied by the formula
//! - Invariants hold after every solve

use bvgraph_sat::invariants::check_all_sat_invariants;
use bvgraph_sat::*;
use proptest::prelude::*;

fn clause_strategy(num_vars: i32) -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec((1..=num_vars, any::<bool>()), 1..4).prop_map(|lits| {
        lits.into_iter()
            .map(|(v, neg)| if neg { -v } else { v })
            .collect()
    })
}

fn cnf_strategy() -> impl Strategy<Value = (i32, Vec<Vec<i32>>)> {
    (2i32..8).prop_flat_map(|n| (Just(n), prop::collection::vec(clause_strategy(n), 0..30)))
}

fn satisfies(assignment: u32, clause: &[i32]) -> bool {
    clause.iter().any(|&lit| {
        let bit = assignment >> (lit.unsigned_abs() - 1) & 1 == 1;
        bit == (lit > 0)
    })
}

fn brute_force(num_vars: i32, clauses: &[Vec<i32>], fixed: &[i32]) -> bool {
    (0..1u32 << num_vars).any(|a| {
        fixed.iter().all(|&l| satisfies(a, &[l])) && clauses.iter().all(|c| satisfies(a, c))
    })
}

fn load(num_vars: i32, clauses: &[Vec<i32>]) -> Solver {
    let mut solver = Solver::new();
    for _ in 0..num_vars {
        solver.new_var();
    }
    for clause in clauses {
        solver.add_clause_dimacs(clause);
    }
    solver
}

#[cfg(test)]
mod cdcl_basic_properties {
    use super::*;

    #[test]
    fn empty_cnf_is_sat() {
        let mut solver = Solver::new();
        assert_eq!(solver.solve(), SolverResult::Sat);
    }

    proptest! {
        #[test]
        fn contradictory_units_are_unsat(v in 1i32..100) {
            let mut solver = Solver::new();
            solver.add_clause_dimacs(&[v]);
            solver.add_clause_dimacs(&[-v]);
            prop_assert_eq!(solver.solve(), SolverResult::Unsat);
        }

        #[test]
        fn tautology_clause_ignorable(v in 1i32..50) {
            let mut solver = Solver::new();
            solver.add_clause_dimacs(&[v, -v]);
            prop_assert_eq!(solver.solve(), SolverResult::Sat);
            prop_assert_eq!(solver.num_clauses(), 0);
        }
    }
}

#[cfg(test)]
mod cdcl_agreement_properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn agrees_with_brute_force((n, clauses) in cnf_strategy()) {
            let mut solver = load(n, &clauses);
            let expected = brute_force(n, &clauses, &[]);
            let result = solver.solve();
            prop_assert_eq!(result == SolverResult::Sat, expected);
            prop_assert!(check_all_sat_invariants(&solver).is_ok());

            if result == SolverResult::Sat {
                for clause in &clauses {
                    let satisfied = clause
                        .iter()
                        .any(|&l| solver.model_value(Lit::from_dimacs(l)).is_true());
                    prop_assert!(satisfied, "model violates clause {:?}", clause);
                }
            }
        }

        #[test]
        fn assumptions_agree_with_brute_force(
            (n, clauses) in cnf_strategy(),
            picks in prop::collection::vec((0usize..8, any::<bool>()), 1..4),
        ) {
            let assumptions: Vec<i32> = picks
                .into_iter()
                .map(|(v, neg)| {
                    let v = (v as i32 % n) + 1;
                    if neg { -v } else { v }
                })
                .collect();
            let lits: Vec<Lit> = assumptions.iter().map(|&l| Lit::from_dimacs(l)).collect();

            let mut solver = load(n, &clauses);
            let result = solver.solve_with_assumptions(&lits);
            prop_assert_eq!(
                result == SolverResult::Sat,
                brute_force(n, &clauses, &assumptions)
            );

            if result == SolverResult::Unsat && solver.is_ok() {
                // Every conflict literal negates an assumption, and the
                // negated conflict alone is already inconsistent
                let conflict: Vec<i32> = solver.conflict().iter().map(|l| l.to_dimacs()).collect();
                for &l in &conflict {
                    prop_assert!(assumptions.contains(&-l));
                }
                let negated: Vec<i32> = conflict.iter().map(|&l| -l).collect();
                prop_assert!(!brute_force(n, &clauses, &negated));
            }

            // Assumptions never stick
            prop_assert_eq!(
                solver.solve() == SolverResult::Sat,
                brute_force(n, &clauses, &[])
            );
        }
    }
}
