//! Runtime invariant checks for the CDCL solver
//!
//! Meant for tests and debugging; every check walks the whole solver state.

use crate::literal::{LBool, Var};
use crate::solver::Solver;

/// Check clause database integrity
pub fn check_clause_database(solver: &Solver) -> Result<(), String> {
    let db = solver.clause_db();
    for id in solver.clause_ids() {
        let clause = db.get(id);
        if clause.deleted {
            return Err(format!("Deleted clause {} still listed", id.index()));
        }
        if clause.len() < 2 {
            return Err(format!("Clause {} has fewer than two literals", id.index()));
        }

        for j in 0..clause.len() {
            for k in (j + 1)..clause.len() {
                if clause.lits[j] == clause.lits[k] {
                    return Err(format!("Duplicate literal in clause {}", id.index()));
                }
                if clause.lits[j] == !clause.lits[k] {
                    return Err(format!("Tautology in clause {}", id.index()));
                }
            }
        }

        if let Some(lit) = clause
            .lits
            .iter()
            .find(|lit| lit.var().index() >= solver.num_vars())
        {
            return Err(format!(
                "Invalid variable {} in clause {}",
                lit.var(),
                id.index()
            ));
        }
    }
    Ok(())
}

/// Check that assigned variables are exactly those on the trail
pub fn check_assignment_consistency(solver: &Solver) -> Result<(), String> {
    let mut on_trail = vec![false; solver.num_vars()];
    for &lit in solver.trail() {
        if on_trail[lit.var().index()] {
            return Err(format!("Variable {} appears twice on the trail", lit.var()));
        }
        on_trail[lit.var().index()] = true;
        if !solver.lit_value(lit).is_true() {
            return Err(format!("Trail literal {lit} is not true"));
        }
    }

    for (index, &seen) in on_trail.iter().enumerate() {
        let var = Var::new(index as u32);
        let value = solver.lit_value(crate::literal::Lit::pos(var));
        if (value != LBool::Undef) != seen {
            return Err(format!("Variable {var} assignment disagrees with the trail"));
        }
    }
    Ok(())
}

/// Check the two-watched-literal scheme
pub fn check_watched_literals(solver: &Solver) -> Result<(), String> {
    let db = solver.clause_db();
    for id in solver.clause_ids() {
        let clause = db.get(id);
        for &watched in &clause.lits[..2] {
            let count = solver
                .watch_list(watched)
                .iter()
                .filter(|w| w.clause == id)
                .count();
            if count != 1 {
                return Err(format!(
                    "Clause {} watched {count} times on literal {watched}",
                    id.index()
                ));
            }
        }

        let satisfied = clause.lits.iter().any(|&l| solver.lit_value(l).is_true());
        let all_false = clause.lits.iter().all(|&l| solver.lit_value(l).is_false());
        if !satisfied && !all_false {
            let w0 = solver.lit_value(clause.lits[0]).is_false();
            let w1 = solver.lit_value(clause.lits[1]).is_false();
            if w0 && w1 {
                return Err(format!(
                    "Both watches false in non-falsified clause {}",
                    id.index()
                ));
            }
        }
    }
    Ok(())
}

/// Check that reasons only mention literals assigned earlier on the trail
pub fn check_implication_graph_acyclic(solver: &Solver) -> Result<(), String> {
    let mut position = vec![usize::MAX; solver.num_vars()];
    for (i, &lit) in solver.trail().iter().enumerate() {
        position[lit.var().index()] = i;
    }

    for (i, &lit) in solver.trail().iter().enumerate() {
        let Some(reason) = solver.reason_of(lit.var()) else {
            continue;
        };
        let clause = solver.clause_db().get(reason);
        if clause.lits[0] != lit {
            return Err(format!("Reason of {lit} does not start with it"));
        }
        for q in &clause.lits[1..] {
            if position[q.var().index()] >= i {
                return Err(format!("Reason of {lit} depends on a later literal {q}"));
            }
        }
    }
    Ok(())
}

/// Run every check
pub fn check_all_sat_invariants(solver: &Solver) -> Result<(), String> {
    check_clause_database(solver)?;
    check_assignment_consistency(solver)?;
    check_watched_literals(solver)?;
    check_implication_graph_acyclic(solver)?;
    Ok(())
}
