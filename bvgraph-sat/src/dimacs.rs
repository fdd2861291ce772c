//! DIMACS CNF reader
//!
//! - Comments start with 'c'
//! - Problem line: "p cnf <num_vars> <num_clauses>"
//! - Clauses: space-separated literals ending with 0; a clause may span lines

use std::io::BufRead;

/// A parsed DIMACS CNF problem
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimacsCnf {
    /// Number of declared variables
    pub num_vars: usize,
    /// Clauses as DIMACS literals
    pub clauses: Vec<Vec<i32>>,
}

/// A DIMACS syntax error with its 1-based line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimacsError {
    /// Line of the error
    pub line: usize,
    /// Description
    pub message: String,
}

impl std::fmt::Display for DimacsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for DimacsError {}

impl DimacsCnf {
    /// Parse DIMACS CNF from a reader.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, DimacsError> {
        let mut cnf = Self::default();
        let mut declared_clauses = None;
        let mut current = Vec::new();
        let mut last_line = 0;

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            last_line = line_no;
            let err = |message: String| DimacsError {
                line: line_no,
                message,
            };
            let line = line.map_err(|e| err(format!("failed to read line: {e}")))?;
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('c') || trimmed.starts_with('%') {
                continue;
            }

            if trimmed.starts_with('p') {
                let parts: Vec<&str> = trimmed.split_whitespace().collect();
                if parts.len() != 4 || parts[1] != "cnf" {
                    return Err(err(format!("invalid problem line: {trimmed}")));
                }
                cnf.num_vars = parts[2]
                    .parse()
                    .map_err(|_| err(format!("invalid number of variables: {}", parts[2])))?;
                declared_clauses = Some(
                    parts[3]
                        .parse::<usize>()
                        .map_err(|_| err(format!("invalid number of clauses: {}", parts[3])))?,
                );
                continue;
            }

            if declared_clauses.is_none() {
                return Err(err("clause found before problem line".to_string()));
            }

            for token in trimmed.split_whitespace() {
                let lit: i32 = token
                    .parse()
                    .map_err(|_| err(format!("invalid literal: {token}")))?;
                if lit == 0 {
                    cnf.clauses.push(std::mem::take(&mut current));
                    continue;
                }
                let var = lit.unsigned_abs() as usize;
                if var > cnf.num_vars {
                    return Err(err(format!(
                        "literal {lit} refers to variable {var}, but only {} variables declared",
                        cnf.num_vars
                    )));
                }
                current.push(lit);
            }
        }

        if !current.is_empty() {
            cnf.clauses.push(current);
        }

        match declared_clauses {
            None => Err(DimacsError {
                line: last_line,
                message: "no problem line found".to_string(),
            }),
            Some(expected) if expected != cnf.clauses.len() => Err(DimacsError {
                line: last_line,
                message: format!(
                    "expected {expected} clauses but found {}",
                    cnf.clauses.len()
                ),
            }),
            Some(_) => Ok(cnf),
        }
    }
}
