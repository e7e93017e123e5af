use std::time::{Duration, Instant};

use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

use crate::cnf::{Cnf, Literal};

/// Answer to a single satisfiability query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatOutcome {
    /// `model[i]` is the value of variable `i + 1`.
    Satisfiable(Vec<bool>),
    Unsatisfiable,
    Timeout,
    /// The backend broke down; its answer can't be trusted.
    Failed(String),
}

/// Builds one solver instance per formula.
pub trait SatBackend {
    type Session: SatSession;

    fn open(&self, formula: &Cnf) -> Self::Session;
}

/// A loaded formula that can be queried repeatedly under different
/// assumptions. Dropped once the caller is done with it.
pub trait SatSession {
    fn solve(&mut self, assumptions: &[Literal], timeout: Duration) -> SatOutcome;
}

/// Backend on top of the varisat CDCL solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarisatBackend;

pub struct VarisatSession {
    solver: Solver<'static>,
    vars: Vec<Var>,
}

impl SatBackend for VarisatBackend {
    type Session = VarisatSession;

    fn open(&self, cnf: &Cnf) -> VarisatSession {
        let mut solver = Solver::new();

        // 1. Allocate SAT variables, so dimacs variable `v` is `vars[v - 1]`.
        let vars: Vec<Var> = (0..cnf.var_count()).map(|_| solver.new_var()).collect();

        // 2. Add all clauses to the solver at once.
        let mut formula = CnfFormula::new();
        for clause in cnf.clauses() {
            let lits: Vec<Lit> = clause.iter().map(|&lit| to_lit(&vars, lit)).collect();
            formula.add_clause(&lits);
        }
        solver.add_formula(&formula);

        VarisatSession { solver, vars }
    }
}

impl SatSession for VarisatSession {
    /// varisat can't be interrupted mid-search, so the timeout is only
    /// checked before a query starts. Callers keep individual queries small.
    fn solve(&mut self, assumptions: &[Literal], timeout: Duration) -> SatOutcome {
        if timeout.is_zero() {
            return SatOutcome::Timeout;
        }

        // Each call replaces the previous assumptions. Clearing them after
        // the search would also drop the model.
        let lits: Vec<Lit> = assumptions.iter().map(|&lit| to_lit(&self.vars, lit)).collect();
        let started = Instant::now();
        self.solver.assume(&lits);
        let result = self.solver.solve();
        log::trace!(
            "sat query with {} assumptions took {:?}",
            lits.len(),
            started.elapsed()
        );

        match result {
            Ok(true) => {
                let Some(model) = self.solver.model() else {
                    return SatOutcome::Failed("solver reported sat without a model".to_string());
                };
                let mut values = vec![false; self.vars.len()];
                for lit in model {
                    if let Some(value) = values.get_mut(lit.var().index()) {
                        *value = lit.is_positive();
                    }
                }
                SatOutcome::Satisfiable(values)
            }
            Ok(false) => SatOutcome::Unsatisfiable,
            Err(err) => SatOutcome::Failed(err.to_string()),
        }
    }
}

fn to_lit(vars: &[Var], lit: Literal) -> Lit {
    let var = vars[lit.unsigned_abs() as usize - 1];
    Lit::from_var(var, lit > 0)
}
