use itertools::Itertools;

/// A DIMACS style literal: `v` for variable `v` true, `-v` for false.
/// Variables are numbered from 1.
pub type Literal = i32;

pub type Clause = Vec<Literal>;

/// Up to this many literals a cardinality constraint is expanded into plain
/// subset clauses; above it a sequential counter keeps the clause count
/// polynomial.
const BINOMIAL_LIMIT: usize = 10;

/// A formula in conjunctive normal form, along with how many variables it
/// uses (auxiliary variables included).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cnf {
    var_count: usize,
    clauses: Vec<Clause>,
}

impl Cnf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var_count(&self) -> usize {
        self.var_count
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Allocates a fresh variable and returns its positive literal.
    pub fn new_var(&mut self) -> Literal {
        self.var_count += 1;
        self.var_count as Literal
    }

    pub fn add_clause(&mut self, clause: Clause) {
        if let Some(max) = clause.iter().map(|lit| lit.unsigned_abs() as usize).max() {
            self.var_count = self.var_count.max(max);
        }
        self.clauses.push(clause);
    }

    /// Exactly `k` of `lits` are true.
    pub fn exactly(&mut self, lits: &[Literal], k: usize) {
        self.at_most(lits, k);
        self.at_least(lits, k);
    }

    /// At most `k` of `lits` are true.
    pub fn at_most(&mut self, lits: &[Literal], k: usize) {
        if k >= lits.len() {
            return;
        }
        if k == 0 {
            for &lit in lits {
                self.add_clause(vec![-lit]);
            }
            return;
        }

        if lits.len() <= BINOMIAL_LIMIT {
            // Any k + 1 of them can't all be true.
            for combo in lits.iter().copied().combinations(k + 1) {
                self.add_clause(combo.into_iter().map(|lit| -lit).collect());
            }
        } else {
            self.sequential_at_most(lits, k);
        }
    }

    /// At least `k` of `lits` are true.
    pub fn at_least(&mut self, lits: &[Literal], k: usize) {
        let n = lits.len();
        if k == 0 {
            return;
        }
        if k > n {
            self.add_clause(Vec::new());
            return;
        }

        if n <= BINOMIAL_LIMIT {
            // Any n - k + 1 of them contain at least one true literal.
            for combo in lits.iter().copied().combinations(n - k + 1) {
                self.add_clause(combo);
            }
        } else {
            let negated: Vec<Literal> = lits.iter().map(|&lit| -lit).collect();
            self.at_most(&negated, n - k);
        }
    }

    /// Sinz's sequential counter. `s[i][j]` holds when at least `j + 1` of
    /// the first `i + 1` literals are true. Requires `1 <= k < n`.
    fn sequential_at_most(&mut self, lits: &[Literal], k: usize) {
        let n = lits.len();
        debug_assert!(k >= 1 && k < n);

        let mut s: Vec<Vec<Literal>> = Vec::with_capacity(n - 1);
        for _ in 0..n - 1 {
            let row = (0..k).map(|_| self.new_var()).collect();
            s.push(row);
        }

        self.add_clause(vec![-lits[0], s[0][0]]);
        for j in 1..k {
            self.add_clause(vec![-s[0][j]]);
        }

        for i in 1..n - 1 {
            self.add_clause(vec![-lits[i], s[i][0]]);
            self.add_clause(vec![-s[i - 1][0], s[i][0]]);
            for j in 1..k {
                self.add_clause(vec![-lits[i], -s[i - 1][j - 1], s[i][j]]);
                self.add_clause(vec![-s[i - 1][j], s[i][j]]);
            }
            self.add_clause(vec![-lits[i], -s[i - 1][k - 1]]);
        }

        self.add_clause(vec![-lits[n - 1], -s[n - 2][k - 1]]);
    }

    /// Evaluates the formula; `assignment[i]` is the value of variable `i + 1`.
    pub fn is_satisfied_by(&self, assignment: &[bool]) -> bool {
        self.clauses.iter().all(|clause| {
            clause.iter().any(|&lit| {
                let value = assignment
                    .get(lit.unsigned_abs() as usize - 1)
                    .copied()
                    .unwrap_or(false);
                value == (lit > 0)
            })
        })
    }
}
