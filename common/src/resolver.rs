use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use crate::agent::AgentState;
use crate::cnf::{Cnf, Literal};
use crate::config::AgentConfig;
use crate::deduction::Constraint;
use crate::error::AgentError;
use crate::grid::Position;
use crate::sat::{SatBackend, SatOutcome, SatSession, VarisatBackend};

/// A group of ambiguous constraints that share open cells, solved together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Every open cell mentioned by `constraints`, in row-major order.
    /// Cell `cells[i]` becomes SAT variable `i + 1`.
    pub cells: Vec<Position>,
    pub constraints: Vec<Constraint>,
}

impl Region {
    pub fn single(constraint: Constraint) -> Self {
        Self::from_constraints(vec![constraint])
    }

    fn from_constraints(constraints: Vec<Constraint>) -> Self {
        let cells: BTreeSet<Position> = constraints
            .iter()
            .flat_map(|c| c.cells.iter().copied())
            .collect();
        Region {
            cells: cells.into_iter().collect(),
            constraints,
        }
    }

    /// Splits `constraints` into connected components, two constraints
    /// being connected when they share an open cell.
    pub fn merge(constraints: Vec<Constraint>) -> Vec<Region> {
        let mut by_cell: HashMap<Position, Vec<usize>> = HashMap::new();
        for (idx, constraint) in constraints.iter().enumerate() {
            for &cell in &constraint.cells {
                by_cell.entry(cell).or_default().push(idx);
            }
        }

        let mut component = vec![usize::MAX; constraints.len()];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for start in 0..constraints.len() {
            if component[start] != usize::MAX {
                continue;
            }
            let id = groups.len();
            let mut members = Vec::new();
            let mut stack = vec![start];
            component[start] = id;
            while let Some(idx) = stack.pop() {
                members.push(idx);
                for cell in &constraints[idx].cells {
                    for &other in &by_cell[cell] {
                        if component[other] == usize::MAX {
                            component[other] = id;
                            stack.push(other);
                        }
                    }
                }
            }
            members.sort_unstable();
            groups.push(members);
        }

        let mut slots: Vec<Option<Constraint>> = constraints.into_iter().map(Some).collect();
        groups
            .into_iter()
            .map(|members| {
                Region::from_constraints(
                    members
                        .into_iter()
                        .filter_map(|idx| slots[idx].take())
                        .collect(),
                )
            })
            .collect()
    }

    fn anchor(&self) -> Position {
        self.constraints
            .first()
            .map(|c| c.anchor)
            .or_else(|| self.cells.first().copied())
            .unwrap_or(Position::new(0, 0))
    }

    fn encode(&self) -> Cnf {
        let mut cnf = Cnf::new();
        let var_of: HashMap<Position, Literal> = self
            .cells
            .iter()
            .map(|&cell| (cell, cnf.new_var()))
            .collect();
        for constraint in &self.constraints {
            let lits: Vec<Literal> = constraint.cells.iter().map(|cell| var_of[cell]).collect();
            cnf.exactly(&lits, constraint.mines);
        }
        cnf
    }
}

/// The result of analyzing one region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    /// Cells whose value is the same in every model; `true` means mine.
    pub forced: Vec<(Position, bool)>,
    /// The budget ran out before every cell was decided.
    pub timed_out: bool,
}

/// What a resolver run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub regions: usize,
    pub mines: usize,
    pub safe: usize,
    pub timed_out: usize,
    /// Regions left alone because they exceed the variable cap.
    pub skipped: usize,
}

impl ResolveReport {
    pub fn changed(&self) -> bool {
        self.mines > 0 || self.safe > 0
    }

    fn absorb(&mut self, other: ResolveReport) {
        self.regions += other.regions;
        self.mines += other.mines;
        self.safe += other.safe;
        self.timed_out += other.timed_out;
        self.skipped += other.skipped;
    }
}

/// Settles cells the counting rules can't by asking a SAT backend which
/// cells take the same value in every solution of a region's constraints.
pub struct AmbiguityResolver<S = VarisatBackend> {
    backend: S,
    max_region_variables: usize,
    sat_timeout: Duration,
    merge_regions: bool,
}

impl<S: SatBackend> AmbiguityResolver<S> {
    pub fn new(backend: S, config: &AgentConfig) -> Self {
        AmbiguityResolver {
            backend,
            max_region_variables: config.max_region_variables,
            sat_timeout: config.sat_timeout,
            merge_regions: config.merge_regions,
        }
    }

    /// Resolves every ambiguous constraint of the last local pass.
    pub fn resolve_all(
        &self,
        state: &mut AgentState,
        ambiguous: Vec<Constraint>,
    ) -> Result<ResolveReport, AgentError> {
        let regions = if self.merge_regions {
            Region::merge(ambiguous)
        } else {
            ambiguous.into_iter().map(Region::single).collect()
        };

        let mut report = ResolveReport::default();
        for region in regions {
            if region.cells.len() <= self.max_region_variables || region.constraints.len() == 1 {
                report.absorb(self.resolve_region(state, &region)?);
                continue;
            }
            log::debug!(
                "region around {} has {} cells, solving its constraints one by one",
                region.anchor(),
                region.cells.len()
            );
            for constraint in region.constraints {
                report.absorb(self.resolve_region(state, &Region::single(constraint))?);
            }
        }
        Ok(report)
    }

    /// Resolves a single "exactly `remaining` mines among `cells`" constraint.
    pub fn resolve_cells(
        &self,
        state: &mut AgentState,
        anchor: Position,
        cells: Vec<Position>,
        remaining: usize,
    ) -> Result<ResolveReport, AgentError> {
        let region = Region::single(Constraint {
            anchor,
            cells,
            mines: remaining,
        });
        self.resolve_region(state, &region)
    }

    /// Analyzes `region` and applies its forced cells to `state`.
    pub fn resolve_region(
        &self,
        state: &mut AgentState,
        region: &Region,
    ) -> Result<ResolveReport, AgentError> {
        let mut report = ResolveReport {
            regions: 1,
            ..ResolveReport::default()
        };
        if region.cells.len() > self.max_region_variables {
            log::debug!(
                "skipping region around {}: {} cells over the cap of {}",
                region.anchor(),
                region.cells.len(),
                self.max_region_variables
            );
            report.skipped = 1;
            return Ok(report);
        }

        let verdict = self.analyze(region)?;
        if verdict.timed_out {
            report.timed_out = 1;
        }
        for (cell, mine) in verdict.forced {
            if mine {
                if state.mark_mine(cell)? {
                    report.mines += 1;
                }
            } else if state.mark_safe(cell) {
                report.safe += 1;
            }
        }
        Ok(report)
    }

    /// Finds the forced cells of `region` without touching any state.
    ///
    /// One query finds a baseline model. Then, for each cell not yet known to
    /// vary, the solver is asked for a model with that cell flipped. If none
    /// exists the cell is forced to its baseline value. Every model found
    /// along the way rules out the cells it disagrees with the baseline on.
    pub fn analyze(&self, region: &Region) -> Result<Verdict, AgentError> {
        let n = region.cells.len();
        let cnf = region.encode();
        let mut session = self.backend.open(&cnf);
        let deadline = Instant::now() + self.sat_timeout;
        let budget = || deadline.saturating_duration_since(Instant::now());

        let baseline = match session.solve(&[], budget()) {
            SatOutcome::Satisfiable(model) => model,
            SatOutcome::Unsatisfiable => {
                return Err(AgentError::Unsatisfiable {
                    anchor: region.anchor(),
                    variables: n,
                });
            }
            SatOutcome::Timeout => {
                log::debug!("baseline query timed out for region around {}", region.anchor());
                return Ok(Verdict {
                    forced: Vec::new(),
                    timed_out: true,
                });
            }
            SatOutcome::Failed(reason) => {
                return Err(AgentError::SolverFailure {
                    anchor: region.anchor(),
                    reason,
                });
            }
        };

        let mut varies = vec![false; n];
        let mut verdict = Verdict::default();
        for i in 0..n {
            if varies[i] {
                continue;
            }
            let var = (i + 1) as Literal;
            let flipped = if baseline[i] { -var } else { var };
            match session.solve(&[flipped], budget()) {
                SatOutcome::Satisfiable(model) => {
                    for (varied, (now, base)) in
                        varies.iter_mut().zip(model.iter().zip(&baseline)).skip(i)
                    {
                        *varied |= now != base;
                    }
                }
                SatOutcome::Unsatisfiable => verdict.forced.push((region.cells[i], baseline[i])),
                SatOutcome::Timeout => {
                    log::debug!("region around {} timed out after {} cells", region.anchor(), i);
                    verdict.timed_out = true;
                    break;
                }
                SatOutcome::Failed(reason) => {
                    return Err(AgentError::SolverFailure {
                        anchor: region.anchor(),
                        reason,
                    });
                }
            }
        }

        log::trace!(
            "region around {}: {} cells, {} forced",
            region.anchor(),
            n,
            verdict.forced.len()
        );
        Ok(verdict)
    }
}
