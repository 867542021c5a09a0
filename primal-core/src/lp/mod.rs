//! LP solver abstraction consumed by the heuristics.
//!
//! Heuristics never talk to a concrete backend: they receive a
//! [`LpSolver`] trait object, clone it on first use and own the clone for
//! the rest of their run. The trait mirrors what the engine needs (solve,
//! re-solve after bound changes, clone) and nothing more, so alternative
//! backends can be dropped in without touching heuristic code.

mod microlp_backend;

pub use microlp_backend::MicrolpSolver;

use thiserror::Error;

/// Pivoting algorithm hint for a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Primal simplex.
    Primal,
    /// Dual simplex.
    Dual,
}

/// Outcome classification of an LP solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpStatus {
    /// An optimal basic solution was found.
    Optimal,
    /// The LP has no feasible point.
    Infeasible,
    /// The LP is unbounded.
    Unbounded,
    /// Anything else (iteration limits, numerical trouble).
    Other,
}

impl LpStatus {
    /// Short human-readable form for log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            LpStatus::Optimal => "optimal",
            LpStatus::Infeasible => "infeasible",
            LpStatus::Unbounded => "unbounded",
            LpStatus::Other => "other",
        }
    }
}

/// Result of an LP solve.
///
/// `primal` and `dual` are populated on [`LpStatus::Optimal`] and empty
/// otherwise.
#[derive(Debug, Clone)]
pub struct LpResult {
    /// Solve status.
    pub status: LpStatus,
    /// Objective value of the primal solution.
    pub obj: f64,
    /// Primal solution, length `ncols`.
    pub primal: Vec<f64>,
    /// Dual values, length `nrows`.
    pub dual: Vec<f64>,
}

impl LpResult {
    /// A result carrying only a non-optimal status.
    pub fn with_status(status: LpStatus) -> Self {
        Self {
            status,
            obj: f64::INFINITY,
            primal: Vec::new(),
            dual: Vec::new(),
        }
    }
}

/// Hard backend failures; infeasibility and unboundedness are statuses, not
/// errors.
#[derive(Error, Debug)]
pub enum LpError {
    /// The backend reported an internal failure.
    #[error("LP backend failure: {0}")]
    Backend(String),
}

/// Capability set of an LP backend.
pub trait LpSolver: Send + Sync {
    /// Solve the LP with the backend's default algorithm.
    fn solve(&mut self) -> Result<LpResult, LpError>;

    /// Solve with an algorithm hint; backends may ignore it.
    fn solve_with(&mut self, algorithm: Algorithm) -> Result<LpResult, LpError>;

    /// Clone this solver into an independently owned instance.
    fn clone_solver(&self) -> Box<dyn LpSolver>;

    /// Replace the bounds of a single column.
    fn change_bounds(&mut self, col: usize, lb: f64, ub: f64);

    /// Replace the bounds of every column.
    fn change_all_bounds(&mut self, lb: &[f64], ub: &[f64]);
}
