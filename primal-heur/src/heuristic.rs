//! Heuristic capability traits and parameter plumbing.

use std::time::Instant;

use primal_core::{Activity, LpResult, LpSolver, Mip, TimeLimit};
use thiserror::Error;

use crate::pool::SolutionPool;

/// A dynamically typed configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    Str(String),
}

impl ParamValue {
    /// Name of the carried type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Str(_) => "string",
        }
    }
}

/// Ordered `(heuristic, parameter, value)` triples, routed by the search.
pub type Config = Vec<(String, String, ParamValue)>;

/// Errors from routing configuration values into heuristics.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The value type does not match what the parameter expects.
    #[error("parameter {param:?} expects a {expected} value, got {got}")]
    TypeMismatch {
        /// Parameter name.
        param: String,
        /// Expected type name.
        expected: &'static str,
        /// Provided type name.
        got: &'static str,
    },
}

/// Read-only inputs shared by every heuristic of one run.
///
/// Everything here is borrowed from the search; the heuristics copy what
/// they intend to mutate.
pub struct HeurContext<'a> {
    /// The model.
    pub mip: &'a Mip,
    /// Root lower bounds (the model's, untightened).
    pub lb: &'a [f64],
    /// Root upper bounds.
    pub ub: &'a [f64],
    /// Row activities at the root bounds.
    pub activities: &'a [Activity],
    /// Root LP result with the (integer-snapped) primal solution.
    pub root: &'a LpResult,
    /// Solution activities of the root LP point.
    pub sol_activity: &'a [f64],
    /// Fractional integer columns of the root LP point, ascending.
    pub fractional: &'a [usize],
    /// Shared LP solver; heuristics clone it before mutating bounds.
    pub solver: &'a dyn LpSolver,
    /// Wall-clock budget.
    pub tlimit: TimeLimit,
}

/// A heuristic that constructs feasible solutions from scratch.
///
/// Implementors provide [`search`](FeasibilityHeuristic::search); callers go
/// through [`execute`](FeasibilityHeuristic::execute), which wraps it with
/// wall-clock accounting. `search` returns nothing; all output goes through
/// the pool, and only feasible solutions may be added.
pub trait FeasibilityHeuristic: Send {
    /// Stable identifier used in configuration and reports.
    fn name(&self) -> &'static str;

    /// Set a named parameter; unknown names are ignored with a warning.
    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<(), ConfigError>;

    /// Run the heuristic, appending any solutions found to `pool`.
    fn search(&mut self, ctx: &HeurContext<'_>, pool: &mut SolutionPool);

    /// Seconds the last [`execute`](FeasibilityHeuristic::execute) call took.
    fn run_time(&self) -> f64;

    /// Store the wall-clock time of a finished run.
    fn record_run_time(&mut self, seconds: f64);

    /// Timed entry point: runs [`search`](FeasibilityHeuristic::search) and
    /// records its wall-clock time.
    fn execute(&mut self, ctx: &HeurContext<'_>, pool: &mut SolutionPool) {
        let start = Instant::now();
        self.search(ctx, pool);
        self.record_run_time(start.elapsed().as_secs_f64());
    }
}

/// A heuristic that refines an incumbent solution.
///
/// Same shape as [`FeasibilityHeuristic`]: implementors provide
/// [`improve`](ImprovementHeuristic::improve), callers use the timed
/// [`execute`](ImprovementHeuristic::execute) wrapper.
pub trait ImprovementHeuristic: Send {
    /// Stable identifier used in configuration and reports.
    fn name(&self) -> &'static str;

    /// Set a named parameter; unknown names are ignored with a warning.
    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<(), ConfigError>;

    /// Try to improve on `(incumbent, incumbent_cost)`, appending strictly
    /// better feasible solutions to `pool`.
    fn improve(
        &mut self,
        ctx: &HeurContext<'_>,
        incumbent: &[f64],
        incumbent_cost: f64,
        pool: &mut SolutionPool,
    );

    /// Seconds the last [`execute`](ImprovementHeuristic::execute) call took.
    fn run_time(&self) -> f64;

    /// Store the wall-clock time of a finished run.
    fn record_run_time(&mut self, seconds: f64);

    /// Timed entry point: runs [`improve`](ImprovementHeuristic::improve)
    /// and records its wall-clock time.
    fn execute(
        &mut self,
        ctx: &HeurContext<'_>,
        incumbent: &[f64],
        incumbent_cost: f64,
        pool: &mut SolutionPool,
    ) {
        let start = Instant::now();
        self.improve(ctx, incumbent, incumbent_cost, pool);
        self.record_run_time(start.elapsed().as_secs_f64());
    }
}

/// Shared handling for parameters no heuristic recognizes.
pub(crate) fn ignore_unknown_param(heuristic: &str, name: &str) -> Result<(), ConfigError> {
    log::warn!("{heuristic}: unknown parameter {name:?} ignored");
    Ok(())
}
