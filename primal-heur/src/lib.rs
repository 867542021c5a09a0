//! Feasibility and improvement heuristics for mixed-integer programs.
//!
//! The entry point is [`Search`]: it solves the root LP, hands the shared
//! read-only artifacts (model, root solution, activities, fractional list)
//! to a portfolio of [`FeasibilityHeuristic`]s running in parallel, harvests
//! their [`SolutionPool`]s, and then lets the [`ImprovementHeuristic`]s work
//! on the incumbent. No heuristic proves anything: every pooled solution is
//! feasible, and the best one wins.

pub mod bounds;
pub mod diving;
pub mod heuristic;
pub mod pool;
pub mod rounding;
pub mod search;
pub mod shifting;

#[cfg(test)]
pub(crate) mod test_support;

pub use bounds::BoundSolution;
pub use diving::{CoefDiving, DivingHeuristic, FracDiving, SelectionRule};
pub use heuristic::{
    Config, ConfigError, FeasibilityHeuristic, HeurContext, ImprovementHeuristic, ParamValue,
};
pub use pool::SolutionPool;
pub use rounding::MinLockRounding;
pub use search::{Search, SearchError};
pub use shifting::Shifting;
