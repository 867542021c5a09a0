//! Core model and numeric kernels for the primal heuristic engine.
//!
//! This crate holds everything the heuristics compute with but that is not
//! itself a heuristic:
//!
//! - tolerance-aware floating point comparisons ([`numerics`]);
//! - the immutable [`Mip`] model with its row- and column-major constraint
//!   matrix, variable locks and statistics ([`model`]);
//! - row activities and solution activities with violation tracking
//!   ([`activity`]);
//! - feasibility checking ([`feasibility`]) and the cheap rounding
//!   primitives ([`rounding`]);
//! - the single-column constraint propagation kernel ([`propagation`]);
//! - the [`LpSolver`] abstraction together with the in-tree `microlp`
//!   backend ([`lp`]);
//! - the [`TimeLimit`] carrier heuristics poll to self-terminate
//!   ([`time`]).
//!
//! The model is built once and consumed read-only; every mutable artifact
//! (bounds, activities, candidate solutions) is a per-caller working copy.

pub mod activity;
pub mod feasibility;
pub mod lp;
pub mod model;
pub mod numerics;
pub mod propagation;
pub mod rounding;
pub mod time;

pub use activity::{
    compute_activities, compute_sol_activities, get_fractional, round_feas_integers,
    update_sol_activity, Activity,
};
pub use feasibility::{check_feasibility, check_lp_feasibility, count_violations};
pub use lp::{Algorithm, LpError, LpResult, LpSolver, LpStatus, MicrolpSolver};
pub use model::{Mip, MipBuilder, ModelError, Stats, VarType};
pub use propagation::propagate;
pub use rounding::{has_zero_lock_rounding, min_lock_round, zero_lock_round};
pub use time::TimeLimit;
