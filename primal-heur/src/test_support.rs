//! Shared fixtures for the heuristic unit tests.

use std::sync::Arc;

use primal_core::{
    compute_activities, compute_sol_activities, get_fractional, Activity, LpResult, LpStatus,
    MicrolpSolver, Mip, TimeLimit,
};

use crate::heuristic::HeurContext;

/// Owns everything a [`HeurContext`] borrows, for driving one heuristic
/// against a hand-built model and a prescribed "root LP" point.
pub(crate) struct Fixture {
    pub mip: Arc<Mip>,
    pub activities: Vec<Activity>,
    pub root: LpResult,
    pub sol_activity: Vec<f64>,
    pub fractional: Vec<usize>,
    pub solver: MicrolpSolver,
    pub tlimit: TimeLimit,
}

impl Fixture {
    pub fn new(mip: Arc<Mip>, primal: Vec<f64>) -> Self {
        let obj = mip.objective_value(&primal);
        let activities = compute_activities(&mip);
        let sol_activity = compute_sol_activities(&mip, &primal);
        let fractional = get_fractional(&primal, mip.ninteger());
        let solver = MicrolpSolver::new(mip.clone());
        let nrows = mip.nrows();
        Self {
            mip,
            activities,
            root: LpResult {
                status: LpStatus::Optimal,
                obj,
                primal,
                dual: vec![0.0; nrows],
            },
            sol_activity,
            fractional,
            solver,
            tlimit: TimeLimit::unlimited(),
        }
    }

    pub fn ctx(&self) -> HeurContext<'_> {
        HeurContext {
            mip: &self.mip,
            lb: self.mip.lb(),
            ub: self.mip.ub(),
            activities: &self.activities,
            root: &self.root,
            sol_activity: &self.sol_activity,
            fractional: &self.fractional,
            solver: &self.solver,
            tlimit: self.tlimit,
        }
    }
}
