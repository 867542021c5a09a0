//! Trial solutions obtained by fixing integers at a bound and propagating.

use rayon::prelude::*;

use primal_core::numerics::{is_inf, is_minus_inf};
use primal_core::{check_feasibility, propagate, Activity, LpSolver, LpStatus, Mip, TimeLimit};

use crate::heuristic::{
    ignore_unknown_param, ConfigError, FeasibilityHeuristic, HeurContext, ParamValue,
};
use crate::pool::SolutionPool;

#[derive(Clone, Copy)]
enum Trial {
    /// Fix every integer at its upper bound.
    AtUpper,
    /// Fix every integer at its lower bound.
    AtLower,
    /// Fix every integer at the side its objective coefficient prefers.
    Optimistic,
}

impl Trial {
    fn label(self) -> &'static str {
        match self {
            Trial::AtUpper => "ub",
            Trial::AtLower => "lb",
            Trial::Optimistic => "opt",
        }
    }
}

/// Runs three bound-fixing trials in parallel and recovers a solution from
/// each one that propagates to a consistent box.
#[derive(Default)]
pub struct BoundSolution {
    run_time: f64,
}

impl BoundSolution {
    /// Heuristic with all three trials enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix column `col` to a single value and propagate the change.
    fn fix(
        mip: &Mip,
        lb: &mut [f64],
        ub: &mut [f64],
        activities: &mut [Activity],
        col: usize,
        value: f64,
    ) -> bool {
        let (old_lb, old_ub) = (lb[col], ub[col]);
        lb[col] = value;
        ub[col] = value;
        propagate(mip, lb, ub, activities, col, old_lb, old_ub)
    }

    /// Resolve a column that was deferred because the target bound was
    /// infinite: fix at the preferred side if propagation made it finite,
    /// at the opposite finite side otherwise, and at 0 when the variable is
    /// still free in both directions.
    fn fix_deferred(
        mip: &Mip,
        lb: &mut [f64],
        ub: &mut [f64],
        activities: &mut [Activity],
        col: usize,
        prefer_low: bool,
    ) -> bool {
        if lb[col] == ub[col] {
            return true;
        }
        let lb_finite = !is_minus_inf(lb[col]);
        let ub_finite = !is_inf(ub[col]);
        let value = match (lb_finite, ub_finite) {
            (false, false) => 0.0,
            (true, false) => lb[col],
            (false, true) => ub[col],
            (true, true) => {
                if prefer_low {
                    lb[col]
                } else {
                    ub[col]
                }
            }
        };
        Self::fix(mip, lb, ub, activities, col, value)
    }

    /// One trial over fresh bound and activity copies.
    ///
    /// Returns the narrowed `(lb, ub)` on success, `None` when propagation
    /// proves the trial box empty.
    fn run_trial(
        trial: Trial,
        ctx: &HeurContext<'_>,
        tlimit: TimeLimit,
    ) -> Option<(Vec<f64>, Vec<f64>)> {
        let mip = ctx.mip;
        let obj = mip.obj();
        let down_locks = mip.down_locks();
        let up_locks = mip.up_locks();

        let mut lb = ctx.lb.to_vec();
        let mut ub = ctx.ub.to_vec();
        let mut activities = ctx.activities.to_vec();
        let mut deferred = Vec::new();

        for col in 0..mip.ncols() {
            if col % 512 == 0 && tlimit.expired() {
                return None;
            }
            if !mip.is_integer(col) || lb[col] == ub[col] {
                continue;
            }

            let fix_low = match trial {
                Trial::AtUpper => false,
                Trial::AtLower => true,
                Trial::Optimistic => {
                    if obj[col] > 0.0 {
                        true
                    } else if obj[col] < 0.0 {
                        false
                    } else {
                        // Zero objective: fix to the side with fewer locks
                        // against it.
                        up_locks[col] > down_locks[col]
                    }
                }
            };

            let target = if fix_low { lb[col] } else { ub[col] };
            if is_minus_inf(target) || is_inf(target) {
                deferred.push((col, fix_low));
                continue;
            }

            if !Self::fix(mip, &mut lb, &mut ub, &mut activities, col, target) {
                log::debug!("boundsol: {} trial infeasible at col {}", trial.label(), col);
                return None;
            }
        }

        for (col, prefer_low) in deferred {
            if !Self::fix_deferred(mip, &mut lb, &mut ub, &mut activities, col, prefer_low) {
                log::debug!(
                    "boundsol: {} trial infeasible on deferred col {}",
                    trial.label(),
                    col
                );
                return None;
            }
        }

        Some((lb, ub))
    }
}

impl FeasibilityHeuristic for BoundSolution {
    fn name(&self) -> &'static str {
        "boundsol"
    }

    fn set_param(&mut self, name: &str, _value: &ParamValue) -> Result<(), ConfigError> {
        ignore_unknown_param(self.name(), name)
    }

    fn run_time(&self) -> f64 {
        self.run_time
    }

    fn record_run_time(&mut self, seconds: f64) {
        self.run_time = seconds;
    }

    fn search(&mut self, ctx: &HeurContext<'_>, pool: &mut SolutionPool) {
        let mip = ctx.mip;
        let trials = [Trial::AtLower, Trial::AtUpper, Trial::Optimistic];

        let boxes: Vec<Option<(Vec<f64>, Vec<f64>)>> = trials
            .par_iter()
            .map(|&trial| Self::run_trial(trial, ctx, ctx.tlimit))
            .collect();

        let mut local_solver: Option<Box<dyn LpSolver>> = None;
        for (trial, narrowed) in trials.iter().zip(boxes) {
            let (lb, ub) = match narrowed {
                Some(narrowed) => narrowed,
                None => continue,
            };

            if mip.stats().ncont == 0 {
                // Every column ended up fixed; the lower bounds are the
                // solution.
                let cost: f64 = mip.obj().iter().zip(&lb).map(|(c, x)| c * x).sum();
                if check_feasibility(mip, &lb, 1e-9, 1e-6) {
                    log::debug!("boundsol: {} trial found cost {}", trial.label(), cost);
                    pool.add(lb, cost);
                }
                continue;
            }

            let solver = local_solver.get_or_insert_with(|| ctx.solver.clone_solver());
            solver.change_all_bounds(&lb, &ub);
            match solver.solve_with(primal_core::Algorithm::Dual) {
                Ok(result) if result.status == LpStatus::Optimal => {
                    debug_assert!(check_feasibility(mip, &result.primal, 1e-9, 1e-6));
                    log::debug!(
                        "boundsol: {} trial lp recovery cost {}",
                        trial.label(),
                        result.obj
                    );
                    pool.add(result.primal, result.obj);
                }
                Ok(result) => {
                    log::debug!(
                        "boundsol: {} trial lp {}",
                        trial.label(),
                        result.status.as_str()
                    );
                }
                Err(err) => {
                    log::warn!("boundsol: lp recovery failed: {err}");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use primal_core::{MipBuilder, VarType};

    use crate::test_support::Fixture;

    use super::*;

    #[test]
    fn test_fixed_bound_mip_solved_without_lp() {
        // x + y = 2 over binaries: fixing x at its upper bound makes
        // propagation fix y too, and the fully fixed box is the solution --
        // a pure-integer model, so no LP recovery happens.
        let mut b = MipBuilder::new();
        let x = b.add_var("x", VarType::Binary, 0.0, 1.0, 1.0);
        let y = b.add_var("y", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_row("eq", 2.0, 2.0, &[(x, 1.0), (y, 1.0)]);
        let mip = Arc::new(b.build().unwrap());

        let fixture = Fixture::new(mip.clone(), vec![1.0, 1.0]);
        let mut pool = SolutionPool::new(10);
        BoundSolution::new().execute(&fixture.ctx(), &mut pool);

        assert!(!pool.is_empty());
        let (sol, cost) = pool.best().unwrap();
        assert_eq!(sol, &[1.0, 1.0]);
        assert!((cost - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible_trial_yields_nothing_from_it() {
        // x + y >= 2 with binaries: the lower-bound trial fixes both to 0
        // and propagation rejects it; the upper-bound trial succeeds.
        let mut b = MipBuilder::new();
        let x = b.add_var("x", VarType::Binary, 0.0, 1.0, 1.0);
        let y = b.add_var("y", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_row("cover2", 2.0, f64::INFINITY, &[(x, 1.0), (y, 1.0)]);
        let mip = Arc::new(b.build().unwrap());

        let fixture = Fixture::new(mip.clone(), vec![1.0, 1.0]);
        let mut pool = SolutionPool::new(10);
        BoundSolution::new().execute(&fixture.ctx(), &mut pool);

        // Only the at-upper trial (and possibly the optimistic one) can
        // contribute, and the solution it finds is (1, 1).
        assert!(!pool.is_empty());
        let (sol, _) = pool.best().unwrap();
        assert_eq!(sol, &[1.0, 1.0]);
    }

    #[test]
    fn test_free_variable_fixed_to_zero() {
        // A free integer with no constraints: the trials park it at 0.
        let mut b = MipBuilder::new();
        let x = b.add_var(
            "x",
            VarType::Integer,
            f64::NEG_INFINITY,
            f64::INFINITY,
            1.0,
        );
        let y = b.add_var("y", VarType::Binary, 0.0, 1.0, 0.0);
        b.add_row("r", 0.0, 1.0, &[(y, 1.0)]);
        let mip = Arc::new(b.build().unwrap());

        let fixture = Fixture::new(mip.clone(), vec![0.0, 0.0]);
        let mut pool = SolutionPool::new(10);
        BoundSolution::new().execute(&fixture.ctx(), &mut pool);

        assert!(!pool.is_empty());
        let (sol, _) = pool.best().unwrap();
        assert_eq!(sol[0], 0.0);
    }

    #[test]
    fn test_optimistic_breaks_zero_objective_ties_by_locks() {
        // max-lock side avoided: y has obj 0, one up-lock and no down-lock,
        // so the optimistic trial parks it low.
        let mut b = MipBuilder::new();
        let y = b.add_var("y", VarType::Integer, 0.0, 3.0, 0.0);
        b.add_row("r", f64::NEG_INFINITY, 2.0, &[(y, 1.0)]);
        let mip = Arc::new(b.build().unwrap());

        let fixture = Fixture::new(mip.clone(), vec![0.0]);
        let ctx = fixture.ctx();
        let (lb, ub) = BoundSolution::run_trial(Trial::Optimistic, &ctx, ctx.tlimit).unwrap();
        assert_eq!((lb[0], ub[0]), (0.0, 0.0));
    }
}
