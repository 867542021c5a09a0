//! Objective-driven shifting of an incumbent solution.

use primal_core::numerics::{is_inf, is_minus_inf, FEAS_TOL};
use primal_core::{check_feasibility, compute_sol_activities, LpSolver, LpStatus};

use crate::heuristic::{
    ignore_unknown_param, ConfigError, HeurContext, ImprovementHeuristic, ParamValue,
};
use crate::pool::SolutionPool;

/// Shifts integer variables of the incumbent one at a time in their
/// objective-improving direction, as far as the row slacks and bounds
/// allow, then lets the LP polish the continuous part.
///
/// Whole-unit shifts only, so feasibility is preserved by construction;
/// sweeps repeat until a pass makes no progress.
pub struct Shifting {
    max_passes: i64,
    run_time: f64,
}

impl Default for Shifting {
    fn default() -> Self {
        Self {
            max_passes: 10,
            run_time: 0.0,
        }
    }
}

impl Shifting {
    /// Heuristic with the default pass limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest whole-unit step of column `col` in direction `dir` that keeps
    /// every row of the column within its sides.
    fn max_step(ctx: &HeurContext<'_>, sol_act: &[f64], col: usize, dir: f64, sol: &[f64]) -> f64 {
        let mip = ctx.mip;

        // Bound room first.
        let mut step = if dir > 0.0 {
            if is_inf(ctx.ub[col]) {
                f64::INFINITY
            } else {
                ctx.ub[col] - sol[col]
            }
        } else if is_minus_inf(ctx.lb[col]) {
            f64::INFINITY
        } else {
            sol[col] - ctx.lb[col]
        };

        if let Some(view) = mip.cols().outer_view(col) {
            for (row, &coef) in view.iter() {
                // The activity moves by coef * dir per unit step; slack in
                // that direction limits the step.
                let move_per_unit = coef * dir;
                let room = if move_per_unit > 0.0 {
                    if is_inf(mip.rhs()[row]) {
                        f64::INFINITY
                    } else {
                        (mip.rhs()[row] - sol_act[row]) / move_per_unit
                    }
                } else if is_minus_inf(mip.lhs()[row]) {
                    f64::INFINITY
                } else {
                    (mip.lhs()[row] - sol_act[row]) / move_per_unit
                };
                step = step.min(room);
            }
        }

        // Whole units, and a small tolerance so a slack of 0.9999999 counts
        // as one full unit.
        (step + FEAS_TOL).floor().max(0.0)
    }
}

impl ImprovementHeuristic for Shifting {
    fn name(&self) -> &'static str {
        "shifting"
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<(), ConfigError> {
        match (name, value) {
            ("max_passes", ParamValue::Int(n)) => {
                self.max_passes = (*n).max(1);
                Ok(())
            }
            ("max_passes", other) => Err(ConfigError::TypeMismatch {
                param: name.into(),
                expected: "int",
                got: other.type_name(),
            }),
            _ => ignore_unknown_param(self.name(), name),
        }
    }

    fn run_time(&self) -> f64 {
        self.run_time
    }

    fn record_run_time(&mut self, seconds: f64) {
        self.run_time = seconds;
    }

    fn improve(
        &mut self,
        ctx: &HeurContext<'_>,
        incumbent: &[f64],
        incumbent_cost: f64,
        pool: &mut SolutionPool,
    ) {
        let mip = ctx.mip;
        let obj = mip.obj();

        let mut sol = incumbent.to_vec();
        let mut sol_act = compute_sol_activities(mip, &sol);
        let mut cost = incumbent_cost;
        let mut shifted = false;

        for _pass in 0..self.max_passes {
            if ctx.tlimit.expired() {
                break;
            }

            let mut improved_pass = false;
            for col in 0..mip.ninteger() {
                if obj[col] == 0.0 {
                    continue;
                }

                // Moving against the objective coefficient lowers the cost.
                let dir = if obj[col] > 0.0 { -1.0 } else { 1.0 };
                let step = Self::max_step(ctx, &sol_act, col, dir, &sol);
                if step < 1.0 {
                    continue;
                }

                let delta = dir * step;
                sol[col] += delta;
                if let Some(view) = mip.cols().outer_view(col) {
                    for (row, &coef) in view.iter() {
                        sol_act[row] += coef * delta;
                    }
                }
                cost += obj[col] * delta;
                shifted = true;
                improved_pass = true;
            }

            if !improved_pass {
                break;
            }
        }

        if !shifted || cost >= incumbent_cost - 1e-9 {
            return;
        }

        if mip.stats().ncont == 0 {
            if check_feasibility(mip, &sol, 1e-9, 1e-6) {
                log::debug!("shifting: improved {} -> {}", incumbent_cost, cost);
                pool.add(sol, cost);
            }
            return;
        }

        // Fix the shifted integers and let the LP re-optimize the rest.
        let mut solver = ctx.solver.clone_solver();
        for col in 0..mip.ninteger() {
            solver.change_bounds(col, sol[col], sol[col]);
        }
        match solver.solve() {
            Ok(result)
                if result.status == LpStatus::Optimal && result.obj < incumbent_cost - 1e-9 =>
            {
                debug_assert!(check_feasibility(mip, &result.primal, 1e-9, 1e-6));
                log::debug!("shifting: improved {} -> {}", incumbent_cost, result.obj);
                pool.add(result.primal, result.obj);
            }
            Ok(_) => {}
            Err(err) => log::warn!("shifting: lp polish failed: {err}"),
        }
    }
}
