//! Lock-guided rounding with row repair.

use std::cmp::Reverse;

use primal_core::numerics::{feas_ceil, feas_floor, is_feas_ge, is_feas_le, is_integral};
use primal_core::{check_feasibility, update_sol_activity, LpSolver, LpStatus};

use crate::heuristic::{
    ignore_unknown_param, ConfigError, FeasibilityHeuristic, HeurContext, ParamValue,
};
use crate::pool::SolutionPool;

/// Rounds the root LP fractionals toward their cheaper lock direction and
/// repairs violated rows on the fly.
///
/// Up to four orderings of the fractional list are attempted, each
/// restarting from the root LP point: ascending minimum lock count,
/// ascending maximum lock count, ascending column size, descending column
/// size. Every ordering that reaches zero violations contributes a
/// solution.
pub struct MinLockRounding {
    max_orderings: i64,
    run_time: f64,
}

impl Default for MinLockRounding {
    fn default() -> Self {
        Self {
            max_orderings: 4,
            run_time: 0.0,
        }
    }
}

impl MinLockRounding {
    /// Heuristic with all four orderings enabled.
    pub fn new() -> Self {
        Self::default()
    }

    fn round_with_ordering(
        &self,
        ctx: &HeurContext<'_>,
        ordering: usize,
        sol: &mut Vec<f64>,
        sol_act: &mut [f64],
    ) -> bool {
        let mip = ctx.mip;
        let down_locks = mip.down_locks();
        let up_locks = mip.up_locks();
        let lhs = mip.lhs();
        let rhs = mip.rhs();
        let ncont = mip.stats().ncont as i64;

        let mut perm = ctx.fractional.to_vec();
        match ordering {
            0 => perm.sort_by_key(|&c| down_locks[c].min(up_locks[c])),
            1 => perm.sort_by_key(|&c| down_locks[c].max(up_locks[c])),
            2 => perm.sort_by_key(|&c| mip.col_size(c)),
            _ => perm.sort_by_key(|&c| Reverse(mip.col_size(c))),
        }

        for &col in &perm {
            if is_integral(sol[col]) {
                continue;
            }

            let mut violated_rows = Vec::new();
            let mut is_violated = vec![false; mip.nrows()];

            let old = sol[col];
            sol[col] = if down_locks[col] < up_locks[col] {
                feas_floor(old)
            } else {
                feas_ceil(old)
            };

            let mut nviolated = update_sol_activity(
                mip,
                col,
                sol[col] - old,
                sol_act,
                &mut violated_rows,
                &mut is_violated,
            );
            if nviolated == 0 {
                continue;
            }

            log::debug!(
                "rounding: {} rows violated after col {} moved {} -> {}",
                nviolated,
                col,
                old,
                sol[col]
            );

            // Continuous variables can cycle while repairing, so the number
            // of continuous changes is capped at 2 * ncont.
            let mut ncont_changes = 0i64;
            let mut next = 0;
            while next < violated_rows.len() && ncont_changes <= 2 * ncont {
                let row = violated_rows[next];
                next += 1;
                if !is_violated[row] {
                    continue;
                }

                let view = match mip.rows().outer_view(row) {
                    Some(view) => view,
                    None => continue,
                };

                let mut row_corrected = false;
                for (ncol, &ncoef) in view.iter() {
                    let integer = mip.is_integer(ncol);
                    if integer && is_integral(sol[ncol]) {
                        continue;
                    }

                    let old_val = sol[ncol];
                    if !is_feas_ge(sol_act[row], lhs[row]) {
                        // Short of the lhs: push the activity up.
                        if integer {
                            let moved = if ncoef > 0.0 {
                                feas_ceil(old_val)
                            } else {
                                feas_floor(old_val)
                            };
                            if moved >= ctx.lb[ncol] && moved <= ctx.ub[ncol] {
                                sol[ncol] = moved;
                            }
                        } else if ncoef > 0.0 {
                            sol[ncol] += ((lhs[row] - sol_act[row]) / ncoef)
                                .min(ctx.ub[ncol] - old_val);
                        } else {
                            sol[ncol] += ((lhs[row] - sol_act[row]) / ncoef)
                                .max(ctx.lb[ncol] - old_val);
                        }
                    } else {
                        // Over the rhs: pull the activity down.
                        if integer {
                            let moved = if ncoef > 0.0 {
                                feas_floor(old_val)
                            } else {
                                feas_ceil(old_val)
                            };
                            if moved >= ctx.lb[ncol] && moved <= ctx.ub[ncol] {
                                sol[ncol] = moved;
                            }
                        } else if ncoef > 0.0 {
                            sol[ncol] += ((rhs[row] - sol_act[row]) / ncoef)
                                .max(ctx.lb[ncol] - old_val);
                        } else {
                            sol[ncol] += ((rhs[row] - sol_act[row]) / ncoef)
                                .min(ctx.ub[ncol] - old_val);
                        }
                    }

                    if (sol[ncol] - old_val).abs() > 1e-6 {
                        if !integer {
                            ncont_changes += 1;
                        }
                        nviolated += update_sol_activity(
                            mip,
                            ncol,
                            sol[ncol] - old_val,
                            sol_act,
                            &mut violated_rows,
                            &mut is_violated,
                        );
                    }

                    if is_feas_ge(sol_act[row], lhs[row]) && is_feas_le(sol_act[row], rhs[row]) {
                        row_corrected = true;
                        break;
                    }
                }

                if !row_corrected {
                    return false;
                }
            }

            if nviolated > 0 {
                log::debug!("rounding: ordering {} stuck with {} violated rows", ordering, nviolated);
                return false;
            }
        }

        true
    }
}

impl FeasibilityHeuristic for MinLockRounding {
    fn name(&self) -> &'static str {
        "lockrounding"
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<(), ConfigError> {
        match (name, value) {
            ("max_orderings", ParamValue::Int(n)) => {
                self.max_orderings = (*n).clamp(1, 4);
                Ok(())
            }
            ("max_orderings", other) => Err(ConfigError::TypeMismatch {
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

    fn search(&mut self, ctx: &HeurContext<'_>, pool: &mut SolutionPool) {
        let mip = ctx.mip;
        let mut local_solver: Option<Box<dyn LpSolver>> = None;

        for ordering in 0..self.max_orderings as usize {
            if ctx.tlimit.expired() {
                log::debug!("rounding: deadline reached before ordering {}", ordering);
                return;
            }

            let mut sol = ctx.root.primal.clone();
            let mut sol_act = ctx.sol_activity.to_vec();

            if !self.round_with_ordering(ctx, ordering, &mut sol, &mut sol_act) {
                continue;
            }

            if mip.stats().ncont == 0 {
                let cost = mip.objective_value(&sol);
                debug_assert!(check_feasibility(mip, &sol, 1e-9, 1e-6));
                log::debug!("rounding: ordering {} found cost {}", ordering, cost);
                pool.add(sol, cost);
                continue;
            }

            // Fix the integers and let the LP recover the continuous part.
            let solver = local_solver.get_or_insert_with(|| ctx.solver.clone_solver());
            for col in 0..mip.ninteger() {
                debug_assert!(is_integral(sol[col]));
                solver.change_bounds(col, sol[col], sol[col]);
            }

            match solver.solve() {
                Ok(result) if result.status == LpStatus::Optimal => {
                    log::debug!("rounding: ordering {} lp recovery cost {}", ordering, result.obj);
                    pool.add(result.primal, result.obj);
                }
                Ok(result) => {
                    log::debug!(
                        "rounding: ordering {} lp recovery {}",
                        ordering,
                        result.status.as_str()
                    );
                }
                Err(err) => {
                    log::warn!("rounding: lp recovery failed: {err}");
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
    fn test_rounds_pure_binary_cover() {
        // min x + y, x + y >= 1, LP point (0.5, 0.5).
        let mut b = MipBuilder::new();
        let x = b.add_var("x", VarType::Binary, 0.0, 1.0, 1.0);
        let y = b.add_var("y", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_row("cover", 1.0, f64::INFINITY, &[(x, 1.0), (y, 1.0)]);
        let mip = Arc::new(b.build().unwrap());

        let fixture = Fixture::new(mip.clone(), vec![0.5, 0.5]);
        let mut pool = SolutionPool::new(10);
        let mut heur = MinLockRounding::new();
        heur.execute(&fixture.ctx(), &mut pool);

        assert!(!pool.is_empty());
        let (sol, cost) = pool.best().unwrap();
        assert!(check_feasibility(&mip, sol, 1e-9, 1e-6));
        assert!(cost >= 1.0);
        assert!(heur.run_time() >= 0.0);
    }

    #[test]
    fn test_repair_adjusts_continuous() {
        // x1 + x2 + c = 1.5 with c in [0, 1]: rounding a fractional binary
        // breaks the equation and the continuous column absorbs the slack.
        let mut b = MipBuilder::new();
        let x1 = b.add_var("x1", VarType::Binary, 0.0, 1.0, 1.0);
        let x2 = b.add_var("x2", VarType::Binary, 0.0, 1.0, 1.0);
        let c = b.add_var("c", VarType::Continuous, 0.0, 1.0, 0.0);
        b.add_row("eq", 1.5, 1.5, &[(x1, 1.0), (x2, 1.0), (c, 1.0)]);
        let mip = Arc::new(b.build().unwrap());

        let fixture = Fixture::new(mip.clone(), vec![0.75, 0.0, 0.75]);
        let mut pool = SolutionPool::new(10);
        MinLockRounding::new().execute(&fixture.ctx(), &mut pool);

        assert!(!pool.is_empty());
        let (sol, _) = pool.best().unwrap();
        assert!(check_feasibility(&mip, sol, 1e-9, 1e-6));
    }

    #[test]
    fn test_deterministic_pools() {
        let mut b = MipBuilder::new();
        let x = b.add_var("x", VarType::Binary, 0.0, 1.0, 1.0);
        let y = b.add_var("y", VarType::Binary, 0.0, 1.0, 2.0);
        b.add_row("cover", 1.0, f64::INFINITY, &[(x, 1.0), (y, 1.0)]);
        let mip = Arc::new(b.build().unwrap());

        let run = || {
            let fixture = Fixture::new(mip.clone(), vec![0.5, 0.5]);
            let mut pool = SolutionPool::new(10);
            MinLockRounding::new().execute(&fixture.ctx(), &mut pool);
            (0..pool.len()).map(|i| pool.get(i).1).collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_param_type_mismatch() {
        let mut heur = MinLockRounding::new();
        let err = heur.set_param("max_orderings", &ParamValue::Bool(true));
        assert!(matches!(err, Err(ConfigError::TypeMismatch { .. })));
        assert!(heur.set_param("max_orderings", &ParamValue::Int(2)).is_ok());
        assert!(heur.set_param("nonsense", &ParamValue::Int(1)).is_ok());
    }
}
