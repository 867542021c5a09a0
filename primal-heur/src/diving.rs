//! Depth-first LP diving driven by a variable-selection rule.

use std::marker::PhantomData;

use primal_core::numerics::{feas_ceil, feas_floor, is_feas_eq, is_integral};
use primal_core::{
    check_feasibility, get_fractional, has_zero_lock_rounding, round_feas_integers,
    zero_lock_round, LpSolver, LpStatus, Mip,
};

use crate::heuristic::{
    ignore_unknown_param, ConfigError, FeasibilityHeuristic, HeurContext, ParamValue,
};
use crate::pool::SolutionPool;

/// Picks the next variable to fix during a dive.
///
/// Returns the chosen column with the bound direction to push (`-1` rounds
/// down, `+1` rounds up), or `None` when no candidate qualifies, together
/// with the number of fractional columns seen.
pub trait SelectionRule: Send {
    /// Identifier of the diving variant using this rule.
    const NAME: &'static str;

    /// Select `(column, direction)` over the fractional integer columns.
    fn select(mip: &Mip, lb: &[f64], ub: &[f64], sol: &[f64]) -> (Option<(usize, i32)>, usize);
}

/// Coefficient diving: minimal nonzero lock count decides the column, the
/// smaller lock side decides the direction.
pub struct CoefSelection;

impl SelectionRule for CoefSelection {
    const NAME: &'static str = "coefdiving";

    fn select(mip: &Mip, lb: &[f64], ub: &[f64], sol: &[f64]) -> (Option<(usize, i32)>, usize) {
        let down_locks = mip.down_locks();
        let up_locks = mip.up_locks();

        let mut best = None;
        let mut min_locks = u32::MAX;
        let mut nfrac = 0;

        for col in 0..mip.ninteger() {
            if is_feas_eq(lb[col], ub[col]) || is_integral(sol[col]) {
                continue;
            }
            nfrac += 1;

            // Columns free to round in a zero-lock direction are left for a
            // final zero-lock rounding pass.
            if down_locks[col].min(up_locks[col]) == 0 {
                continue;
            }

            if down_locks[col] < min_locks {
                best = Some((col, -1));
                min_locks = down_locks[col];
            }
            if up_locks[col] < min_locks {
                best = Some((col, 1));
                min_locks = up_locks[col];
            }
        }

        (best, nfrac)
    }
}

/// Fractional diving: the column nearest to an integer decides, rounding
/// toward that integer.
pub struct FracSelection;

impl SelectionRule for FracSelection {
    const NAME: &'static str = "fracdiving";

    fn select(mip: &Mip, lb: &[f64], ub: &[f64], sol: &[f64]) -> (Option<(usize, i32)>, usize) {
        let mut best = None;
        let mut best_dist = f64::INFINITY;
        let mut nfrac = 0;

        for col in 0..mip.ninteger() {
            if is_feas_eq(lb[col], ub[col]) || is_integral(sol[col]) {
                continue;
            }
            nfrac += 1;

            let frac = sol[col] - sol[col].floor();
            let (dist, direction) = if frac <= 0.5 { (frac, -1) } else { (1.0 - frac, 1) };
            if dist < best_dist {
                best = Some((col, direction));
                best_dist = dist;
            }
        }

        (best, nfrac)
    }
}

/// Shared diving driver: fix one variable per round, re-solve the LP, stop
/// on integrality, infeasibility or the deadline.
pub struct DivingHeuristic<R: SelectionRule> {
    max_rounds: i64,
    run_time: f64,
    _rule: PhantomData<R>,
}

impl<R: SelectionRule> Default for DivingHeuristic<R> {
    fn default() -> Self {
        Self {
            max_rounds: 0,
            run_time: 0.0,
            _rule: PhantomData,
        }
    }
}

impl<R: SelectionRule> DivingHeuristic<R> {
    /// Diving heuristic with an automatic round limit.
    pub fn new() -> Self {
        Self::default()
    }

    fn round_limit(&self, mip: &Mip) -> i64 {
        if self.max_rounds > 0 {
            self.max_rounds
        } else {
            2 * mip.ninteger() as i64 + 100
        }
    }

    /// Pool a solution whose integer part is already integral, recovering
    /// the continuous part through the LP when needed.
    fn finish(mip: &Mip, solver: &mut dyn LpSolver, mut sol: Vec<f64>, pool: &mut SolutionPool) {
        round_feas_integers(&mut sol, mip.ninteger());

        if mip.stats().ncont == 0 {
            if check_feasibility(mip, &sol, 1e-9, 1e-6) {
                let cost = mip.objective_value(&sol);
                log::debug!("{}: found cost {}", R::NAME, cost);
                pool.add(sol, cost);
            }
            return;
        }

        for col in 0..mip.ninteger() {
            solver.change_bounds(col, sol[col], sol[col]);
        }
        match solver.solve() {
            Ok(result) if result.status == LpStatus::Optimal => {
                debug_assert!(check_feasibility(mip, &result.primal, 1e-9, 1e-6));
                log::debug!("{}: lp recovery cost {}", R::NAME, result.obj);
                pool.add(result.primal, result.obj);
            }
            Ok(result) => log::debug!("{}: lp recovery {}", R::NAME, result.status.as_str()),
            Err(err) => log::warn!("{}: lp recovery failed: {err}", R::NAME),
        }
    }
}

impl<R: SelectionRule> FeasibilityHeuristic for DivingHeuristic<R> {
    fn name(&self) -> &'static str {
        R::NAME
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<(), ConfigError> {
        match (name, value) {
            ("max_rounds", ParamValue::Int(n)) => {
                self.max_rounds = (*n).max(0);
                Ok(())
            }
            ("max_rounds", other) => Err(ConfigError::TypeMismatch {
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
        let mut solver = ctx.solver.clone_solver();
        let mut lb = ctx.lb.to_vec();
        let mut ub = ctx.ub.to_vec();
        let mut sol = ctx.root.primal.clone();

        for round in 0..self.round_limit(mip) {
            if ctx.tlimit.expired() {
                log::debug!("{}: deadline reached after {} rounds", R::NAME, round);
                return;
            }

            let (candidate, nfrac) = R::select(mip, &lb, &ub, &sol);

            if nfrac == 0 {
                Self::finish(mip, solver.as_mut(), sol, pool);
                return;
            }

            let (col, direction) = match candidate {
                Some(candidate) => candidate,
                None => {
                    // Every remaining fractional column has a zero-lock
                    // direction: round them all and stop.
                    let fractional = get_fractional(&sol, mip.ninteger());
                    if !has_zero_lock_rounding(mip.down_locks(), mip.up_locks(), &fractional) {
                        log::debug!("{}: no divable candidate", R::NAME);
                        return;
                    }
                    zero_lock_round(&mut sol, mip.down_locks(), &fractional, mip.obj());
                    Self::finish(mip, solver.as_mut(), sol, pool);
                    return;
                }
            };

            if direction > 0 {
                lb[col] = feas_ceil(sol[col]);
            } else {
                ub[col] = feas_floor(sol[col]);
            }
            solver.change_bounds(col, lb[col], ub[col]);

            match solver.solve() {
                Ok(result) if result.status == LpStatus::Optimal => {
                    sol = result.primal;
                }
                Ok(result) => {
                    log::debug!(
                        "{}: dive ended {} after {} rounds",
                        R::NAME,
                        result.status.as_str(),
                        round + 1
                    );
                    return;
                }
                Err(err) => {
                    log::warn!("{}: lp failed: {err}", R::NAME);
                    return;
                }
            }
        }

        log::debug!("{}: round limit reached", R::NAME);
    }
}

/// Coefficient diving.
pub type CoefDiving = DivingHeuristic<CoefSelection>;

/// Fractional diving.
pub type FracDiving = DivingHeuristic<FracSelection>;
