//! Row activities, solution activities and violation tracking.

use crate::model::Mip;
use crate::numerics::{is_feas_ge, is_feas_le, is_inf, is_integral, is_minus_inf};

/// Minimum and maximum activity of a row over the variable box.
///
/// Infinite contributions are counted separately so the finite part of the
/// sums stays exact: when `ninf_min == 0`, `min` is the true minimum
/// activity, and symmetrically for `max`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Activity {
    /// Finite part of the minimum activity.
    pub min: f64,
    /// Finite part of the maximum activity.
    pub max: f64,
    /// Number of terms contributing `-inf` to the minimum.
    pub ninf_min: u32,
    /// Number of terms contributing `+inf` to the maximum.
    pub ninf_max: u32,
}

/// Compute the activity of every row from the model bounds.
pub fn compute_activities(mip: &Mip) -> Vec<Activity> {
    let lb = mip.lb();
    let ub = mip.ub();

    let mut activities = vec![Activity::default(); mip.nrows()];
    for (row, view) in mip.rows().outer_iterator().enumerate() {
        let act = &mut activities[row];
        for (col, &coef) in view.iter() {
            let (minb, maxb) = if coef > 0.0 {
                (lb[col], ub[col])
            } else {
                (ub[col], lb[col])
            };

            if is_minus_inf(minb) || is_inf(minb) {
                act.ninf_min += 1;
            } else {
                act.min += coef * minb;
            }

            if is_inf(maxb) || is_minus_inf(maxb) {
                act.ninf_max += 1;
            } else {
                act.max += coef * maxb;
            }
        }
    }
    activities
}

/// Compute `A * sol`, the activity of every row at a point.
pub fn compute_sol_activities(mip: &Mip, sol: &[f64]) -> Vec<f64> {
    mip.rows()
        .outer_iterator()
        .map(|view| view.iter().map(|(col, &coef)| coef * sol[col]).sum())
        .collect()
}

/// Indices of integer columns whose value is fractional, in ascending order.
pub fn get_fractional(sol: &[f64], ninteger: usize) -> Vec<usize> {
    (0..ninteger).filter(|&c| !is_integral(sol[c])).collect()
}

/// Snap integer columns that are integral within tolerance to exact integers.
pub fn round_feas_integers(sol: &mut [f64], ninteger: usize) {
    for value in sol.iter_mut().take(ninteger) {
        if is_integral(*value) {
            *value = value.round();
        }
    }
}

/// Update solution activities after changing one column by `delta`.
///
/// For every row the column participates in, the activity is shifted by
/// `coef * delta` and the row's violation state is re-evaluated against
/// `lhs - FEAS_TOL ..= rhs + FEAS_TOL`. `is_violated` is the authoritative
/// membership bit; `violated_rows` receives a row every time its bit flips
/// from clear to set, so a row repaired and re-violated appears again.
///
/// Returns the net change in the number of violated rows.
pub fn update_sol_activity(
    mip: &Mip,
    col: usize,
    delta: f64,
    sol_activity: &mut [f64],
    violated_rows: &mut Vec<usize>,
    is_violated: &mut [bool],
) -> i64 {
    let lhs = mip.lhs();
    let rhs = mip.rhs();

    let mut change = 0i64;
    if let Some(view) = mip.cols().outer_view(col) {
        for (row, &coef) in view.iter() {
            sol_activity[row] += coef * delta;

            let violated = !is_feas_ge(sol_activity[row], lhs[row])
                || !is_feas_le(sol_activity[row], rhs[row]);

            if violated && !is_violated[row] {
                is_violated[row] = true;
                violated_rows.push(row);
                change += 1;
            } else if !violated && is_violated[row] {
                is_violated[row] = false;
                change -= 1;
            }
        }
    }
    change
}
