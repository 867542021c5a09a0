//! Single-column bound-change propagation.

use std::collections::VecDeque;

use crate::activity::Activity;
use crate::model::Mip;
use crate::numerics::{feas_ceil, feas_floor, is_inf, is_minus_inf, FEAS_TOL};

/// Fold one column's bound move `[old_lb, old_ub] -> [new_lb, new_ub]` into a
/// row activity, keeping the infinity counters consistent.
fn shift_activity(
    act: &mut Activity,
    coef: f64,
    old_lb: f64,
    old_ub: f64,
    new_lb: f64,
    new_ub: f64,
) {
    let (old_min, old_max, new_min, new_max) = if coef > 0.0 {
        (old_lb, old_ub, new_lb, new_ub)
    } else {
        (old_ub, old_lb, new_ub, new_lb)
    };

    let min_infinite = |b: f64| is_minus_inf(b) || is_inf(b);
    match (min_infinite(old_min), min_infinite(new_min)) {
        (true, true) => {}
        (true, false) => {
            act.ninf_min -= 1;
            act.min += coef * new_min;
        }
        (false, true) => {
            act.ninf_min += 1;
            act.min -= coef * old_min;
        }
        (false, false) => act.min += coef * (new_min - old_min),
    }

    let max_infinite = |b: f64| is_inf(b) || is_minus_inf(b);
    match (max_infinite(old_max), max_infinite(new_max)) {
        (true, true) => {}
        (true, false) => {
            act.ninf_max -= 1;
            act.max += coef * new_max;
        }
        (false, true) => {
            act.ninf_max += 1;
            act.max -= coef * old_max;
        }
        (false, false) => act.max += coef * (new_max - old_max),
    }
}

/// Minimum activity of a row with column `col`'s contribution removed, or
/// `None` when another term is unbounded below.
fn min_excluding(act: &Activity, coef: f64, lb: f64, ub: f64) -> Option<f64> {
    let bound = if coef > 0.0 { lb } else { ub };
    if is_minus_inf(bound) || is_inf(bound) {
        (act.ninf_min == 1).then_some(act.min)
    } else {
        (act.ninf_min == 0).then(|| act.min - coef * bound)
    }
}

/// Maximum activity of a row with column `col`'s contribution removed.
fn max_excluding(act: &Activity, coef: f64, lb: f64, ub: f64) -> Option<f64> {
    let bound = if coef > 0.0 { ub } else { lb };
    if is_inf(bound) || is_minus_inf(bound) {
        (act.ninf_max == 1).then_some(act.max)
    } else {
        (act.ninf_max == 0).then(|| act.max - coef * bound)
    }
}

/// Propagate the consequences of tightening one column's bounds.
///
/// On entry `lb[col]`/`ub[col]` already hold the new values while
/// `activities` still reflects `[old_lb, old_ub]`. The kernel folds the
/// change into the activities, derives activity-based implied bounds on the
/// other columns of every touched row and iterates to a fixpoint, mutating
/// `lb`, `ub` and `activities` in place. Tightenings never loosen a bound
/// and round toward the feasible side on integer columns.
///
/// Returns `false` as soon as some row cannot be satisfied within the
/// feasibility tolerance; there is no undo log, callers that need to
/// backtrack work on copies.
pub fn propagate(
    mip: &Mip,
    lb: &mut [f64],
    ub: &mut [f64],
    activities: &mut [Activity],
    col: usize,
    old_lb: f64,
    old_ub: f64,
) -> bool {
    let lhs = mip.lhs();
    let rhs = mip.rhs();

    let mut queue = VecDeque::new();
    let mut queued = vec![false; mip.nrows()];

    let enqueue_rows = |queue: &mut VecDeque<usize>, queued: &mut [bool], c: usize| {
        if let Some(view) = mip.cols().outer_view(c) {
            for (row, _) in view.iter() {
                if !queued[row] {
                    queued[row] = true;
                    queue.push_back(row);
                }
            }
        }
    };

    // Fold the triggering change into the activities.
    if let Some(view) = mip.cols().outer_view(col) {
        for (row, &coef) in view.iter() {
            shift_activity(&mut activities[row], coef, old_lb, old_ub, lb[col], ub[col]);
        }
    }
    enqueue_rows(&mut queue, &mut queued, col);

    while let Some(row) = queue.pop_front() {
        queued[row] = false;

        let act = activities[row];
        if act.ninf_max == 0 && act.max < lhs[row] - FEAS_TOL {
            return false;
        }
        if act.ninf_min == 0 && act.min > rhs[row] + FEAS_TOL {
            return false;
        }

        let view = match mip.rows().outer_view(row) {
            Some(view) => view,
            None => continue,
        };

        for (c, &coef) in view.iter() {
            let act = activities[row];
            let residual_min = min_excluding(&act, coef, lb[c], ub[c]);
            let residual_max = max_excluding(&act, coef, lb[c], ub[c]);

            // Candidate bounds implied by lhs <= coef * x + residual <= rhs.
            let (mut new_lb, mut new_ub) = (None, None);
            if coef > 0.0 {
                if !is_inf(rhs[row]) {
                    new_ub = residual_min.map(|r| (rhs[row] - r) / coef);
                }
                if !is_minus_inf(lhs[row]) {
                    new_lb = residual_max.map(|r| (lhs[row] - r) / coef);
                }
            } else {
                if !is_inf(rhs[row]) {
                    new_lb = residual_min.map(|r| (rhs[row] - r) / coef);
                }
                if !is_minus_inf(lhs[row]) {
                    new_ub = residual_max.map(|r| (lhs[row] - r) / coef);
                }
            }

            let integer = mip.is_integer(c);
            let mut changed = false;
            let (prev_lb, prev_ub) = (lb[c], ub[c]);

            if let Some(mut cand) = new_ub {
                if integer {
                    cand = feas_floor(cand);
                }
                let tighter = if integer {
                    cand < ub[c] - 0.5
                } else {
                    cand < ub[c] - FEAS_TOL
                };
                if tighter && !is_inf(cand) && !is_minus_inf(cand) {
                    ub[c] = cand;
                    changed = true;
                }
            }

            if let Some(mut cand) = new_lb {
                if integer {
                    cand = feas_ceil(cand);
                }
                let tighter = if integer {
                    cand > lb[c] + 0.5
                } else {
                    cand > lb[c] + FEAS_TOL
                };
                if tighter && !is_minus_inf(cand) && !is_inf(cand) {
                    lb[c] = cand;
                    changed = true;
                }
            }

            if changed {
                if lb[c] > ub[c] + FEAS_TOL {
                    return false;
                }
                if let Some(col_view) = mip.cols().outer_view(c) {
                    for (r, &a) in col_view.iter() {
                        shift_activity(&mut activities[r], a, prev_lb, prev_ub, lb[c], ub[c]);
                    }
                }
                enqueue_rows(&mut queue, &mut queued, c);
            }
        }
    }

    true
}
