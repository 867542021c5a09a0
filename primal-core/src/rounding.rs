//! Cheap rounding primitives driven by variable locks.

use crate::feasibility::check_feasibility;
use crate::model::Mip;
use crate::numerics::{feas_ceil, feas_floor};

/// Whether every fractional column can be rounded in a direction with zero
/// locks, which makes the rounding feasible by construction.
pub fn has_zero_lock_rounding(
    down_locks: &[u32],
    up_locks: &[u32],
    fractional: &[usize],
) -> bool {
    fractional
        .iter()
        .all(|&c| down_locks[c] == 0 || up_locks[c] == 0)
}

/// Round every fractional column in its zero-lock direction, in place.
///
/// Assumes [`has_zero_lock_rounding`] holds. Columns with zero down-locks
/// round down, the rest round up. Returns the objective delta.
pub fn zero_lock_round(
    sol: &mut [f64],
    down_locks: &[u32],
    fractional: &[usize],
    obj: &[f64],
) -> f64 {
    let mut delta = 0.0;
    for &col in fractional {
        let old = sol[col];
        sol[col] = if down_locks[col] == 0 {
            feas_floor(old)
        } else {
            feas_ceil(old)
        };
        delta += obj[col] * (sol[col] - old);
    }
    delta
}

/// Trivial min-lock rounding of a point.
///
/// Each fractional column rounds down when `down_locks <= up_locks`, up
/// otherwise. Returns the rounded assignment and its cost iff the result is
/// feasible; no repair is attempted.
pub fn min_lock_round(
    mip: &Mip,
    sol: &[f64],
    obj_value: f64,
    fractional: &[usize],
) -> Option<(Vec<f64>, f64)> {
    let down_locks = mip.down_locks();
    let up_locks = mip.up_locks();
    let obj = mip.obj();

    let mut rounded = sol.to_vec();
    let mut cost = obj_value;
    for &col in fractional {
        let old = rounded[col];
        rounded[col] = if down_locks[col] <= up_locks[col] {
            feas_floor(old)
        } else {
            feas_ceil(old)
        };
        cost += obj[col] * (rounded[col] - old);
    }

    if check_feasibility(mip, &rounded, 1e-9, 1e-6) {
        Some((rounded, cost))
    } else {
        None
    }
}
