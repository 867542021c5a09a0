//! Feasibility checking for candidate assignments.

use crate::model::Mip;
use crate::numerics::is_integral;

fn violations(mip: &Mip, sol: &[f64], bound_tol: f64, cons_tol: f64, lp_mode: bool) -> usize {
    debug_assert_eq!(sol.len(), mip.ncols());

    let lb = mip.lb();
    let ub = mip.ub();
    let ninteger = mip.ninteger();

    let mut count = 0;
    for (col, &value) in sol.iter().enumerate() {
        if value > ub[col] + bound_tol || value < lb[col] - bound_tol {
            count += 1;
        }
        if !lp_mode && col < ninteger && !is_integral(value) {
            count += 1;
        }
    }

    for (row, view) in mip.rows().outer_iterator().enumerate() {
        let activity: f64 = view.iter().map(|(col, &coef)| coef * sol[col]).sum();
        if activity > mip.rhs()[row] + cons_tol || activity < mip.lhs()[row] - cons_tol {
            count += 1;
        }
    }

    count
}

/// Whether `sol` satisfies bounds, integrality and all rows within tolerance.
pub fn check_feasibility(mip: &Mip, sol: &[f64], bound_tol: f64, cons_tol: f64) -> bool {
    violations(mip, sol, bound_tol, cons_tol, false) == 0
}

/// [`check_feasibility`] without the integrality requirement, for LP points.
pub fn check_lp_feasibility(mip: &Mip, sol: &[f64], bound_tol: f64, cons_tol: f64) -> bool {
    violations(mip, sol, bound_tol, cons_tol, true) == 0
}

/// Number of violated bounds, integrality conditions and rows.
pub fn count_violations(mip: &Mip, sol: &[f64], bound_tol: f64, cons_tol: f64) -> usize {
    violations(mip, sol, bound_tol, cons_tol, false)
}

#[cfg(test)]
mod tests {
    use crate::model::{MipBuilder, VarType};

    use super::*;

    fn covering() -> Mip {
        // x + y >= 1, both binary.
        let mut b = MipBuilder::new();
        let x = b.add_var("x", VarType::Binary, 0.0, 1.0, 1.0);
        let y = b.add_var("y", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_row("cover", 1.0, f64::INFINITY, &[(x, 1.0), (y, 1.0)]);
        b.build().unwrap()
    }

    #[test]
    fn test_feasible_point() {
        let mip = covering();
        assert!(check_feasibility(&mip, &[1.0, 0.0], 1e-9, 1e-6));
        assert!(check_feasibility(&mip, &[1.0, 1.0], 1e-9, 1e-6));
    }

    #[test]
    fn test_integrality_required_unless_lp_mode() {
        let mip = covering();
        let lp_point = [0.5, 0.5];
        assert!(!check_feasibility(&mip, &lp_point, 1e-9, 1e-6));
        assert!(check_lp_feasibility(&mip, &lp_point, 1e-9, 1e-6));
    }

    #[test]
    fn test_violation_counting() {
        let mip = covering();
        // Bound violation on x, integrality violation on x, row violated.
        assert_eq!(count_violations(&mip, &[-0.5, 0.0], 1e-9, 1e-6), 3);
        assert_eq!(count_violations(&mip, &[1.0, 0.0], 1e-9, 1e-6), 0);
    }

    #[test]
    fn test_row_order_independence() {
        // Two equivalent models with rows declared in opposite order agree.
        let build = |swap: bool| {
            let mut b = MipBuilder::new();
            let x = b.add_var("x", VarType::Binary, 0.0, 1.0, 1.0);
            let y = b.add_var("y", VarType::Binary, 0.0, 1.0, 1.0);
            let rows: [(&str, f64, f64, Vec<(usize, f64)>); 2] = [
                ("a", 1.0, f64::INFINITY, vec![(x, 1.0), (y, 1.0)]),
                ("b", f64::NEG_INFINITY, 1.0, vec![(x, 1.0)]),
            ];
            let order: Vec<usize> = if swap { vec![1, 0] } else { vec![0, 1] };
            for i in order {
                let (name, lhs, rhs, coefs) = &rows[i];
                b.add_row(*name, *lhs, *rhs, coefs);
            }
            b.build().unwrap()
        };

        let sol = [1.0, 1.0];
        assert_eq!(
            check_feasibility(&build(false), &sol, 1e-9, 1e-6),
            check_feasibility(&build(true), &sol, 1e-9, 1e-6)
        );
    }
}
