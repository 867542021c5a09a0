//! `microlp` backend for the [`LpSolver`] trait.

use std::sync::Arc;

use microlp::{ComparisonOp, Error, OptimizationDirection, Problem};

use crate::model::Mip;
use crate::numerics::{is_inf, is_minus_inf};

use super::{Algorithm, LpError, LpResult, LpSolver, LpStatus};

/// LP backend over the pure-Rust `microlp` simplex.
///
/// The solver keeps its own bound vectors so that `change_bounds` calls
/// stay private to one clone; every solve assembles a fresh `microlp`
/// problem over the shared model and the current bounds. The backend picks
/// its own pivoting, so the [`Algorithm`] hint is accepted and ignored, and
/// it exposes no dual values: `dual` comes back zero-filled.
#[derive(Clone)]
pub struct MicrolpSolver {
    mip: Arc<Mip>,
    lb: Vec<f64>,
    ub: Vec<f64>,
}

impl MicrolpSolver {
    /// Create a solver for the LP relaxation of `mip`.
    pub fn new(mip: Arc<Mip>) -> Self {
        let lb = mip.lb().to_vec();
        let ub = mip.ub().to_vec();
        Self { mip, lb, ub }
    }

    fn run(&self) -> Result<LpResult, LpError> {
        let mip = &self.mip;
        let mut problem = Problem::new(OptimizationDirection::Minimize);

        let vars: Vec<microlp::Variable> = (0..mip.ncols())
            .map(|col| {
                let lo = if is_minus_inf(self.lb[col]) {
                    f64::NEG_INFINITY
                } else {
                    self.lb[col]
                };
                let hi = if is_inf(self.ub[col]) {
                    f64::INFINITY
                } else {
                    self.ub[col]
                };
                problem.add_var(mip.obj()[col], (lo, hi))
            })
            .collect();

        for (row, view) in mip.rows().outer_iterator().enumerate() {
            let expr: Vec<(microlp::Variable, f64)> =
                view.iter().map(|(col, &coef)| (vars[col], coef)).collect();
            if expr.is_empty() {
                continue;
            }

            let lhs = mip.lhs()[row];
            let rhs = mip.rhs()[row];
            if lhs == rhs {
                problem.add_constraint(expr, ComparisonOp::Eq, rhs);
            } else {
                if !is_minus_inf(lhs) {
                    problem.add_constraint(expr.clone(), ComparisonOp::Ge, lhs);
                }
                if !is_inf(rhs) {
                    problem.add_constraint(expr, ComparisonOp::Le, rhs);
                }
            }
        }

        match problem.solve() {
            Ok(solution) => {
                let primal = vars.iter().map(|&v| solution[v]).collect();
                Ok(LpResult {
                    status: LpStatus::Optimal,
                    obj: solution.objective(),
                    primal,
                    dual: vec![0.0; mip.nrows()],
                })
            }
            Err(Error::Infeasible) => {
                log::debug!("microlp: infeasible");
                Ok(LpResult::with_status(LpStatus::Infeasible))
            }
            Err(Error::Unbounded) => {
                log::debug!("microlp: unbounded");
                Ok(LpResult::with_status(LpStatus::Unbounded))
            }
            Err(err) => Err(LpError::Backend(err.to_string())),
        }
    }
}

impl LpSolver for MicrolpSolver {
    fn solve(&mut self) -> Result<LpResult, LpError> {
        self.run()
    }

    fn solve_with(&mut self, _algorithm: Algorithm) -> Result<LpResult, LpError> {
        self.run()
    }

    fn clone_solver(&self) -> Box<dyn LpSolver> {
        Box::new(self.clone())
    }

    fn change_bounds(&mut self, col: usize, lb: f64, ub: f64) {
        self.lb[col] = lb;
        self.ub[col] = ub;
    }

    fn change_all_bounds(&mut self, lb: &[f64], ub: &[f64]) {
        self.lb.copy_from_slice(lb);
        self.ub.copy_from_slice(ub);
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{MipBuilder, VarType};

    use super::*;

    fn relaxation() -> Arc<Mip> {
        // min x + y  s.t.  x + y >= 1,  x, y in [0, 1].
        let mut b = MipBuilder::new();
        let x = b.add_var("x", VarType::Binary, 0.0, 1.0, 1.0);
        let y = b.add_var("y", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_row("cover", 1.0, f64::INFINITY, &[(x, 1.0), (y, 1.0)]);
        Arc::new(b.build().unwrap())
    }

    #[test]
    fn test_solve_relaxation() {
        let mut solver = MicrolpSolver::new(relaxation());
        let result = solver.solve().unwrap();

        assert_eq!(result.status, LpStatus::Optimal);
        assert!((result.obj - 1.0).abs() < 1e-6);
        assert_eq!(result.primal.len(), 2);
        assert!((result.primal[0] + result.primal[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bound_changes_are_clone_private() {
        let mut solver = MicrolpSolver::new(relaxation());
        let mut fixed = solver.clone_solver();

        fixed.change_bounds(0, 1.0, 1.0);
        let fixed_result = fixed.solve().unwrap();
        assert_eq!(fixed_result.status, LpStatus::Optimal);
        assert!((fixed_result.primal[0] - 1.0).abs() < 1e-6);

        // The original clone still solves the untouched relaxation.
        let result = solver.solve().unwrap();
        assert!((result.obj - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_is_a_status() {
        let mut solver = MicrolpSolver::new(relaxation());
        solver.change_all_bounds(&[0.0, 0.0], &[0.0, 0.0]);
        let result = solver.solve().unwrap();
        assert_eq!(result.status, LpStatus::Infeasible);
        assert!(result.primal.is_empty());
    }
}
