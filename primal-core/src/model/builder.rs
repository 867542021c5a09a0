//! Triplet-based model assembly.

use sprs::TriMat;

use crate::numerics::{is_inf, is_minus_inf};

use super::{Mip, ModelError, Stats, VarType};

struct VarDecl {
    name: String,
    var_type: VarType,
    lb: f64,
    ub: f64,
    obj: f64,
}

struct RowDecl {
    name: String,
    lhs: f64,
    rhs: f64,
}

/// Assembles a [`Mip`] from variable declarations and coefficient rows.
///
/// Callers must add all integer variables (binary first by convention)
/// before any continuous one; the front-end performs its own column
/// permutation before feeding the builder. Zero coefficients are dropped.
pub struct MipBuilder {
    vars: Vec<VarDecl>,
    rows: Vec<RowDecl>,
    triplets: Vec<(usize, usize, f64)>,
}

impl Default for MipBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MipBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            vars: Vec::new(),
            rows: Vec::new(),
            triplets: Vec::new(),
        }
    }

    /// Declare a variable and return its column index.
    pub fn add_var(
        &mut self,
        name: impl Into<String>,
        var_type: VarType,
        lb: f64,
        ub: f64,
        obj: f64,
    ) -> usize {
        self.vars.push(VarDecl {
            name: name.into(),
            var_type,
            lb,
            ub,
            obj,
        });
        self.vars.len() - 1
    }

    /// Declare a row `lhs <= sum coef * x[col] <= rhs` and return its index.
    pub fn add_row(
        &mut self,
        name: impl Into<String>,
        lhs: f64,
        rhs: f64,
        coefs: &[(usize, f64)],
    ) -> usize {
        let row = self.rows.len();
        self.rows.push(RowDecl {
            name: name.into(),
            lhs,
            rhs,
        });
        for &(col, coef) in coefs {
            if coef != 0.0 {
                self.triplets.push((row, col, coef));
            }
        }
        row
    }

    /// Validate the declarations and build the immutable model.
    pub fn build(self) -> Result<Mip, ModelError> {
        let ncols = self.vars.len();
        let nrows = self.rows.len();

        let mut seen_continuous = false;
        for var in &self.vars {
            if var.var_type.is_integer() {
                if seen_continuous {
                    return Err(ModelError::ColumnOrder(var.name.clone()));
                }
            } else {
                seen_continuous = true;
            }
            if var.lb > var.ub {
                return Err(ModelError::EmptyDomain {
                    name: var.name.clone(),
                    lb: var.lb,
                    ub: var.ub,
                });
            }
        }

        let mut tri = TriMat::new((nrows, ncols));
        for (row, col, coef) in &self.triplets {
            if *col >= ncols {
                return Err(ModelError::UnknownColumn {
                    row: self.rows[*row].name.clone(),
                    col: *col,
                });
            }
            tri.add_triplet(*row, *col, *coef);
        }

        let rows = tri.to_csr();
        let cols = tri.to_csc();

        let lhs: Vec<f64> = self.rows.iter().map(|r| r.lhs).collect();
        let rhs: Vec<f64> = self.rows.iter().map(|r| r.rhs).collect();

        let mut down_locks = vec![0u32; ncols];
        let mut up_locks = vec![0u32; ncols];
        for (row, view) in rows.outer_iterator().enumerate() {
            let lhs_finite = !is_minus_inf(lhs[row]);
            let rhs_finite = !is_inf(rhs[row]);
            for (col, &coef) in view.iter() {
                if (lhs_finite && coef > 0.0) || (rhs_finite && coef < 0.0) {
                    down_locks[col] += 1;
                }
                if (lhs_finite && coef < 0.0) || (rhs_finite && coef > 0.0) {
                    up_locks[col] += 1;
                }
            }
        }

        let nbin = self
            .vars
            .iter()
            .filter(|v| v.var_type == VarType::Binary)
            .count();
        let nint = self
            .vars
            .iter()
            .filter(|v| v.var_type == VarType::Integer)
            .count();

        let stats = Stats {
            nbin,
            nint,
            ncont: ncols - nbin - nint,
            ncols,
            nrows,
            nnz: rows.nnz(),
        };

        Ok(Mip {
            rows,
            cols,
            lhs,
            rhs,
            lb: self.vars.iter().map(|v| v.lb).collect(),
            ub: self.vars.iter().map(|v| v.ub).collect(),
            obj: self.vars.iter().map(|v| v.obj).collect(),
            var_types: self.vars.iter().map(|v| v.var_type).collect(),
            down_locks,
            up_locks,
            var_names: self.vars.into_iter().map(|v| v.name).collect(),
            cons_names: self.rows.into_iter().map(|r| r.name).collect(),
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_order_enforced() {
        let mut b = MipBuilder::new();
        b.add_var("c", VarType::Continuous, 0.0, 1.0, 0.0);
        b.add_var("x", VarType::Binary, 0.0, 1.0, 0.0);
        assert!(matches!(b.build(), Err(ModelError::ColumnOrder(_))));
    }

    #[test]
    fn test_empty_domain_rejected() {
        let mut b = MipBuilder::new();
        b.add_var("x", VarType::Integer, 3.0, 2.0, 0.0);
        assert!(matches!(b.build(), Err(ModelError::EmptyDomain { .. })));
    }

    #[test]
    fn test_unknown_column_rejected() {
        let mut b = MipBuilder::new();
        let x = b.add_var("x", VarType::Binary, 0.0, 1.0, 0.0);
        b.add_row("r", 0.0, 1.0, &[(x, 1.0), (7, 2.0)]);
        assert!(matches!(b.build(), Err(ModelError::UnknownColumn { .. })));
    }

    #[test]
    fn test_zero_coefficients_dropped() {
        let mut b = MipBuilder::new();
        let x = b.add_var("x", VarType::Binary, 0.0, 1.0, 1.0);
        let y = b.add_var("y", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_row("r", 0.0, 1.0, &[(x, 1.0), (y, 0.0)]);
        let mip = b.build().unwrap();
        assert_eq!(mip.stats().nnz, 1);
    }
}
