//! The immutable MIP model and its builder.

mod builder;
mod mip;

pub use builder::MipBuilder;
pub use mip::{Mip, Stats, VarType};

use thiserror::Error;

/// Errors raised while assembling a model.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A coefficient references a variable that was never added.
    #[error("row {row:?} references unknown column {col}")]
    UnknownColumn {
        /// Name of the offending row.
        row: String,
        /// Out-of-range column index.
        col: usize,
    },

    /// Integer variables must precede continuous ones.
    #[error("variable {0:?} breaks the integer-before-continuous column order")]
    ColumnOrder(String),

    /// A variable was declared with crossing bounds.
    #[error("variable {name:?} has empty domain [{lb}, {ub}]")]
    EmptyDomain {
        /// Variable name.
        name: String,
        /// Lower bound.
        lb: f64,
        /// Upper bound.
        ub: f64,
    },
}
