//! Mathematical utilities: relaxation kernels and regularized least squares.

pub mod basis;
pub mod ols;

pub use basis::*;
pub use ols::*;
