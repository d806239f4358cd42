//! Dense LU factorization with partial pivoting.
//!
//! The TPS system is symmetric but indefinite (the lower-right block is
//! zero), so a plain Cholesky factorization does not apply. Pivots smaller
//! than `tolerance * ‖M‖∞` are reported as singular instead of being
//! divided through.

use faer::{linalg::solvers::PartialPivLu, prelude::SpSolver, Mat};

use crate::error::TpsError;

/// A checked `P M = L U` factorization backed by faer.
pub(crate) struct LuFactorization {
    lu: PartialPivLu<f64>,
}

/// Infinity norm (max absolute row sum) of a square matrix.
pub(crate) fn norm_inf(m: &Mat<f64>) -> f64 {
    (0..m.nrows())
        .map(|i| (0..m.ncols()).map(|j| m[(i, j)].abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

impl LuFactorization {
    /// Factorize `m` and check every pivot of `U`.
    ///
    /// # Errors
    ///
    /// Returns [`TpsError::SingularSystem`] when `m` has non-finite entries or
    /// when a diagonal entry of `U` falls below `tolerance` relative to the
    /// infinity norm of `m`.
    pub(crate) fn factorize(m: &Mat<f64>, tolerance: f64) -> Result<Self, TpsError> {
        debug_assert_eq!(m.nrows(), m.ncols());

        let norm = norm_inf(m);
        if !norm.is_finite() {
            return Err(TpsError::SingularSystem(
                "system matrix has non-finite entries".to_string(),
            ));
        }
        let threshold = tolerance * norm;

        let lu = m.partial_piv_lu();
        let u = lu.compute_u();
        for k in 0..u.nrows() {
            let pivot = u[(k, k)].abs();
            if pivot.is_nan() || pivot <= threshold {
                return Err(TpsError::SingularSystem(format!(
                    "pivot {pivot:.3e} in column {k} is below {threshold:.3e}"
                )));
            }
        }

        Ok(Self { lu })
    }

    /// Solve `M X = B` for all columns of `rhs` at once.
    pub(crate) fn solve(&self, rhs: &Mat<f64>) -> Mat<f64> {
        self.lu.solve(rhs.as_ref())
    }
}
