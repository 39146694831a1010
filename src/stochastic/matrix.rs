//! # Matrix
//!
//! $$
//! W = XX^\top,\ X_{ij}\sim\mathcal N(0,1),\qquad \operatorname{rescale}(M,s)=\frac{s}{\sigma_{\max}(M)}\,M
//! $$
//!
use nalgebra::DMatrix;
use ndarray::Array2;
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::Result;
use crate::error::SimError;

pub(crate) fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
  let (rows, cols) = a.dim();
  DMatrix::from_fn(rows, cols, |i, j| a[[i, j]])
}

pub(crate) fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
  Array2::from_shape_fn(m.shape(), |(i, j)| m[(i, j)])
}

/// Draw an `n x n` matrix from the Wishart ensemble, `X X^T` with `X` an `n x p`
/// matrix of i.i.d. standard normals.
pub fn random_matrix_wishart<R: Rng + ?Sized>(n: usize, p: usize, rng: &mut R) -> Array2<f64> {
  let x = Array2::<f64>::random_using((n, p), StandardNormal, rng);
  x.dot(&x.t())
}

/// Largest singular value of `matrix`.
pub fn largest_singular_value(matrix: &Array2<f64>) -> f64 {
  if matrix.is_empty() {
    return 0.0;
  }

  to_dmatrix(matrix).singular_values().max()
}

/// Scale `matrix` so that its largest singular value equals `max_singular_val`.
///
/// Fails with [`SimError::NumericalDomain`] when the matrix has no non-zero singular
/// value to scale against.
pub fn rescale(matrix: &Array2<f64>, max_singular_val: f64) -> Result<Array2<f64>> {
  let cur_max = largest_singular_value(matrix);
  if cur_max == 0.0 || !cur_max.is_finite() {
    return Err(SimError::NumericalDomain(format!(
      "cannot rescale a matrix with largest singular value {cur_max}"
    )));
  }

  Ok(matrix * (max_singular_val / cur_max))
}
