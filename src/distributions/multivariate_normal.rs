//! # Multivariate Normal
//!
//! $$
//! X=\mu+U\Lambda^{1/2}Z,\qquad \Sigma=U\Lambda U^\top\succeq 0,\ Z\sim\mathcal N(0,I_n)
//! $$
//!
use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Distribution;
use rand_distr::StandardNormal;

use crate::error::Result;
use crate::error::SimError;
use crate::stochastic::matrix::from_dmatrix;
use crate::stochastic::matrix::to_dmatrix;

/// Relative slack below zero tolerated on covariance eigenvalues before the matrix is
/// rejected as not positive semidefinite.
const PSD_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone)]
enum Factor {
  Diagonal(Array1<f64>),
  Dense(Array2<f64>),
}

/// Gaussian vector with a positive-semidefinite covariance.
///
/// Singular covariances are allowed, e.g. rank-one outer products, which rules out a
/// Cholesky factor; the square root is taken through the symmetric eigendecomposition
/// instead.
#[derive(Debug, Clone)]
pub struct MultivariateNormal {
  mean: Array1<f64>,
  factor: Factor,
}

impl MultivariateNormal {
  pub fn new(mean: Array1<f64>, cov: &Array2<f64>) -> Result<Self> {
    let n = mean.len();
    if cov.dim() != (n, n) {
      return Err(SimError::InvalidParameter(format!(
        "covariance of shape {:?} does not match mean of length {n}",
        cov.dim()
      )));
    }

    let factor = if is_diagonal(cov) {
      Factor::Diagonal(diagonal_sqrt(cov)?)
    } else {
      Factor::Dense(dense_sqrt(cov)?)
    };

    Ok(Self { mean, factor })
  }

  /// Zero-mean distribution with covariance `cov`.
  pub fn centered(cov: &Array2<f64>) -> Result<Self> {
    Self::new(Array1::zeros(cov.nrows()), cov)
  }

  pub fn dim(&self) -> usize {
    self.mean.len()
  }
}

impl Distribution<Array1<f64>> for MultivariateNormal {
  fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
    let z = Array1::<f64>::random_using(self.dim(), StandardNormal, rng);

    match &self.factor {
      Factor::Diagonal(d) => &self.mean + &(d * &z),
      Factor::Dense(a) => &self.mean + &a.dot(&z),
    }
  }
}

fn is_diagonal(cov: &Array2<f64>) -> bool {
  cov
    .indexed_iter()
    .all(|((i, j), v)| i == j || *v == 0.0)
}

fn diagonal_sqrt(cov: &Array2<f64>) -> Result<Array1<f64>> {
  let d = cov.diag();
  let scale = d.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));

  d.iter()
    .map(|&v| {
      if v < -PSD_TOLERANCE * scale || v.is_nan() {
        Err(SimError::NumericalDomain(format!(
          "negative variance {v} on covariance diagonal"
        )))
      } else {
        Ok(v.max(0.0).sqrt())
      }
    })
    .collect()
}

fn dense_sqrt(cov: &Array2<f64>) -> Result<Array2<f64>> {
  if cov.iter().any(|v| !v.is_finite()) {
    return Err(SimError::NumericalDomain(
      "covariance has non-finite entries".into(),
    ));
  }

  // Only the symmetric part defines a Gaussian covariance.
  let sym = (cov + &cov.t()) * 0.5;
  let eigen = to_dmatrix(&sym).symmetric_eigen();
  let scale = eigen.eigenvalues.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));

  let mut roots = Array1::<f64>::zeros(eigen.eigenvalues.len());
  for (k, &lambda) in eigen.eigenvalues.iter().enumerate() {
    if lambda < -PSD_TOLERANCE * scale {
      return Err(SimError::NumericalDomain(format!(
        "covariance is not positive semidefinite (eigenvalue {lambda})"
      )));
    }
    // numerically null directions carry no noise
    roots[k] = if lambda <= PSD_TOLERANCE * scale {
      0.0
    } else {
      lambda.sqrt()
    };
  }

  let u = from_dmatrix(&eigen.eigenvectors);
  Ok(u * &roots.insert_axis(Axis(0)))
}
