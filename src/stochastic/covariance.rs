//! # P-beta covariance
//!
//! $$
//! P_0(r)=\operatorname{diag}(r_1^2,\dots,r_n^2),\qquad P_\infty(r)=rr^\top
//! $$
//!
use std::fmt;

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;

use crate::error::Result;
use crate::error::SimError;

/// Shape of the per-step noise covariance.
///
/// Only the two ends of the beta family are defined: independent coordinates
/// (`beta = 0`) and fully correlated noise (`beta = +inf`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Beta {
  Zero,
  Infinity,
}

impl Beta {
  /// `P_beta` built from the residual roots `r`; `r_i^2` sits on the diagonal.
  pub fn covariance(self, r: ArrayView1<f64>) -> Array2<f64> {
    match self {
      Beta::Zero => Array2::from_diag(&r.mapv(|x| x * x)),
      Beta::Infinity => {
        let col = r.insert_axis(Axis(1));
        let row = r.insert_axis(Axis(0));
        col.dot(&row)
      }
    }
  }

  pub fn value(self) -> f64 {
    match self {
      Beta::Zero => 0.0,
      Beta::Infinity => f64::INFINITY,
    }
  }
}

impl TryFrom<f64> for Beta {
  type Error = SimError;

  fn try_from(beta: f64) -> Result<Self> {
    if beta == 0.0 {
      Ok(Beta::Zero)
    } else if beta == f64::INFINITY {
      Ok(Beta::Infinity)
    } else {
      Err(SimError::UnsupportedParameter {
        name: "beta",
        value: beta,
      })
    }
  }
}

impl fmt::Display for Beta {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Beta::Zero => write!(f, "0"),
      Beta::Infinity => write!(f, "inf"),
    }
  }
}

/// `P_beta` for a raw beta value, validated on every call.
pub fn p_beta(beta: f64, r: ArrayView1<f64>) -> Result<Array2<f64>> {
  Ok(Beta::try_from(beta)?.covariance(r))
}

/// Componentwise square root of a residual vector.
///
/// A negative entry means the process already left the region where its noise is
/// defined, reported as [`SimError::NumericalDomain`].
pub fn residual_sqrt(residual: &Array1<f64>) -> Result<Array1<f64>> {
  if let Some((i, v)) = residual
    .iter()
    .enumerate()
    .find(|(_, v)| **v < 0.0 || v.is_nan())
  {
    return Err(SimError::NumericalDomain(format!(
      "residual {v} at coordinate {i} has no real square root"
    )));
  }

  Ok(residual.mapv(f64::sqrt))
}
