//! # Error
//!
//! Failures raised while constructing or stepping a process.
//!
use thiserror::Error;

/// Errors that can occur while building or simulating a process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
  /// A discrete mode outside of its defined set, e.g. beta not in {0, +inf}
  #[error("unsupported {name}: {value} (only 0 and +inf are implemented)")]
  UnsupportedParameter { name: &'static str, value: f64 },

  /// Step size, dimension or shape that cannot describe a process
  #[error("invalid parameter: {0}")]
  InvalidParameter(String),

  /// A value left the domain of the operation applied to it
  #[error("numerical domain error: {0}")]
  NumericalDomain(String),
}

pub type Result<T> = std::result::Result<T, SimError>;

pub(crate) fn check_step_size(h: f64) -> Result<()> {
  if !(h.is_finite() && h > 0.0) {
    return Err(SimError::InvalidParameter(format!(
      "step size must be finite and positive, got {h}"
    )));
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn step_size_must_be_positive() {
    assert!(check_step_size(0.01).is_ok());
    assert!(matches!(check_step_size(0.0), Err(SimError::InvalidParameter(_))));
    assert!(matches!(check_step_size(-1.0), Err(SimError::InvalidParameter(_))));
    assert!(matches!(check_step_size(f64::NAN), Err(SimError::InvalidParameter(_))));
  }

  #[test]
  fn unsupported_parameter_message_names_value() {
    let err = SimError::UnsupportedParameter {
      name: "beta",
      value: 2.0,
    };
    assert_eq!(
      err.to_string(),
      "unsupported beta: 2 (only 0 and +inf are implemented)"
    );
  }
}
