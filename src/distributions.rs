//! # Distributions
//!
//! Random variates consumed by the process step functions.
//!
pub mod multivariate_normal;

pub use multivariate_normal::MultivariateNormal;
