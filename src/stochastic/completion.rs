//! # Matrix completion processes
//!
//! $$
//! dX_t = \Sigma_\beta(X_t)^{1/2}\,dW_t,\qquad
//! \Sigma_\beta = P_\beta\big(\sqrt{1-X_t^2}\big)
//! $$
//!
//! Both processes shape their noise with [`crate::stochastic::covariance::p_beta`] and
//! go extinct once a coordinate (resp. a filter diagonal entry) leaves the unit interval.
//!
pub mod filtered;
pub mod matrix_completion;
