//! # Scalar diffusions
//!
//! $$
//! \text{Feller: } dX_t=\sqrt{X_t}\,dW_t,\qquad \text{OU: } dX_t=-aX_t\,dt+dW_t
//! $$
//!
pub mod feller;
pub mod ou;
