//! Euler-Maruyama simulation of scalar diffusions and filtered matrix processes,
//! run for a fixed number of steps or until extinction.

pub mod distributions;
pub mod error;
pub mod stochastic;
pub mod traits;

pub use error::Result;
pub use error::SimError;
pub use traits::ExtinctExt;
pub use traits::ProcessExt;
