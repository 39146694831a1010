//! # Stochastic Process Simulation Modules
//!
//! Discrete-time (Euler-Maruyama) approximations of a small family of processes, each
//! recording its trajectory until a fixed iteration budget or an extinction condition
//! is reached.
//!
//! ## Modules
//!
//! | Module         | Description                                                                              |
//! |----------------|------------------------------------------------------------------------------------------|
//! | [`covariance`] | The `P_beta` covariance shapes (independent or fully correlated noise).                  |
//! | [`diffusion`]  | Scalar diffusions: Feller and Ornstein-Uhlenbeck.                                        |
//! | [`completion`] | Vector matrix-completion process and the filtered matrix process.                        |
//! | [`matrix`]     | Wishart sampling and spectral-norm rescaling used to initialise filters.                  |
//! | [`ensemble`]   | Independent runs in parallel with per-run seeds, and extinction-time summaries.          |
//!
//! ## Randomness
//!
//! Every process owns its generator (`StdRng` unless another `Rng` is supplied), so
//! seeding a process fixes its trajectory and independent processes never share state.
//!
//! ## Example Usage
//!
//! ```rust
//! use stochastic_extinction::stochastic::diffusion::feller::Feller;
//! use stochastic_extinction::traits::ExtinctExt;
//!
//! let mut feller = Feller::seeded(1.0, 0.01, 42)?;
//! let tau = feller.extinct_simulate()?;
//! ```

pub mod completion;
pub mod covariance;
pub mod diffusion;
pub mod ensemble;
pub mod matrix;

/// Default largest singular value of a freshly drawn filter
pub const DEFAULT_MAX_SINGULAR_VALUE: f64 = 0.5;
/// Default mean-reversion strength of the Ornstein-Uhlenbeck process
pub const DEFAULT_OU_DRIFT: f64 = 1.0;
/// Default step size
pub const DEFAULT_STEP: f64 = 0.01;
