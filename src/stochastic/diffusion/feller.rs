use ndarray::Array1;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rand_distr::Distribution;
use rand_distr::Normal;

use crate::error::check_step_size;
use crate::error::Result;
use crate::error::SimError;
use crate::traits::ExtinctExt;
use crate::traits::ProcessExt;

/// Feller diffusion
/// dX_t = sqrt(X_t) dW_t
///
/// Discretised as `X_{k+1} = X_k + sqrt(X_k) * N(0, h)`. The state is not clamped at 0:
/// stepping from a negative value is a [`SimError::NumericalDomain`] error, and a run
/// until extinction stops at the first value `<= 0`.
pub struct Feller<R: Rng = StdRng> {
  h: f64,
  init_value: f64,
  val: f64,
  vals: Vec<f64>,
  kick: Normal<f64>,
  rng: R,
}

impl<R: Rng> Feller<R> {
  pub fn new(init_value: f64, h: f64, rng: R) -> Result<Self> {
    check_step_size(h)?;
    let kick = Normal::new(0.0, h.sqrt())
      .map_err(|err| SimError::InvalidParameter(format!("step size {h}: {err}")))?;

    Ok(Self {
      h,
      init_value,
      val: init_value,
      vals: vec![init_value],
      kick,
      rng,
    })
  }

  /// Step size.
  pub fn h(&self) -> f64 {
    self.h
  }

  pub fn init_value(&self) -> f64 {
    self.init_value
  }

  /// Rebind the origin used by the next reset. The current run is left untouched.
  pub fn set_init_value(&mut self, init_value: f64) {
    self.init_value = init_value;
  }

  pub fn rng_mut(&mut self) -> &mut R {
    &mut self.rng
  }

  /// Trajectory as an array.
  pub fn path(&self) -> Array1<f64> {
    Array1::from(self.vals.clone())
  }

  /// One Euler step from the current value, without recording it.
  pub fn next_value(&mut self) -> Result<f64> {
    if self.val < 0.0 {
      return Err(SimError::NumericalDomain(format!(
        "Feller step from negative value {}",
        self.val
      )));
    }

    let kick = self.kick.sample(&mut self.rng);
    Ok(self.val + self.val.sqrt() * kick)
  }
}

impl Feller<StdRng> {
  pub fn seeded(init_value: f64, h: f64, seed: u64) -> Result<Self> {
    Self::new(init_value, h, StdRng::seed_from_u64(seed))
  }
}

impl<R: Rng> ProcessExt for Feller<R> {
  type State = f64;

  fn state(&self) -> &f64 {
    &self.val
  }

  fn trajectory(&self) -> &[f64] {
    &self.vals
  }

  fn reset(&mut self) {
    self.val = self.init_value;
    self.vals.clear();
    self.vals.push(self.init_value);
  }

  fn step(&mut self) -> Result<&f64> {
    self.val = self.next_value()?;
    self.vals.push(self.val);
    Ok(&self.val)
  }
}

impl<R: Rng> ExtinctExt for Feller<R> {
  fn extinct(&self) -> bool {
    self.val <= 0.0
  }
}
