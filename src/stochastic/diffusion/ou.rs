use ndarray::Array1;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rand_distr::Distribution;
use rand_distr::Normal;

use crate::error::check_step_size;
use crate::error::Result;
use crate::error::SimError;
use crate::traits::ProcessExt;

/// Ornstein-Uhlenbeck (OU) process reverting to zero
/// dX_t = -a X_t dt + dW_t
///
/// The process has no absorbing boundary, so it only runs for a fixed number of steps.
pub struct OU<R: Rng = StdRng> {
  h: f64,
  a: f64,
  init_value: f64,
  val: f64,
  vals: Vec<f64>,
  kick: Normal<f64>,
  rng: R,
}

impl<R: Rng> OU<R> {
  /// Create a new Ornstein-Uhlenbeck (OU) process
  pub fn new(init_value: f64, h: f64, a: f64, rng: R) -> Result<Self> {
    check_step_size(h)?;
    if !a.is_finite() {
      return Err(SimError::InvalidParameter(format!(
        "drift factor must be finite, got {a}"
      )));
    }
    let kick = Normal::new(0.0, h.sqrt())
      .map_err(|err| SimError::InvalidParameter(format!("step size {h}: {err}")))?;

    Ok(Self {
      h,
      a,
      init_value,
      val: init_value,
      vals: vec![init_value],
      kick,
      rng,
    })
  }

  pub fn h(&self) -> f64 {
    self.h
  }

  /// Drift factor
  pub fn a(&self) -> f64 {
    self.a
  }

  pub fn init_value(&self) -> f64 {
    self.init_value
  }

  pub fn set_init_value(&mut self, init_value: f64) {
    self.init_value = init_value;
  }

  pub fn rng_mut(&mut self) -> &mut R {
    &mut self.rng
  }

  pub fn path(&self) -> Array1<f64> {
    Array1::from(self.vals.clone())
  }

  pub fn next_value(&mut self) -> f64 {
    // sqrt(h) N(0, 1), so the kick has variance h
    let kick = self.kick.sample(&mut self.rng);
    self.val - self.a * self.val * self.h + kick
  }
}

impl OU<StdRng> {
  pub fn seeded(init_value: f64, h: f64, a: f64, seed: u64) -> Result<Self> {
    Self::new(init_value, h, a, StdRng::seed_from_u64(seed))
  }
}

impl<R: Rng> ProcessExt for OU<R> {
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
    self.val = self.next_value();
    self.vals.push(self.val);
    Ok(&self.val)
  }
}
