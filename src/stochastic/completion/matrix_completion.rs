use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rand_distr::Distribution;

use crate::distributions::MultivariateNormal;
use crate::error::check_step_size;
use crate::error::Result;
use crate::error::SimError;
use crate::stochastic::covariance::residual_sqrt;
use crate::stochastic::covariance::Beta;
use crate::traits::ExtinctExt;
use crate::traits::ProcessExt;

/// Vector matrix-completion process
/// dX_t = (h P_beta(sqrt(1 - X_t^2)))^{1/2} dW_t
///
/// Each coordinate lives in `(-1, 1)`; the noise on a coordinate vanishes as it
/// approaches the boundary and the process is extinct once any `|X_i| >= 1`.
pub struct MatrixCompletion<R: Rng = StdRng> {
  h: f64,
  beta: Beta,
  n: usize,
  init_value: Array1<f64>,
  val: Array1<f64>,
  vals: Vec<Array1<f64>>,
  rng: R,
}

impl<R: Rng> MatrixCompletion<R> {
  /// `beta` must be exactly `0.0` or `f64::INFINITY`.
  pub fn new(init_value: Array1<f64>, h: f64, beta: f64, rng: R) -> Result<Self> {
    let beta = Beta::try_from(beta)?;
    check_step_size(h)?;
    if init_value.is_empty() {
      return Err(SimError::InvalidParameter(
        "initial value must have at least one coordinate".into(),
      ));
    }

    Ok(Self {
      h,
      beta,
      n: init_value.len(),
      val: init_value.clone(),
      vals: vec![init_value.clone()],
      init_value,
      rng,
    })
  }

  pub fn n(&self) -> usize {
    self.n
  }

  pub fn h(&self) -> f64 {
    self.h
  }

  pub fn beta(&self) -> Beta {
    self.beta
  }

  pub fn init_value(&self) -> &Array1<f64> {
    &self.init_value
  }

  /// Rebind the origin used by the next reset; the dimension is fixed.
  pub fn set_init_value(&mut self, init_value: Array1<f64>) -> Result<()> {
    if init_value.len() != self.n {
      return Err(SimError::InvalidParameter(format!(
        "initial value has {} coordinates, process has {}",
        init_value.len(),
        self.n
      )));
    }

    self.init_value = init_value;
    Ok(())
  }

  pub fn rng_mut(&mut self) -> &mut R {
    &mut self.rng
  }

  /// Trajectory with one row per recorded state.
  pub fn path(&self) -> Array2<f64> {
    Array2::from_shape_fn((self.vals.len(), self.n), |(i, j)| self.vals[i][j])
  }

  /// `1 - X^2`, componentwise.
  pub fn calc_residual(&self) -> Array1<f64> {
    self.val.mapv(|x| 1.0 - x * x)
  }

  /// Draw from `N(0, h P_beta(sqrt(residual)))`.
  pub fn get_noise(&mut self, residual: &Array1<f64>) -> Result<Array1<f64>> {
    let r = residual_sqrt(residual)?;
    let cov = self.beta.covariance(r.view()) * self.h;
    let mvn = MultivariateNormal::centered(&cov)?;
    Ok(mvn.sample(&mut self.rng))
  }

  /// Whether `val` has a coordinate of magnitude at least one.
  pub fn is_extinct(val: ArrayView1<f64>) -> bool {
    val.iter().any(|v| v.abs() >= 1.0)
  }
}

impl MatrixCompletion<StdRng> {
  pub fn seeded(init_value: Array1<f64>, h: f64, beta: f64, seed: u64) -> Result<Self> {
    Self::new(init_value, h, beta, StdRng::seed_from_u64(seed))
  }
}

impl<R: Rng> ProcessExt for MatrixCompletion<R> {
  type State = Array1<f64>;

  fn state(&self) -> &Array1<f64> {
    &self.val
  }

  fn trajectory(&self) -> &[Array1<f64>] {
    &self.vals
  }

  fn reset(&mut self) {
    self.val = self.init_value.clone();
    self.vals.clear();
    self.vals.push(self.init_value.clone());
  }

  fn step(&mut self) -> Result<&Array1<f64>> {
    let residual = self.calc_residual();
    let noise = self.get_noise(&residual)?;
    self.val = &self.val + &noise;
    self.vals.push(self.val.clone());
    Ok(&self.val)
  }
}

impl<R: Rng> ExtinctExt for MatrixCompletion<R> {
  fn extinct(&self) -> bool {
    Self::is_extinct(self.val.view())
  }
}
