use ndarray::Array1;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rand_distr::Distribution;
use tracing::debug;

use crate::distributions::MultivariateNormal;
use crate::error::check_step_size;
use crate::error::Result;
use crate::error::SimError;
use crate::stochastic::covariance::residual_sqrt;
use crate::stochastic::covariance::Beta;
use crate::stochastic::matrix::random_matrix_wishart;
use crate::stochastic::matrix::rescale;
use crate::stochastic::DEFAULT_MAX_SINGULAR_VALUE;
use crate::traits::ExtinctExt;
use crate::traits::ProcessExt;

/// Filtered matrix process.
///
/// Couples a symmetric filter `L` and a vector `v`:
///
/// ```text
/// P   = P_beta(sqrt(1 - diag(L)))
/// v  <- v + sqrt(h) L N(0, P)
/// L  <- L + h L P L
/// ```
///
/// Both updates use the `P` of the pre-step filter. `L` is started from a Wishart
/// matrix rescaled to spectral norm 1/2, and `v` from `N(0, L)`. The process is extinct
/// once a diagonal entry of `L` exceeds one in magnitude.
///
/// Symmetry of `L` is not re-imposed after an update.
///
/// In dimension one the filter converges to 1 from below without crossing it, so a
/// run until extinction does not terminate; use
/// [`ExtinctExt::extinct_simulate_bounded`] there.
pub struct FilteredMatrixProcess<R: Rng = StdRng> {
  n: usize,
  p: usize,
  h: f64,
  beta: Beta,
  init_l: Array2<f64>,
  init_v: Array1<f64>,
  l: Array2<f64>,
  v: Array1<f64>,
  vals: Vec<Array1<f64>>,
  diagonals: Vec<Array1<f64>>,
  rng: R,
}

impl<R: Rng> FilteredMatrixProcess<R> {
  /// `beta` must be exactly `0.0` or `f64::INFINITY`.
  pub fn new(n: usize, p: usize, h: f64, beta: f64, mut rng: R) -> Result<Self> {
    let beta = Beta::try_from(beta)?;
    check_step_size(h)?;
    if n == 0 || p == 0 {
      return Err(SimError::InvalidParameter(format!(
        "dimension and rank must be positive, got n = {n}, p = {p}"
      )));
    }

    let (init_l, init_v) = draw_initial_state(n, p, &mut rng)?;
    let diagonal = init_l.diag().to_owned();

    Ok(Self {
      n,
      p,
      h,
      beta,
      l: init_l.clone(),
      v: init_v.clone(),
      vals: vec![init_v.clone()],
      diagonals: vec![diagonal],
      init_l,
      init_v,
      rng,
    })
  }

  /// Dimension
  pub fn n(&self) -> usize {
    self.n
  }

  /// Rank of the Wishart draw used for initial filters
  pub fn p(&self) -> usize {
    self.p
  }

  pub fn h(&self) -> f64 {
    self.h
  }

  pub fn beta(&self) -> Beta {
    self.beta
  }

  /// Current filter.
  pub fn filter(&self) -> &Array2<f64> {
    &self.l
  }

  pub fn init_filter(&self) -> &Array2<f64> {
    &self.init_l
  }

  pub fn init_v(&self) -> &Array1<f64> {
    &self.init_v
  }

  /// Diagonal of the filter at every recorded state, aligned with the trajectory.
  pub fn diagonals(&self) -> &[Array1<f64>] {
    &self.diagonals
  }

  pub fn rng_mut(&mut self) -> &mut R {
    &mut self.rng
  }

  /// Trajectory of `v` with one row per recorded state.
  pub fn path(&self) -> Array2<f64> {
    Array2::from_shape_fn((self.vals.len(), self.n), |(i, j)| self.vals[i][j])
  }

  /// Rebind the origin used by [`ProcessExt::reset`].
  pub fn set_init_state(&mut self, init_l: Array2<f64>, init_v: Array1<f64>) -> Result<()> {
    if init_l.dim() != (self.n, self.n) || init_v.len() != self.n {
      return Err(SimError::InvalidParameter(format!(
        "initial state of shape {:?} / {} does not match dimension {}",
        init_l.dim(),
        init_v.len(),
        self.n
      )));
    }

    self.init_l = init_l;
    self.init_v = init_v;
    Ok(())
  }

  /// Draw a fresh Wishart-based origin, store it and reset to it.
  pub fn reinitialize(&mut self) -> Result<()> {
    let (init_l, init_v) = draw_initial_state(self.n, self.p, &mut self.rng)?;
    self.init_l = init_l;
    self.init_v = init_v;
    self.reset();
    Ok(())
  }

  /// `1 - diag(L)`.
  pub fn calc_l_residual(&self) -> Array1<f64> {
    self.l.diag().mapv(|x| 1.0 - x)
  }

  /// `P_beta` of the current filter.
  pub fn current_p_beta(&self) -> Result<Array2<f64>> {
    let r = residual_sqrt(&self.calc_l_residual())?;
    Ok(self.beta.covariance(r.view()))
  }

  /// `v <- v + sqrt(h) L N(0, P)`, appended to the trajectory. Must be followed by
  /// [`Self::step_l`] with the same `P` to keep the diagonals aligned.
  pub(crate) fn step_v(&mut self, p_beta: &Array2<f64>) -> Result<()> {
    let noise = MultivariateNormal::centered(p_beta)?.sample(&mut self.rng);
    self.v = &self.v + &(self.l.dot(&noise) * self.h.sqrt());
    self.vals.push(self.v.clone());
    Ok(())
  }

  /// `L <- L + h L P L`; records the new diagonal.
  pub(crate) fn step_l(&mut self, p_beta: &Array2<f64>) {
    let lpl = self.l.dot(p_beta).dot(&self.l);
    self.l = &self.l + &(lpl * self.h);
    self.diagonals.push(self.l.diag().to_owned());
  }

  fn reset_to(&mut self, l: Array2<f64>, v: Array1<f64>) {
    self.diagonals.clear();
    self.diagonals.push(l.diag().to_owned());
    self.vals.clear();
    self.vals.push(v.clone());
    self.l = l;
    self.v = v;
  }
}

impl FilteredMatrixProcess<StdRng> {
  pub fn seeded(n: usize, p: usize, h: f64, beta: f64, seed: u64) -> Result<Self> {
    Self::new(n, p, h, beta, StdRng::seed_from_u64(seed))
  }
}

fn draw_initial_state<R: Rng + ?Sized>(
  n: usize,
  p: usize,
  rng: &mut R,
) -> Result<(Array2<f64>, Array1<f64>)> {
  let l = rescale(&random_matrix_wishart(n, p, rng), DEFAULT_MAX_SINGULAR_VALUE)?;
  let v = MultivariateNormal::centered(&l)?.sample(rng);
  Ok((l, v))
}

impl<R: Rng> ProcessExt for FilteredMatrixProcess<R> {
  type State = Array1<f64>;

  fn state(&self) -> &Array1<f64> {
    &self.v
  }

  fn trajectory(&self) -> &[Array1<f64>] {
    &self.vals
  }

  fn reset(&mut self) {
    self.reset_to(self.init_l.clone(), self.init_v.clone());
  }

  fn step(&mut self) -> Result<&Array1<f64>> {
    let p_beta = self.current_p_beta()?;
    self.step_v(&p_beta)?;
    self.step_l(&p_beta);
    Ok(&self.v)
  }
}

impl<R: Rng> ExtinctExt for FilteredMatrixProcess<R> {
  fn extinct(&self) -> bool {
    self.l.diag().iter().any(|d| d.abs() > 1.0)
  }

  /// A run until extinction starts from a freshly drawn filter and vector. The stored
  /// origin is kept, so a later [`ProcessExt::simulate`] still replays it.
  fn reset_for_extinction(&mut self) -> Result<()> {
    let (l, v) = draw_initial_state(self.n, self.p, &mut self.rng)?;
    debug!(n = self.n, p = self.p, "redrew filter for extinction run");
    self.reset_to(l, v);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;
  use tracing_test::traced_test;

  use super::*;
  use crate::stochastic::matrix::largest_singular_value;

  const CAP: usize = 100_000;

  #[test]
  fn initial_filter_has_spectral_norm_one_half() {
    let fmp = FilteredMatrixProcess::seeded(8, 3, 0.1, 0.0, 1).unwrap();

    assert_abs_diff_eq!(largest_singular_value(fmp.filter()), 0.5, epsilon = 1e-9);
    assert_eq!(fmp.trajectory().len(), 1);
    assert_eq!(fmp.state(), fmp.init_v());
    assert!(!fmp.extinct());
  }

  #[test]
  fn rejects_bad_parameters() {
    assert!(matches!(
      FilteredMatrixProcess::seeded(4, 2, 0.1, 3.0, 1),
      Err(SimError::UnsupportedParameter { .. })
    ));
    assert!(matches!(
      FilteredMatrixProcess::seeded(0, 2, 0.1, 0.0, 1),
      Err(SimError::InvalidParameter(_))
    ));
    assert!(matches!(
      FilteredMatrixProcess::seeded(4, 0, 0.1, 0.0, 1),
      Err(SimError::InvalidParameter(_))
    ));
  }

  #[test]
  fn step_uses_pre_step_filter_for_both_updates() {
    let mut fmp = FilteredMatrixProcess::seeded(4, 2, 0.1, f64::INFINITY, 2).unwrap();
    let l0 = fmp.filter().clone();
    let p0 = fmp.current_p_beta().unwrap();

    fmp.step().unwrap();

    let expected = &l0 + &(l0.dot(&p0).dot(&l0) * 0.1);
    for (a, b) in fmp.filter().iter().zip(expected.iter()) {
      assert_abs_diff_eq!(a, b, epsilon = 1e-12);
    }
    assert_eq!(fmp.trajectory().len(), 2);
    assert_eq!(fmp.diagonals().len(), 2);
  }

  #[test]
  fn vector_update_uses_pre_step_filter() {
    for beta in [0.0, f64::INFINITY] {
      let mut fmp = FilteredMatrixProcess::seeded(4, 2, 0.1, beta, 10).unwrap();
      let l0 = fmp.filter().clone();
      let v0 = fmp.state().clone();
      let p0 = fmp.current_p_beta().unwrap();

      // same generator state as the step itself
      let mut rng = fmp.rng_mut().clone();
      let noise = MultivariateNormal::centered(&p0).unwrap().sample(&mut rng);

      fmp.step().unwrap();

      let expected = &v0 + &(l0.dot(&noise) * 0.1_f64.sqrt());
      for (a, b) in fmp.state().iter().zip(expected.iter()) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-12);
      }
    }
  }

  #[test]
  fn infinite_beta_moves_v_along_pre_step_direction() {
    let mut fmp = FilteredMatrixProcess::seeded(4, 2, 0.1, f64::INFINITY, 11).unwrap();
    let l0 = fmp.filter().clone();
    let v0 = fmp.state().clone();
    let r0 = residual_sqrt(&fmp.calc_l_residual()).unwrap();

    fmp.step().unwrap();

    let d = fmp.state() - &v0;
    let u = l0.dot(&r0) * 0.1_f64.sqrt();
    let r1 = residual_sqrt(&fmp.calc_l_residual()).unwrap();
    let w = fmp.filter().dot(&r1);
    let scale = d.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    assert!(scale > 1e-8);

    let off_line = |dir: &Array1<f64>| {
      let k = (0..dir.len())
        .max_by(|&i, &j| dir[i].abs().total_cmp(&dir[j].abs()))
        .unwrap();
      let c = d[k] / dir[k];
      d.iter()
        .zip(dir.iter())
        .fold(0.0_f64, |acc, (x, y)| acc.max((x - c * y).abs()))
    };

    assert!(off_line(&u) <= 1e-9 * scale);
    assert!(off_line(&w) > 1e-6 * scale);
  }

  #[test]
  fn parameters_are_kept_from_construction() {
    let mut fmp = FilteredMatrixProcess::seeded(4, 2, 0.05, 0.0, 12).unwrap();
    fmp.simulate(3).unwrap();
    fmp.reinitialize().unwrap();

    assert_eq!(fmp.n(), 4);
    assert_eq!(fmp.p(), 2);
    assert_eq!(fmp.h(), 0.05);
    assert_eq!(fmp.beta(), Beta::Zero);
    assert_eq!(fmp.path().dim(), (1, 4));
  }

  #[test]
  fn diagonals_stay_aligned_with_trajectory() {
    let mut fmp = FilteredMatrixProcess::seeded(3, 2, 0.01, f64::INFINITY, 13).unwrap();
    fmp.simulate(7).unwrap();
    assert_eq!(fmp.diagonals().len(), fmp.trajectory().len());

    fmp.step().unwrap();
    assert_eq!(fmp.diagonals().len(), 9);
    assert_eq!(fmp.trajectory().len(), 9);
    assert_eq!(fmp.diagonals()[8], fmp.filter().diag().to_owned());
  }

  #[test]
  fn filter_diagonal_never_decreases() {
    let mut fmp = FilteredMatrixProcess::seeded(5, 2, 0.01, 0.0, 3).unwrap();
    fmp.simulate(10).unwrap();

    let diags = fmp.diagonals();
    assert_eq!(diags.len(), 11);
    for w in diags.windows(2) {
      for (a, b) in w[0].iter().zip(w[1].iter()) {
        assert!(b >= a);
      }
    }
  }

  #[test]
  fn extinct_run_ends_on_first_extinct_filter() {
    for beta in [0.0, f64::INFINITY] {
      let mut fmp = FilteredMatrixProcess::seeded(5, 2, 0.1, beta, 4).unwrap();
      let iters = fmp
        .extinct_simulate_bounded(CAP)
        .unwrap()
        .expect("5-dimensional filter goes extinct");

      assert_eq!(fmp.trajectory().len(), iters + 1);
      assert_eq!(fmp.diagonals().len(), iters + 1);
      assert!(fmp.extinct());
      assert!(fmp.diagonals()[..iters]
        .iter()
        .all(|d| d.iter().all(|x| x.abs() <= 1.0)));
    }
  }

  #[test]
  fn extinct_run_redraws_but_keeps_stored_origin() {
    let mut fmp = FilteredMatrixProcess::seeded(5, 2, 0.1, 0.0, 5).unwrap();
    let init_l = fmp.init_filter().clone();
    let init_v = fmp.init_v().clone();

    fmp.extinct_simulate_bounded(CAP).unwrap();
    assert_ne!(&fmp.trajectory()[0], &init_v);
    assert_eq!(fmp.init_filter(), &init_l);

    fmp.simulate(3).unwrap();
    assert_eq!(&fmp.trajectory()[0], &init_v);
  }

  #[test]
  #[traced_test]
  fn one_dimensional_filter_never_crosses() {
    let mut fmp = FilteredMatrixProcess::seeded(1, 1, 0.1, 0.0, 6).unwrap();

    assert_eq!(fmp.extinct_simulate_bounded(2_000).unwrap(), None);
    assert_eq!(fmp.trajectory().len(), 2_001);
    assert!(fmp.filter()[[0, 0]] <= 1.0);
    assert!(logs_contain("no extinction within iteration cap"));
  }

  #[test]
  fn reinitialize_replaces_stored_origin() {
    let mut fmp = FilteredMatrixProcess::seeded(3, 3, 0.1, 0.0, 7).unwrap();
    let old = fmp.init_filter().clone();

    fmp.reinitialize().unwrap();

    assert_ne!(fmp.init_filter(), &old);
    assert_eq!(fmp.filter(), fmp.init_filter());
    assert_eq!(fmp.trajectory().len(), 1);
  }

  #[test]
  fn set_init_state_checks_shape() {
    let mut fmp = FilteredMatrixProcess::seeded(2, 1, 0.1, 0.0, 8).unwrap();

    assert!(fmp
      .set_init_state(Array2::eye(3) * 0.1, array![0.0, 0.0])
      .is_err());

    fmp
      .set_init_state(Array2::eye(2) * 0.1, array![0.3, -0.3])
      .unwrap();
    fmp.simulate(0).unwrap();
    assert_eq!(fmp.state(), &array![0.3, -0.3]);
    assert_eq!(fmp.calc_l_residual(), array![0.9, 0.9]);
  }

  #[test]
  fn stepping_a_filter_past_one_is_domain_error() {
    let mut fmp = FilteredMatrixProcess::seeded(2, 1, 0.1, 0.0, 9).unwrap();
    fmp
      .set_init_state(Array2::eye(2) * 1.5, array![0.0, 0.0])
      .unwrap();
    fmp.reset();

    assert!(fmp.extinct());
    assert!(matches!(fmp.step(), Err(SimError::NumericalDomain(_))));
    assert_eq!(fmp.trajectory().len(), 1);
  }
}
