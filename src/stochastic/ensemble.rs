//! # Ensemble
//!
//! $$
//! \tau^{(1)},\dots,\tau^{(m)}\ \text{i.i.d. extinction times},\qquad
//! \hat\mu_\tau=\frac1m\sum_k\tau^{(k)}
//! $$
//!
//! Independent runs, one process and one generator per run. Run `k` is seeded with
//! `seed + k`, so results do not depend on how rayon schedules the runs.
//!
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use statrs::statistics::Data;
use statrs::statistics::Median;
use statrs::statistics::Statistics;
use tracing::debug;

use crate::error::Result;
use crate::traits::ExtinctExt;
use crate::traits::ProcessExt;

fn run_rng(seed: u64, k: usize) -> StdRng {
  StdRng::seed_from_u64(seed.wrapping_add(k as u64))
}

/// Extinction times of `m` independent processes built by `build`.
pub fn extinction_times<P, F>(m: usize, seed: u64, build: F) -> Result<Vec<usize>>
where
  P: ExtinctExt,
  F: Fn(StdRng) -> Result<P> + Sync,
{
  debug!(m, seed, "running extinction ensemble");

  (0..m)
    .into_par_iter()
    .map(|k| build(run_rng(seed, k))?.extinct_simulate())
    .collect()
}

/// Like [`extinction_times`], with every run capped at `max_iters` steps.
pub fn extinction_times_bounded<P, F>(
  m: usize,
  seed: u64,
  max_iters: usize,
  build: F,
) -> Result<Vec<Option<usize>>>
where
  P: ExtinctExt,
  F: Fn(StdRng) -> Result<P> + Sync,
{
  debug!(m, seed, max_iters, "running bounded extinction ensemble");

  (0..m)
    .into_par_iter()
    .map(|k| build(run_rng(seed, k))?.extinct_simulate_bounded(max_iters))
    .collect()
}

/// `m` independent trajectories of `iters` steps each.
pub fn simulate_par<P, F>(m: usize, iters: usize, seed: u64, build: F) -> Result<Vec<Vec<P::State>>>
where
  P: ProcessExt,
  P::State: Send,
  F: Fn(StdRng) -> Result<P> + Sync,
{
  (0..m)
    .into_par_iter()
    .map(|k| {
      let mut process = build(run_rng(seed, k))?;
      process.simulate(iters)?;
      Ok(process.trajectory().to_vec())
    })
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtinctionSummary {
  pub count: usize,
  pub mean: f64,
  /// Sample standard deviation, NaN for a single run
  pub std_dev: f64,
  pub median: f64,
  pub min: usize,
  pub max: usize,
}

/// Summary statistics of a set of extinction times, `None` when empty.
pub fn summary(times: &[usize]) -> Option<ExtinctionSummary> {
  let min = Iterator::min(times.iter().copied())?;
  let max = Iterator::max(times.iter().copied())?;
  let xs: Vec<f64> = times.iter().map(|&t| t as f64).collect();

  Some(ExtinctionSummary {
    count: times.len(),
    mean: Statistics::mean(xs.iter()),
    std_dev: Statistics::std_dev(xs.iter()),
    median: Data::new(xs).median(),
    min,
    max,
  })
}
