//! # Traits
//!
//! $$
//! \text{lifecycle: } X_0 \xrightarrow{\text{step}} X_1 \xrightarrow{\text{step}} \cdots \xrightarrow{\text{step}} X_k,\quad
//! \tau = \inf\{k : X_k \in \mathcal{E}\}
//! $$
//!
use tracing::debug;
use tracing::warn;

use crate::error::Result;

/// Shared lifecycle of a discretised process: reset to the stored origin, advance one
/// Euler step at a time and record every visited state.
pub trait ProcessExt {
  type State: Clone;

  /// Current value of the process.
  fn state(&self) -> &Self::State;

  /// Recorded states, starting with the origin of the current run.
  fn trajectory(&self) -> &[Self::State];

  /// Rewind the current value and the trajectory to the stored initial value.
  fn reset(&mut self);

  /// Advance one discrete step and append the new state to the trajectory.
  ///
  /// On error the state and the trajectory are left as they were before the call.
  fn step(&mut self) -> Result<&Self::State>;

  /// Number of steps executed since the last reset.
  fn steps(&self) -> usize {
    self.trajectory().len().saturating_sub(1)
  }

  /// Reset, then run exactly `iters` steps.
  fn simulate(&mut self, iters: usize) -> Result<()> {
    self.reset();

    for i in 0..iters {
      if let Err(err) = self.step() {
        warn!(step = i, %err, "simulation stopped");
        return Err(err);
      }
    }

    debug!(iters, "simulation finished");
    Ok(())
  }
}

/// Processes with an absorbing "extinction" region that ends a run.
pub trait ExtinctExt: ProcessExt {
  /// Whether the current state lies in the extinction region.
  fn extinct(&self) -> bool;

  /// Prepare a run until extinction. Defaults to [`ProcessExt::reset`].
  fn reset_for_extinction(&mut self) -> Result<()> {
    self.reset();
    Ok(())
  }

  /// Reset, then step until [`ExtinctExt::extinct`] holds and return the number of
  /// steps taken. The predicate is checked before every step, so no step is attempted
  /// from an extinct state.
  ///
  /// There is no upper bound on the number of steps; see
  /// [`ExtinctExt::extinct_simulate_bounded`].
  fn extinct_simulate(&mut self) -> Result<usize> {
    self.reset_for_extinction()?;

    let mut iters = 0;
    while !self.extinct() {
      if let Err(err) = self.step() {
        warn!(step = iters, %err, "extinction run stopped");
        return Err(err);
      }
      iters += 1;
    }

    debug!(iters, "process extinct");
    Ok(iters)
  }

  /// Like [`ExtinctExt::extinct_simulate`] but gives up after `max_iters` steps,
  /// returning `None` if the process did not go extinct by then.
  fn extinct_simulate_bounded(&mut self, max_iters: usize) -> Result<Option<usize>> {
    self.reset_for_extinction()?;

    let mut iters = 0;
    while !self.extinct() {
      if iters == max_iters {
        warn!(max_iters, "no extinction within iteration cap");
        return Ok(None);
      }
      if let Err(err) = self.step() {
        warn!(step = iters, %err, "extinction run stopped");
        return Err(err);
      }
      iters += 1;
    }

    debug!(iters, "process extinct");
    Ok(Some(iters))
  }
}
