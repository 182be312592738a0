//! Time-dependent forcing signals: the glucose profile G(t) and the
//! oscillatory perturbation psi(t).
//!
//! Any `Fn(f64) -> f64` closure is a forcing; the structs below cover the
//! protocols the experiments use.

use std::sync::Arc;

/// Scalar signal of time (minutes).
pub trait Forcing: Send + Sync {
    /// Value of the signal at time `t`
    fn value(&self, t: f64) -> f64;
}

impl<F> Forcing for F
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn value(&self, t: f64) -> f64 {
        self(t)
    }
}

/// Shared handle to a forcing, cheap to clone across runs.
pub type SharedForcing = Arc<dyn Forcing>;

/// Identically zero signal, the default psi(t).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Zero;

impl Forcing for Zero {
    fn value(&self, _t: f64) -> f64 {
        0.0
    }
}

/// Constant signal, the default glucose profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant(pub f64);

impl Forcing for Constant {
    fn value(&self, _t: f64) -> f64 {
        self.0
    }
}

/// Single step from `before` to `after` at time `at`.
///
/// The new level applies from `at` onwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub before: f64,
    pub after: f64,
    pub at: f64,
}

impl Forcing for Step {
    fn value(&self, t: f64) -> f64 {
        if t < self.at { self.before } else { self.after }
    }
}

/// Linear ramp from `from` at `start` to `to` at `end`, held constant outside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    pub from: f64,
    pub to: f64,
    pub start: f64,
    pub end: f64,
}

impl Forcing for Ramp {
    fn value(&self, t: f64) -> f64 {
        if t <= self.start {
            self.from
        } else if t >= self.end {
            self.to
        } else {
            self.from + (self.to - self.from) * (t - self.start) / (self.end - self.start)
        }
    }
}

/// Square wave switching between `low` and `high`, starting at `start`.
///
/// Each period begins with `duty · period` minutes at `high`. Before `start`
/// the signal sits at `low`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareWave {
    pub low: f64,
    pub high: f64,
    pub period: f64,
    pub duty: f64,
    pub start: f64,
}

impl Forcing for SquareWave {
    fn value(&self, t: f64) -> f64 {
        if t < self.start || self.period <= 0.0 {
            return self.low;
        }
        let phase = (t - self.start).rem_euclid(self.period);
        if phase < self.duty * self.period {
            self.high
        } else {
            self.low
        }
    }
}

/// Wrap any forcing into a shared handle
pub fn shared<F: Forcing + 'static>(forcing: F) -> SharedForcing {
    Arc::new(forcing)
}
