//! Sampled solution of a run and insulin secretion post-processing.

use serde::{Deserialize, Serialize};

use crate::state::{State, StateIndex};

/// Insulin content of one granule (amol).
pub const DEFAULT_GRANULE_INSULIN_AMOL: f64 = 1.6;

/// State at one output time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Time (min)
    pub time: f64,
    pub state: State,
}

/// Ordered samples of one run, owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    samples: Vec<Sample>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            samples: Vec::with_capacity(n),
        }
    }

    pub(crate) fn push(&mut self, time: f64, state: State) {
        self.samples.push(Sample { time, state });
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    /// One component over the whole run
    pub fn component(&self, index: StateIndex) -> Vec<f64> {
        self.samples.iter().map(|s| s.state.get(index)).collect()
    }

    /// Raw fused-granule trajectory F(t)
    pub fn fused(&self) -> Vec<f64> {
        self.component(StateIndex::F)
    }

    /// Latest sample at or before `time`
    pub fn sample_at(&self, time: f64) -> Option<&Sample> {
        let pos = self.samples.partition_point(|s| s.time <= time);
        pos.checked_sub(1).map(|i| &self.samples[i])
    }

    /// Insulin secretion rate `ISR(t) = i0 · sigma · F(t)` (amol/min).
    ///
    /// `i0` is the insulin content of one granule and `sigma` the release
    /// rate of fused granules.
    pub fn insulin_secretion_rate(&self, i0: f64, sigma: f64) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .map(|s| (s.time, i0 * sigma * s.state.F))
            .collect()
    }
}
