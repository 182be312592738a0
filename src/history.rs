//! Delay history: how the derivative function sees the past.
//!
//! The model needs `F(t - tau_V)` and `G(t - tau_G)`. It asks for them
//! through [`DelayHistory`], so it can be evaluated against a fixed history
//! in tests and against the growing trajectory inside the integrator.

use crate::forcing::SharedForcing;
use crate::state::{N_STATES, State, StateIndex};

/// Quantities the model reads at a lag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delayed {
    /// Fused granules `F`, lagged by `tau_V`
    Fused,
    /// Glucose input `G`, lagged by `tau_G`
    Glucose,
}

/// Read access to past values of delayed quantities.
///
/// Implementations must
/// - answer any `time` up to the current integration time, interpolating
///   between stored samples;
/// - return the constant initial-history value for times before the start;
/// - return the same value for the same query once the trajectory has moved
///   past it.
pub trait DelayHistory {
    fn value_at(&self, quantity: Delayed, time: f64) -> f64;
}

/// Constant values for times before the simulation start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialHistory {
    pub fused: f64,
    pub glucose: f64,
}

/// History that returns the same values at every time.
///
/// Used to evaluate the model at a single point, e.g. at an equilibrium.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantHistory {
    pub fused: f64,
    pub glucose: f64,
}

impl DelayHistory for ConstantHistory {
    fn value_at(&self, quantity: Delayed, _time: f64) -> f64 {
        match quantity {
            Delayed::Fused => self.fused,
            Delayed::Glucose => self.glucose,
        }
    }
}

impl From<InitialHistory> for ConstantHistory {
    fn from(h: InitialHistory) -> Self {
        Self {
            fused: h.fused,
            glucose: h.glucose,
        }
    }
}

/// Stored sample with its derivative, for Hermite interpolation.
#[derive(Debug, Clone, Copy)]
struct Node {
    time: f64,
    state: [f64; N_STATES],
    slope: [f64; N_STATES],
}

/// Append-only history built by the integrator.
///
/// Samples must be pushed in strictly increasing time order. Between two
/// samples a component is interpolated with the cubic Hermite polynomial
/// matching both values and both derivatives; queries past the last sample
/// are held at the last value.
///
/// Without a window every sample is kept. With [`TrajectoryHistory::with_window`]
/// only samples covering the last `window` minutes are kept, plus the one
/// sample just before them, so queries older than that window read the
/// oldest kept sample.
pub struct TrajectoryHistory {
    t0: f64,
    initial: InitialHistory,
    glucose: SharedForcing,
    nodes: Vec<Node>,
    window: Option<f64>,
}

impl TrajectoryHistory {
    pub fn new(t0: f64, initial: InitialHistory, glucose: SharedForcing) -> Self {
        Self {
            t0,
            initial,
            glucose,
            nodes: Vec::new(),
            window: None,
        }
    }

    /// Keep only the samples needed to answer lags up to `window`
    pub fn with_window(mut self, window: f64) -> Self {
        self.window = Some(window);
        self
    }

    /// Time of the most recent sample, or the start time if empty
    pub fn last_time(&self) -> f64 {
        self.nodes.last().map_or(self.t0, |n| n.time)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a sample. Samples at or before the last stored time are ignored.
    pub fn push(&mut self, time: f64, state: &State, derivative: &State) -> bool {
        if !self.nodes.is_empty() && time <= self.last_time() {
            log::warn!(
                "Ignoring history sample at t = {} (last sample at t = {})",
                time,
                self.last_time()
            );
            return false;
        }
        self.nodes.push(Node {
            time,
            state: state.to_array(),
            slope: derivative.to_array(),
        });
        self.prune();
        true
    }

    fn prune(&mut self) {
        let Some(window) = self.window else {
            return;
        };
        let horizon = self.last_time() - window;
        // the last node at or before the horizon still brackets it
        let keep_from = self
            .nodes
            .partition_point(|n| n.time <= horizon)
            .saturating_sub(1);
        if keep_from > 0 {
            self.nodes.drain(..keep_from);
        }
    }

    /// Interpolated value of state component `index` at `time`
    pub fn component_at(&self, index: usize, time: f64) -> Option<f64> {
        let first = self.nodes.first()?;
        let last = self.nodes.last()?;
        if time <= first.time {
            return Some(first.state[index]);
        }
        if time >= last.time {
            return Some(last.state[index]);
        }
        // nodes[pos - 1].time < time <= nodes[pos].time
        let pos = self.nodes.partition_point(|n| n.time < time);
        let right = &self.nodes[pos];
        if right.time == time {
            return Some(right.state[index]);
        }
        let left = &self.nodes[pos - 1];
        Some(hermite(left, right, index, time))
    }

    fn fused_at(&self, time: f64) -> f64 {
        if time < self.t0 {
            return self.initial.fused;
        }
        self.component_at(StateIndex::F as usize, time)
            .unwrap_or(self.initial.fused)
    }

    fn glucose_at(&self, time: f64) -> f64 {
        if time < self.t0 {
            self.initial.glucose
        } else {
            self.glucose.value(time)
        }
    }
}

impl DelayHistory for TrajectoryHistory {
    fn value_at(&self, quantity: Delayed, time: f64) -> f64 {
        match quantity {
            Delayed::Fused => self.fused_at(time),
            Delayed::Glucose => self.glucose_at(time),
        }
    }
}

fn hermite(left: &Node, right: &Node, index: usize, time: f64) -> f64 {
    let h = right.time - left.time;
    let s = (time - left.time) / h;
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    h00 * left.state[index]
        + h10 * h * left.slope[index]
        + h01 * right.state[index]
        + h11 * h * right.slope[index]
}
