//! Beta-cell granule trafficking and insulin secretion as a delay
//! differential equation.
//!
//! Eight pools and rate coefficients (`I, V, R, D, DIR, F, gamma, rho`) are
//! driven by a glucose profile `G(t)` and an optional perturbation `psi(t)`.
//! [`GranuleModel::derivatives`] is the right-hand side; it reads delayed
//! values through [`DelayHistory`]. [`Simulation`] integrates it and returns
//! a [`Trajectory`] from which the insulin secretion rate is derived.

// Field names follow the model notation (I, V, DIR, CT, G_star, ...).
#![allow(non_snake_case)]

pub mod activation;
pub mod error;
pub mod forcing;
pub mod history;
pub mod integrator;
pub mod model;
pub mod params;
pub mod state;
pub mod trajectory;

pub use activation::{glucose_fraction, h_gamma, h_rho};
pub use error::{ConfigError, ModelError, SimulationError};
pub use forcing::{Constant, Forcing, Ramp, SharedForcing, SquareWave, Step, Zero, shared};
pub use history::{ConstantHistory, DelayHistory, Delayed, InitialHistory, TrajectoryHistory};
pub use integrator::{IntegratorConfig, MAX_CHUNKS, Simulation};
pub use model::GranuleModel;
pub use params::Parameters;
pub use state::{N_STATES, State, StateIndex};
pub use trajectory::{DEFAULT_GRANULE_INSULIN_AMOL, Sample, Trajectory};
