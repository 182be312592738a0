//! Delay-aware integration of the granule model.
//!
//! The DDE is solved by the method of steps: the time span is cut into
//! chunks no longer than `tau_V`, and each chunk is handed to an ODE solver
//! from `russell_ode`. Inside a chunk every query for `F(t - tau_V)` lands
//! at or before the chunk start, so it is answered from the history already
//! stored. After a chunk the new state and its derivative are appended to
//! the history, which interpolates between samples.
//!
//! Discontinuities propagated by the delays are not tracked; the solver's
//! error control absorbs them within each chunk.

use russell_lab::Vector;
use russell_ode::{Method, OdeSolver, Params, System};

use crate::error::{ModelError, SimulationError};
use crate::forcing::{Constant, SharedForcing, shared};
use crate::history::{InitialHistory, TrajectoryHistory};
use crate::model::GranuleModel;
use crate::state::{N_STATES, State};
use crate::trajectory::Trajectory;

/// Upper bound on the number of chunks (and recorded samples) of one run
pub const MAX_CHUNKS: f64 = 1e8;

/// Solver settings for one run.
#[derive(Debug, Clone)]
pub struct IntegratorConfig {
    /// Runge-Kutta method used inside each chunk
    pub method: Method,
    /// Spacing of the recorded samples (min); chunks never exceed it
    pub output_step: f64,
    /// Absolute tolerance of the adaptive methods
    pub abs_tol: f64,
    /// Relative tolerance of the adaptive methods
    pub rel_tol: f64,
    /// Equal step size inside each chunk, for fixed-step methods such as Rk4
    pub fixed_step: Option<f64>,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            method: Method::DoPri5,
            output_step: 0.1,
            abs_tol: 1e-8,
            rel_tol: 1e-6,
            fixed_step: None,
        }
    }
}

/// Mutable data handed to the solver callback.
///
/// The callback cannot return a typed error, so a model failure is parked
/// here and picked up once the solver returns.
struct RunState {
    history: TrajectoryHistory,
    failure: Option<ModelError>,
}

/// Model, glucose protocol and solver settings of one experiment.
#[derive(Clone)]
pub struct Simulation {
    model: GranuleModel,
    glucose: SharedForcing,
    config: IntegratorConfig,
}

impl Simulation {
    pub fn new(model: GranuleModel, glucose: SharedForcing, config: IntegratorConfig) -> Self {
        Self {
            model,
            glucose,
            config,
        }
    }

    /// Experiment at constant glucose `glucose` (mM)
    pub fn with_constant_glucose(
        model: GranuleModel,
        glucose: f64,
        config: IntegratorConfig,
    ) -> Self {
        Self::new(model, shared(Constant(glucose)), config)
    }

    pub fn model(&self) -> &GranuleModel {
        &self.model
    }

    /// Glucose at time `t` as seen by this experiment
    pub fn glucose(&self, t: f64) -> f64 {
        self.glucose.value(t)
    }

    /// Integrate from `t0` to `t_end` starting at `x0`.
    ///
    /// Values of `F` and `G` before `t0` come from `initial`. The returned
    /// trajectory holds `x0` at `t0` followed by one sample per chunk,
    /// ending exactly at `t_end`.
    pub fn run(
        &self,
        t0: f64,
        t_end: f64,
        x0: State,
        initial: InitialHistory,
    ) -> Result<Trajectory, SimulationError> {
        self.check_run(t0, t_end)?;
        let model = &self.model;
        let tau_v = model.params().tau_V;

        // 1. Right-hand side as seen by the ODE solver
        let system = System::new(
            N_STATES,
            |dxdt: &mut Vector, t: f64, x: &Vector, run: &mut RunState| {
                let state = State::from_array(std::array::from_fn(|i| x[i]));
                match model.derivatives(t, &state, &run.history) {
                    Ok(dx) => {
                        for (i, value) in dx.to_array().into_iter().enumerate() {
                            dxdt[i] = value;
                        }
                        Ok(())
                    }
                    Err(e) => {
                        run.failure = Some(e);
                        Err("granule model derivative failed")
                    }
                }
            },
        );

        // 2. Configure the solver
        let mut params = Params::new(self.config.method.clone());
        params
            .set_tolerances(self.config.abs_tol, self.config.rel_tol, None)
            .map_err(SimulationError::Solver)?;
        let mut solver = OdeSolver::new(params, system).map_err(SimulationError::Solver)?;

        // 3. Initial conditions and history
        let mut run = RunState {
            history: TrajectoryHistory::new(t0, initial, self.glucose.clone()).with_window(tau_v),
            failure: None,
        };
        let dx0 = model.derivatives(t0, &x0, &run.history)?;
        run.history.push(t0, &x0, &dx0);

        let span = t_end - t0;
        let n_chunks = self.chunk_count(span) as usize;
        let h = span / n_chunks as f64;

        let mut trajectory = Trajectory::with_capacity(n_chunks + 1);
        trajectory.push(t0, x0);
        let mut y = Vector::from(&x0.to_array());

        log::info!(
            "Integrating granule model over [{}, {}] min in {} chunks of {:.4} min",
            t0,
            t_end,
            n_chunks,
            h
        );

        // 4. Method of steps
        let mut t = t0;
        for k in 1..=n_chunks {
            let t_next = if k == n_chunks {
                t_end
            } else {
                t0 + k as f64 * h
            };
            solver
                .solve(&mut y, t, t_next, self.config.fixed_step, &mut run)
                .map_err(|msg| match run.failure.take() {
                    Some(e) => SimulationError::Model(e),
                    None => SimulationError::Solver(msg),
                })?;

            let state = State::from_array(std::array::from_fn(|i| y[i]));
            let dx = model.derivatives(t_next, &state, &run.history)?;
            run.history.push(t_next, &state, &dx);
            trajectory.push(t_next, state);

            log::trace!("t = {:.4}: F = {:.6}, gamma = {:.6e}", t_next, state.F, state.gamma);
            t = t_next;
        }

        log::info!("Integration finished with {} samples", trajectory.len());
        Ok(trajectory)
    }

    /// Number of chunks of at most `min(output_step, tau_V)` covering `span`
    fn chunk_count(&self, span: f64) -> f64 {
        let step = self.config.output_step.min(self.model.params().tau_V);
        // tolerance keeps e.g. 2.0 / 0.1 from rounding up to an extra chunk
        (span / step - 1e-9).ceil().max(1.0)
    }

    fn check_run(&self, t0: f64, t_end: f64) -> Result<(), SimulationError> {
        self.model.params().validate()?;
        if !t0.is_finite() || !t_end.is_finite() {
            return Err(SimulationError::InvalidConfig(format!(
                "time span [{}, {}] is not finite",
                t0, t_end
            )));
        }
        if t_end <= t0 {
            return Err(SimulationError::InvalidConfig(format!(
                "end time {} must exceed start time {}",
                t_end, t0
            )));
        }
        let c = &self.config;
        if !(c.output_step.is_finite() && c.output_step > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "output step must be positive, got {}",
                c.output_step
            )));
        }
        let n_chunks = self.chunk_count(t_end - t0);
        if !(n_chunks.is_finite() && n_chunks <= MAX_CHUNKS) {
            return Err(SimulationError::InvalidConfig(format!(
                "span [{}, {}] with output step {} needs {:e} chunks, more than {:e}",
                t0, t_end, c.output_step, n_chunks, MAX_CHUNKS
            )));
        }
        if !(c.abs_tol > 0.0 && c.rel_tol > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "tolerances must be positive, got abs = {}, rel = {}",
                c.abs_tol, c.rel_tol
            )));
        }
        if let Some(step) = c.fixed_step {
            if !(step.is_finite() && step > 0.0) {
                return Err(SimulationError::InvalidConfig(format!(
                    "fixed step must be positive, got {}",
                    step
                )));
            }
        }
        Ok(())
    }
}
