/* Glucose-induced insulin secretion from a beta-cell granule
 trafficking model. Granules form from proinsulin (I) and membrane
 material (V), are primed from the reserve pool (R) onto docking sites
 (D, DIR), fuse with the plasma membrane (F) and are released. Membrane
 comes back to V after a delay, and glucose drives priming after a
 second delay, so the system is a DDE rather than an ODE.

 The cell starts at its basal equilibrium at 5 mM glucose and is then
 exposed to one of the glucose protocols below. The insulin secretion
 rate is ISR = I0 * sigma * F. */

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use beta_cell_granules::{
    Constant, DEFAULT_GRANULE_INSULIN_AMOL, GranuleModel, InitialHistory, IntegratorConfig,
    Parameters, Ramp, SharedForcing, Simulation, SquareWave, StateIndex, Step, Trajectory, shared,
};
use gnuplot::*;

// --- Experiment settings ---

// Basal glucose the cell is equilibrated at (mM).
const BASAL_GLUCOSE: f64 = 5.0;

// Stimulating glucose of the step, ramp and oscillation protocols (mM).
const HIGH_GLUCOSE: f64 = 20.0;

// Time at which the stimulus starts (min).
const STIMULUS_AT: f64 = 10.0;

/// Glucose protocols the driver can run.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Protocol {
    Basal,
    Step,
    Ramp,
    Oscillation,
}

impl Protocol {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "basal" => Ok(Protocol::Basal),
            "step" => Ok(Protocol::Step),
            "ramp" => Ok(Protocol::Ramp),
            "oscillation" => Ok(Protocol::Oscillation),
            other => bail!("unknown protocol '{}' (basal|step|ramp|oscillation)", other),
        }
    }

    fn glucose(self) -> SharedForcing {
        match self {
            Protocol::Basal => shared(Constant(BASAL_GLUCOSE)),
            Protocol::Step => shared(Step {
                before: BASAL_GLUCOSE,
                after: HIGH_GLUCOSE,
                at: STIMULUS_AT,
            }),
            Protocol::Ramp => shared(Ramp {
                from: BASAL_GLUCOSE,
                to: HIGH_GLUCOSE,
                start: STIMULUS_AT,
                end: STIMULUS_AT + 30.0,
            }),
            Protocol::Oscillation => shared(SquareWave {
                low: BASAL_GLUCOSE,
                high: HIGH_GLUCOSE,
                period: 10.0,
                duty: 0.5,
                start: STIMULUS_AT,
            }),
        }
    }
}

/// Command-line options
struct Options {
    protocol: Protocol,
    end_min: f64,
    step_min: f64,
    params_path: Option<PathBuf>,
    plot: bool,
}

fn parse_args() -> Result<Options> {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        protocol: Protocol::Step,
        end_min: 120.0,
        step_min: 0.1,
        params_path: None,
        plot: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--protocol" | "-p" => {
                i += 1;
                let name = args.get(i).context("--protocol needs a value")?;
                options.protocol = Protocol::parse(name)?;
            }
            "--end" | "-e" => {
                i += 1;
                let value = args.get(i).context("--end needs a value")?;
                options.end_min = value.parse().context("--end must be a number")?;
            }
            "--step" | "-s" => {
                i += 1;
                let value = args.get(i).context("--step needs a value")?;
                options.step_min = value.parse().context("--step must be a number")?;
            }
            "--params" => {
                i += 1;
                let value = args.get(i).context("--params needs a file")?;
                options.params_path = Some(PathBuf::from(value));
            }
            "--plot" => options.plot = true,
            other => bail!("unknown argument '{}'", other),
        }
        i += 1;
    }
    Ok(options)
}

/// Non-state readouts printed next to the state.
#[derive(Debug, Clone, Copy)]
struct SecretionReadout {
    glucose: f64,
    isr: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let options = parse_args()?;

    // 1. Parameters and model
    let params = match &options.params_path {
        Some(path) => Parameters::load(path)?,
        None => Parameters::default(),
    };
    let model = GranuleModel::new(params)?;
    log::info!("Protocol: {:?}, span 0-{} min", options.protocol, options.end_min);

    // 2. Basal equilibrium as initial state and history
    let x0 = model.steady_state(BASAL_GLUCOSE)?;
    let history = InitialHistory {
        fused: x0.F,
        glucose: BASAL_GLUCOSE,
    };

    // 3. Integrate
    let config = IntegratorConfig {
        output_step: options.step_min,
        ..Default::default()
    };
    let simulation = Simulation::new(model, options.protocol.glucose(), config);
    let trajectory = simulation.run(0.0, options.end_min, x0, history)?;

    // 4. Post-process and print
    let readouts: Vec<SecretionReadout> = trajectory
        .insulin_secretion_rate(DEFAULT_GRANULE_INSULIN_AMOL, params.sigma)
        .into_iter()
        .map(|(t, isr)| SecretionReadout {
            glucose: simulation.glucose(t),
            isr,
        })
        .collect();

    let header: Vec<&str> = StateIndex::ALL.iter().map(|i| i.label()).collect();
    println!("time, G, {}, ISR", header.join(", "));
    for (sample, readout) in trajectory.samples().iter().zip(&readouts) {
        let s = &sample.state;
        println!(
            "{:.2}, {:.2}, {:.4}, {:.4}, {:.4}, {:.4}, {:.4}, {:.6}, {:.6e}, {:.6}, {:.4}",
            sample.time,
            readout.glucose,
            s.I,
            s.V,
            s.R,
            s.D,
            s.DIR,
            s.F,
            s.gamma,
            s.rho,
            readout.isr
        );
    }

    if options.plot {
        plot(&trajectory, &readouts, options.end_min)?;
    }
    Ok(())
}

/// Secretion on top, priming and fusion rates below.
fn plot(trajectory: &Trajectory, readouts: &[SecretionReadout], end_min: f64) -> Result<()> {
    let t_trace = trajectory.times();
    let mut fg = Figure::new();
    fg.axes2d()
        .set_pos_grid(3, 1, 0)
        .set_x_range(Fix(0.), Fix(end_min))
        .set_y_label("amol/min", &[])
        .lines(&t_trace, readouts.iter().map(|r| r.isr), &[Caption("ISR")]);
    fg.axes2d()
        .set_pos_grid(3, 1, 1)
        .set_x_range(Fix(0.), Fix(end_min))
        .set_y_label("granules", &[])
        .lines(&t_trace, trajectory.component(StateIndex::DIR), &[Caption("DIR")])
        .lines(&t_trace, trajectory.component(StateIndex::D), &[Caption("D")])
        .lines(&t_trace, trajectory.fused(), &[Caption("F")]);
    fg.axes2d()
        .set_pos_grid(3, 1, 2)
        .set_x_range(Fix(0.), Fix(end_min))
        .set_x_label("time (min)", &[])
        .set_y_label("1/min", &[])
        .lines(&t_trace, trajectory.component(StateIndex::Gamma), &[Caption("gamma")])
        .lines(&t_trace, trajectory.component(StateIndex::Rho), &[Caption("rho")]);
    fg.show()
        .map_err(|e| anyhow::anyhow!("gnuplot failed: {:?}", e))?;
    Ok(())
}
