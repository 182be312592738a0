//! Right-hand side of the granule trafficking DDE.
//!
//! Proinsulin `I` and membrane material `V` combine into reserve granules
//! `R`, which are primed at rate `gamma` onto docking sites (`D`, `DIR`),
//! fuse at rate `rho` (`F`) and are released at rate `sigma`. Released
//! membrane returns to `V` after `tau_V`; glucose drives priming after
//! `tau_G`.
//!
//! ```text
//! dI    = -k·I·V - alpha_I·I + bI
//! dV    = -k·I·V - alpha_V·V + bV + sigma·F(t - tau_V)
//! dR    =  k·I·V - gamma·R
//! dD    =  gamma·R - k1p·(CT - DIR)·D + k1m·DIR
//! dDIR  =  k1p·(CT - DIR)·D - k1m·DIR - rho·DIR
//! dF    =  rho·DIR - sigma·F
//! dgamma = eta·(-gamma + gamma_b + psi(t) + h_gamma(G(t - tau_G)))
//! drho   = zeta·(-rho + rho_b + h_rho(gamma))
//! ```

use crate::activation::{h_gamma, h_rho};
use crate::error::{ModelError, Result};
use crate::forcing::{SharedForcing, Zero, shared};
use crate::history::{ConstantHistory, Delayed, DelayHistory};
use crate::params::Parameters;
use crate::state::State;

/// Parameter set plus the oscillatory perturbation psi(t).
#[derive(Clone)]
pub struct GranuleModel {
    params: Parameters,
    psi: SharedForcing,
}

impl GranuleModel {
    /// Model with validated parameters and no oscillatory perturbation
    pub fn new(params: Parameters) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            psi: shared(Zero),
        })
    }

    /// Replace psi(t)
    pub fn with_psi(mut self, psi: SharedForcing) -> Self {
        self.psi = psi;
        self
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn psi(&self, t: f64) -> f64 {
        self.psi.value(t)
    }

    /// Time derivative of the state at time `t`.
    ///
    /// Reads `F(t - tau_V)` and `G(t - tau_G)` from `history`. Fails if any
    /// input or output is NaN or infinite; the state is never modified.
    pub fn derivatives<H>(&self, t: f64, x: &State, history: &H) -> Result<State>
    where
        H: DelayHistory + ?Sized,
    {
        let p = &self.params;
        check_finite("time", t)?;
        check_state(x)?;

        let f_delayed = history.value_at(Delayed::Fused, t - p.tau_V);
        check_finite("delayed F", f_delayed)?;
        let g_delayed = history.value_at(Delayed::Glucose, t - p.tau_G);
        check_finite("delayed glucose", g_delayed)?;
        let psi = self.psi(t);
        check_finite("psi", psi)?;

        let formation = p.k * x.I * x.V;
        let docking = p.k1p * (p.CT - x.DIR) * x.D;

        let dx = State {
            I: -formation - p.alpha_I * x.I + p.bI,
            V: -formation - p.alpha_V * x.V + p.bV + p.sigma * f_delayed,
            R: formation - x.gamma * x.R,
            D: x.gamma * x.R - docking + p.k1m * x.DIR,
            DIR: docking - p.k1m * x.DIR - x.rho * x.DIR,
            F: x.rho * x.DIR - p.sigma * x.F,
            gamma: p.eta * (-x.gamma + p.gamma_b + psi + h_gamma(g_delayed, p)),
            rho: p.zeta * (-x.rho + p.rho_b + h_rho(x.gamma, p)),
        };

        check_state(&dx)?;
        Ok(dx)
    }

    /// Equilibrium under constant glucose `glucose` with psi ≡ 0.
    ///
    /// Setting every derivative to zero gives, in order,
    /// `gamma* = gamma_b + h_gamma(G)`, `rho* = rho_b + h_rho(gamma*)`,
    /// `V* = bV / alpha_V` (recycling balances formation), and the granule
    /// flux `J = k·I*·V*` that every pool passes on at steady state.
    pub fn steady_state(&self, glucose: f64) -> Result<State> {
        check_finite("glucose", glucose)?;
        let p = &self.params;

        let gamma = p.gamma_b + h_gamma(glucose, p);
        let rho = p.rho_b + h_rho(gamma, p);
        let v = p.bV / p.alpha_V;
        let i = p.bI / (p.k * v + p.alpha_I);
        let flux = p.k * i * v;

        let dir = flux / rho;
        if dir >= p.CT {
            return Err(ModelError::NoEquilibrium {
                glucose,
                dir,
                ct: p.CT,
            });
        }
        let d = (p.k1m + rho) * dir / (p.k1p * (p.CT - dir));

        // zero basal rates leave R* or DIR* unbounded
        let x = State {
            I: i,
            V: v,
            R: flux / gamma,
            D: d,
            DIR: dir,
            F: flux / p.sigma,
            gamma,
            rho,
        };
        check_state(&x)?;
        Ok(x)
    }

    /// Constant history consistent with [`GranuleModel::steady_state`]
    pub fn steady_history(&self, glucose: f64) -> Result<(State, ConstantHistory)> {
        let x = self.steady_state(glucose)?;
        Ok((
            x,
            ConstantHistory {
                fused: x.F,
                glucose,
            },
        ))
    }
}

fn check_state(x: &State) -> Result<()> {
    match x.first_non_finite() {
        Some((index, value)) => Err(ModelError::NonFinite {
            quantity: index.label(),
            value,
        }),
        None => Ok(()),
    }
}

fn check_finite(quantity: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::NonFinite { quantity, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> GranuleModel {
        GranuleModel::new(Parameters::default()).unwrap()
    }

    #[test]
    fn test_empty_pools_at_basal_rates() {
        let m = model();
        let p = *m.params();
        let x = State {
            gamma: p.gamma_b,
            rho: p.rho_b,
            ..Default::default()
        };
        let history = ConstantHistory {
            fused: 0.0,
            glucose: 30.0,
        };
        let dx = m.derivatives(0.0, &x, &history).unwrap();

        assert_eq!(dx.I, 4.0);
        assert_eq!(dx.V, 6.0);
        assert_eq!(dx.R, 0.0);
        assert_eq!(dx.D, 0.0);
        assert_eq!(dx.DIR, 0.0);
        assert_eq!(dx.F, 0.0);
        // glucose above G_hat: priming pushed by the full plateau
        assert!((dx.gamma - p.eta * p.h_hat).abs() < 1e-15);
        assert_eq!(dx.rho, 0.0);
    }

    #[test]
    fn test_delayed_fused_feeds_membrane_pool() {
        let m = model();
        let p = *m.params();
        let x = State {
            gamma: p.gamma_b,
            rho: p.rho_b,
            ..Default::default()
        };
        let history = ConstantHistory {
            fused: 2.0,
            glucose: 5.0,
        };
        let dx = m.derivatives(10.0, &x, &history).unwrap();
        assert!((dx.V - (p.bV + p.sigma * 2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_history_is_queried_at_lags() {
        struct Recording(std::cell::RefCell<Vec<(Delayed, f64)>>);
        impl DelayHistory for Recording {
            fn value_at(&self, quantity: Delayed, time: f64) -> f64 {
                self.0.borrow_mut().push((quantity, time));
                0.0
            }
        }

        let m = model();
        let rec = Recording(Default::default());
        m.derivatives(12.0, &State::default(), &rec).unwrap();
        let calls = rec.0.into_inner();
        assert!(calls.contains(&(Delayed::Fused, 12.0 - m.params().tau_V)));
        assert!(calls.contains(&(Delayed::Glucose, 12.0 - m.params().tau_G)));
    }

    #[test]
    fn test_non_finite_state_is_rejected() {
        let m = model();
        let x = State {
            D: f64::NAN,
            ..Default::default()
        };
        let history = ConstantHistory {
            fused: 0.0,
            glucose: 5.0,
        };
        match m.derivatives(0.0, &x, &history) {
            Err(ModelError::NonFinite { quantity, .. }) => assert_eq!(quantity, "D"),
            other => panic!("expected non-finite D, got {:?}", other),
        }

        let history = ConstantHistory {
            fused: f64::INFINITY,
            glucose: 5.0,
        };
        assert!(m.derivatives(0.0, &State::default(), &history).is_err());
    }

    #[test]
    fn test_psi_shifts_priming() {
        let p = Parameters::default();
        let m = GranuleModel::new(p).unwrap().with_psi(shared(|t: f64| 1e-3 * t));
        let x = State {
            gamma: p.gamma_b,
            rho: p.rho_b,
            ..Default::default()
        };
        let history = ConstantHistory {
            fused: 0.0,
            glucose: 0.0,
        };
        let dx = m.derivatives(2.0, &x, &history).unwrap();
        assert!((dx.gamma - p.eta * 2e-3).abs() < 1e-15);
    }

    #[test]
    fn test_steady_state_zeroes_derivatives() {
        let m = model();
        for glucose in [3.0, 5.0, 7.5, 10.0, 20.0] {
            let (x, history) = m.steady_history(glucose).unwrap();
            let dx = m.derivatives(0.0, &x, &history).unwrap();
            for (i, (d, v)) in dx.to_array().iter().zip(x.to_array()).enumerate() {
                assert!(
                    d.abs() <= 1e-9 * (1.0 + v.abs()),
                    "component {} not stationary at G = {}: d = {}",
                    i,
                    glucose,
                    d
                );
            }
            let p = m.params();
            assert_eq!(x.gamma, p.gamma_b + h_gamma(glucose, p));
            assert_eq!(x.rho, p.rho_b + h_rho(x.gamma, p));
        }
    }

    #[test]
    fn test_saturated_docking_has_no_equilibrium() {
        let p = Parameters {
            CT: 10.0,
            ..Default::default()
        };
        let m = GranuleModel::new(p).unwrap();
        assert!(matches!(
            m.steady_state(5.0),
            Err(ModelError::NoEquilibrium { .. })
        ));
    }

    #[test]
    fn test_zero_basal_priming_has_unbounded_reserve() {
        let p = Parameters {
            gamma_b: 0.0,
            ..Default::default()
        };
        let m = GranuleModel::new(p).unwrap();
        assert!(matches!(
            m.steady_state(3.0),
            Err(ModelError::NonFinite { quantity: "R", .. })
        ));
        assert!(m.steady_state(8.0).is_ok());
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let p = Parameters {
            sigma: -1.0,
            ..Default::default()
        };
        assert!(GranuleModel::new(p).is_err());
    }
}
