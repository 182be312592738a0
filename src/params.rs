//! Kinetic parameter set for the granule trafficking model.
//!
//! Time is in minutes, glucose in mM, granule pools in granule counts and
//! the proinsulin/membrane pools in amol.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ModelError, Result};

/// Rate constants and thresholds of the model.
///
/// Constructed once before a run and never mutated afterwards. Field names
/// match the JSON keys of a parameter file, and missing keys fall back to
/// the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Rate of granule formation from I and V (amol⁻¹ min⁻¹)
    pub k: f64,
    /// Proinsulin synthesis rate (amol/min)
    pub bI: f64,
    /// Proinsulin degradation rate (min⁻¹)
    pub alpha_I: f64,
    /// Membrane material synthesis rate (amol/min)
    pub bV: f64,
    /// Membrane material degradation rate (min⁻¹)
    pub alpha_V: f64,
    /// Delay of membrane recycling after fusion (min)
    pub tau_V: f64,
    /// Total number of docking sites
    pub CT: f64,
    /// Docking-site binding rate (min⁻¹ per site)
    pub k1p: f64,
    /// Docking-site unbinding rate (min⁻¹)
    pub k1m: f64,
    /// Fused-granule release rate (min⁻¹)
    pub sigma: f64,
    /// Relaxation rate of gamma (min⁻¹)
    pub eta: f64,
    /// Basal priming rate (min⁻¹)
    pub gamma_b: f64,
    /// Delay between glucose and priming signal (min)
    pub tau_G: f64,
    /// Glucose threshold of the priming ramp (mM)
    pub G_star: f64,
    /// Maximal glucose-driven priming increment (min⁻¹)
    pub h_hat: f64,
    /// Glucose at which the priming ramp saturates (mM)
    pub G_hat: f64,
    /// Relaxation rate of rho (min⁻¹)
    pub zeta: f64,
    /// Basal fusion rate (min⁻¹)
    pub rho_b: f64,
    /// Slope of the fusion response to gamma (dimensionless)
    pub k_rho: f64,
    /// Basal fraction of the glucose response
    pub fb: f64,
    /// Half-saturation of the glucose response above threshold (mM)
    pub Kf: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            k: 1.0e-4,
            bI: 4.0,
            alpha_I: 3.0e-3,
            bV: 6.0,
            alpha_V: 3.0e-3,
            tau_V: 5.0,
            CT: 300.0,
            k1p: 1.0e-3,
            k1m: 2.0e-2,
            sigma: 30.0,
            eta: 4.0,
            gamma_b: 1.0e-4,
            tau_G: 1.0,
            G_star: 4.58,
            h_hat: 3.93e-3,
            G_hat: 10.0,
            zeta: 0.05,
            rho_b: 0.04,
            k_rho: 350.0,
            fb: 0.05,
            Kf: 8.0,
        }
    }
}

impl Parameters {
    /// Load an explicitly requested JSON file.
    ///
    /// Unlike [`Parameters::load_or_default`], a missing file, a parse error or
    /// an out-of-range value is returned to the caller.
    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let params: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: display.clone(),
            source,
        })?;
        params.validate().map_err(|source| ConfigError::Invalid {
            path: display,
            source,
        })?;
        log::info!("Loaded model parameters from {:?}", path);
        Ok(params)
    }

    /// Load from a JSON file, or return defaults when the file is missing or malformed.
    ///
    /// Only for implicit default locations; a file named by the user goes
    /// through [`Parameters::load`].
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(params) => {
                    log::info!("Loaded model parameters from {:?}", path.as_ref());
                    params
                }
                Err(e) => {
                    log::warn!("Failed to parse model parameters: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Model parameter file {:?} not found, using defaults", path.as_ref());
                Self::default()
            }
        }
    }

    /// Named view over every field, in declaration order
    pub fn entries(&self) -> [(&'static str, f64); 21] {
        [
            ("k", self.k),
            ("bI", self.bI),
            ("alpha_I", self.alpha_I),
            ("bV", self.bV),
            ("alpha_V", self.alpha_V),
            ("tau_V", self.tau_V),
            ("CT", self.CT),
            ("k1p", self.k1p),
            ("k1m", self.k1m),
            ("sigma", self.sigma),
            ("eta", self.eta),
            ("gamma_b", self.gamma_b),
            ("tau_G", self.tau_G),
            ("G_star", self.G_star),
            ("h_hat", self.h_hat),
            ("G_hat", self.G_hat),
            ("zeta", self.zeta),
            ("rho_b", self.rho_b),
            ("k_rho", self.k_rho),
            ("fb", self.fb),
            ("Kf", self.Kf),
        ]
    }

    /// Check that every value is finite and inside its physical range.
    ///
    /// `tau_G` and the basal offsets may be zero; everything else that acts as
    /// a rate, a delay the integrator steps over, or a capacity must be
    /// strictly positive.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.entries() {
            if !value.is_finite() {
                return Err(invalid(name, value, "must be finite"));
            }
            let allows_zero =
                matches!(name, "tau_G" | "gamma_b" | "rho_b" | "h_hat" | "G_star" | "fb");
            if value < 0.0 || (value == 0.0 && !allows_zero) {
                let reason = if allows_zero {
                    "must be non-negative"
                } else {
                    "must be positive"
                };
                return Err(invalid(name, value, reason));
            }
        }
        if self.G_hat <= self.G_star {
            return Err(invalid("G_hat", self.G_hat, "must exceed G_star"));
        }
        if self.fb > 1.0 {
            return Err(invalid("fb", self.fb, "must lie in [0, 1]"));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, value: f64, reason: &'static str) -> ModelError {
    ModelError::InvalidParameter {
        name,
        value,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Parameters::default().validate().is_ok());
    }

    #[test]
    fn test_serialization_uses_model_names() {
        let params = Parameters::default();
        let json = serde_json::to_string_pretty(&params).unwrap();
        assert!(json.contains("\"alpha_I\""));
        assert!(json.contains("\"CT\""));
        assert!(json.contains("\"G_star\""));
        let parsed: Parameters = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let parsed: Parameters = serde_json::from_str(r#"{ "sigma": 12.5 }"#).unwrap();
        assert_eq!(parsed.sigma, 12.5);
        assert_eq!(parsed.k_rho, Parameters::default().k_rho);
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let params = Parameters {
            eta: f64::NAN,
            ..Default::default()
        };
        match params.validate() {
            Err(ModelError::InvalidParameter { name, .. }) => assert_eq!(name, "eta"),
            other => panic!("expected invalid eta, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_zero_membrane_delay() {
        let params = Parameters {
            tau_V: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = Parameters {
            tau_G: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_ramp() {
        let params = Parameters {
            G_hat: 4.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_zero_basal_fraction_is_valid() {
        let params = Parameters {
            fb: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_ok());

        let params = Parameters {
            fb: 1.5,
            ..Default::default()
        };
        match params.validate() {
            Err(ModelError::InvalidParameter { name, reason, .. }) => {
                assert_eq!(name, "fb");
                assert_eq!(reason, "must lie in [0, 1]");
            }
            other => panic!("expected invalid fb, got {:?}", other),
        }
    }

    #[test]
    fn test_load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{ "k_rho": 1.0 }"#).unwrap();
        let params = Parameters::load(&path).unwrap();
        assert_eq!(params.k_rho, 1.0);
        assert_eq!(params.sigma, Parameters::default().sigma);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{ "sigma": "thirty", "k_rho": 1.0 }"#).unwrap();
        assert!(matches!(
            Parameters::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.json");
        assert!(matches!(
            Parameters::load(&path),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_load_rejects_out_of_range_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{ "tau_V": -1.0 }"#).unwrap();
        assert!(matches!(
            Parameters::load(&path),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let params = Parameters::load_or_default("does/not/exist/params.json");
        assert_eq!(params, Parameters::default());
    }
}
