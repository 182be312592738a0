//! Piecewise activation laws of the priming and fusion signals.
//!
//! Breakpoint comparisons are part of the model: `h_gamma` and `h_rho` are
//! zero up to and including their threshold, so both are continuous there.

use crate::params::Parameters;

/// Fraction of maximal secretion reached at glucose `glucose` (mM), f(G).
///
/// Equals `fb` below `G_star` and rises towards 1 with half-saturation `Kf`
/// above it. Not used by the derivative function.
pub fn glucose_fraction(glucose: f64, p: &Parameters) -> f64 {
    if glucose < p.G_star {
        p.fb
    } else {
        let excess = glucose - p.G_star;
        p.fb + (1.0 - p.fb) * excess / (p.Kf + excess)
    }
}

/// Glucose-driven increment of the priming rate, h_gamma(G) (min⁻¹).
pub fn h_gamma(glucose: f64, p: &Parameters) -> f64 {
    if glucose <= p.G_star {
        0.0
    } else if glucose <= p.G_hat {
        p.h_hat * (glucose - p.G_star) / (p.G_hat - p.G_star)
    } else {
        p.h_hat
    }
}

/// Priming-driven increment of the fusion rate, h_rho(gamma) (min⁻¹).
pub fn h_rho(gamma: f64, p: &Parameters) -> f64 {
    if gamma <= p.gamma_b {
        0.0
    } else {
        p.k_rho * (gamma - p.gamma_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_h_gamma_below_threshold() {
        let p = Parameters::default();
        for g in [0.0, 1.0, 3.0, 4.5, 4.579_999] {
            assert_eq!(h_gamma(g, &p), 0.0, "h_gamma({}) should be 0", g);
        }
        assert_eq!(h_gamma(4.58, &p), 0.0);
    }

    #[test]
    fn test_h_gamma_plateau() {
        let p = Parameters::default();
        assert_eq!(h_gamma(10.0, &p), 3.93e-3);
        assert_eq!(h_gamma(10.000_001, &p), p.h_hat);
        assert_eq!(h_gamma(30.0, &p), p.h_hat);
    }

    #[test]
    fn test_h_gamma_continuous_and_non_decreasing() {
        let p = Parameters::default();
        let mut prev = h_gamma(0.0, &p);
        let mut g = 0.0;
        while g < 20.0 {
            g += 1e-3;
            let value = h_gamma(g, &p);
            assert!(value >= prev, "h_gamma decreases at G = {}", g);
            // ramp slope is h_hat / 5.42, so a 1e-3 step moves < 1e-6
            assert!(value - prev < 1e-6, "h_gamma jumps at G = {}", g);
            prev = value;
        }

        let eps = 1e-12;
        assert!(h_gamma(p.G_star + eps, &p) < 1e-14);
        assert!((h_gamma(p.G_hat - eps, &p) - p.h_hat).abs() < 1e-14);
    }

    #[test]
    fn test_h_gamma_midpoint() {
        let p = Parameters::default();
        let mid = 0.5 * (p.G_star + p.G_hat);
        assert!((h_gamma(mid, &p) - 0.5 * p.h_hat).abs() < 1e-15);
    }

    #[test]
    fn test_h_rho_threshold_and_slope() {
        let p = Parameters::default();
        assert_eq!(h_rho(0.0, &p), 0.0);
        assert_eq!(h_rho(1e-4, &p), 0.0);
        assert!((h_rho(1e-3, &p) - 0.315).abs() < 1e-12);

        for gamma in [2e-4, 5e-4, 4.03e-3] {
            assert_eq!(h_rho(gamma, &p), p.k_rho * (gamma - p.gamma_b));
        }
    }

    #[test]
    fn test_glucose_fraction() {
        let p = Parameters::default();
        assert_eq!(glucose_fraction(3.0, &p), p.fb);
        assert_eq!(glucose_fraction(p.G_star, &p), p.fb);

        let half = glucose_fraction(p.G_star + p.Kf, &p);
        assert!((half - (p.fb + 0.5 * (1.0 - p.fb))).abs() < 1e-12);

        let high = glucose_fraction(1e6, &p);
        assert!(high < 1.0 && high > 0.99);
    }
}
