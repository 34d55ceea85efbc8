use crate::config::SimConfigError;
use crate::grid::Field;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Produces a concentration field from bacterium placement and virus density.
pub trait ConcentrationSolver: Send + Sync {
    /// Inputs must share dimensions; the output has the same dimensions and
    /// is non-negative everywhere.
    fn solve(&self, bacteria: &Field<u8>, virus: &Field<u64>) -> Field<f64>;
}

/// Default reaction-diffusion solver on a unit grid with zero-flux edges.
///
/// Wolbachia cells secrete an inhibitor that diffuses, decays, and is
/// consumed by unmodified virus:
///
/// ```text
/// ds/dt = D * lap(s) - gamma * s + w * eta - g * s * v
/// ```
///
/// where `eta` is the bacterium indicator and `v` the unmodified virus count.
/// Every solve starts from an all-zero field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InhibitorPde {
    /// Diffusivity `D`.
    pub diffusivity: f64,
    /// First-order decay `gamma`.
    pub decay: f64,
    /// Secretion per Wolbachia cell `w`.
    pub production: f64,
    /// Consumption per virus particle `g`.
    pub consumption: f64,
    /// Simulated time per solve.
    pub t_range: f64,
    pub dt: f64,
}

impl Default for InhibitorPde {
    fn default() -> Self {
        Self {
            diffusivity: 1.0,
            decay: 1.0,
            production: 1.0,
            consumption: 1.0,
            t_range: 10.0,
            dt: 0.1,
        }
    }
}

impl InhibitorPde {
    pub const MAX_SOLVER_STEPS: usize = 100_000;

    pub fn validate(&self) -> Result<(), SimConfigError> {
        let constants = [
            ("diffusivity", self.diffusivity),
            ("decay", self.decay),
            ("production", self.production),
            ("consumption", self.consumption),
        ];
        for (name, value) in constants {
            if !value.is_finite() || value < 0.0 {
                return Err(SimConfigError::InvalidInhibitor(format!(
                    "{name} must be finite and >= 0, got {value}"
                )));
            }
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SimConfigError::InvalidInhibitor(format!(
                "dt must be finite and > 0, got {}",
                self.dt
            )));
        }
        if !self.t_range.is_finite() || self.t_range < 0.0 {
            return Err(SimConfigError::InvalidInhibitor(format!(
                "t_range must be finite and >= 0, got {}",
                self.t_range
            )));
        }
        let ratio = self.t_range / self.dt;
        if ratio > Self::MAX_SOLVER_STEPS as f64 {
            return Err(SimConfigError::InvalidInhibitor(format!(
                "t_range / dt must be <= {}, got {ratio}",
                Self::MAX_SOLVER_STEPS
            )));
        }
        if (ratio - ratio.round()).abs() > 1e-6 * ratio.max(1.0) {
            return Err(SimConfigError::InvalidInhibitor(format!(
                "t_range must be a whole number of dt steps, got {ratio}"
            )));
        }
        // Explicit diffusion on the 4-neighbour stencil stays monotone only
        // while 4 * D * dt <= 1.
        if 4.0 * self.diffusivity * self.dt > 1.0 {
            return Err(SimConfigError::InvalidInhibitor(format!(
                "diffusivity * dt must be <= 0.25 for a stable solve, got {}",
                self.diffusivity * self.dt
            )));
        }
        Ok(())
    }

    /// Number of fixed-size steps covering `t_range`.
    pub fn num_steps(&self) -> usize {
        (self.t_range / self.dt).round() as usize
    }

    /// Advance `prev` by one step into `next`.
    ///
    /// Diffusion and secretion are explicit; decay and consumption are taken
    /// implicitly so the update is a ratio of non-negative terms.
    fn advance(&self, prev: &Field<f64>, next: &mut Field<f64>, eta: &[f64], sink: &[f64]) {
        let n_x = prev.n_x();
        let n_y = prev.n_y();
        let s = prev.data();
        let d_dt = self.diffusivity * self.dt;
        let w_dt = self.production * self.dt;

        next.data_mut()
            .par_chunks_mut(n_y)
            .enumerate()
            .for_each(|(i, row)| {
                for (j, out) in row.iter_mut().enumerate() {
                    let idx = i * n_y + j;
                    let centre = s[idx];
                    // Zero-flux edges: a missing neighbour mirrors the centre.
                    let up = if i > 0 { s[idx - n_y] } else { centre };
                    let down = if i + 1 < n_x { s[idx + n_y] } else { centre };
                    let left = if j > 0 { s[idx - 1] } else { centre };
                    let right = if j + 1 < n_y { s[idx + 1] } else { centre };
                    let laplace = up + down + left + right - 4.0 * centre;

                    let explicit = centre + d_dt * laplace + w_dt * eta[idx];
                    *out = (explicit / (1.0 + sink[idx])).max(0.0);
                }
            });
    }
}

impl ConcentrationSolver for InhibitorPde {
    fn solve(&self, bacteria: &Field<u8>, virus: &Field<u64>) -> Field<f64> {
        assert!(
            bacteria.n_x() == virus.n_x() && bacteria.n_y() == virus.n_y(),
            "bacteria and virus fields must share grid dimensions"
        );
        let n_x = bacteria.n_x();
        let n_y = bacteria.n_y();

        let eta: Vec<f64> = bacteria.data().iter().map(|&b| f64::from(b)).collect();
        let sink: Vec<f64> = virus
            .data()
            .iter()
            .map(|&v| self.dt * (self.decay + self.consumption * v as f64))
            .collect();

        let mut current = Field::<f64>::zeros(n_x, n_y);
        let mut next = Field::<f64>::zeros(n_x, n_y);
        for _ in 0..self.num_steps() {
            self.advance(&current, &mut next, &eta, &sink);
            std::mem::swap(&mut current, &mut next);
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(n: usize) -> Field<u8> {
        let mut bacteria = Field::<u8>::zeros(n, n);
        for i in 2..6 {
            for j in 2..6 {
                bacteria.set(i, j, 1);
            }
        }
        bacteria
    }

    #[test]
    fn no_bacteria_gives_zero_field() {
        let pde = InhibitorPde::default();
        let out = pde.solve(&Field::zeros(8, 8), &Field::zeros(8, 8));
        assert!(out.data().iter().all(|&c| c == 0.0));
    }

    #[test]
    fn output_is_non_negative_and_peaks_on_bacteria() {
        let pde = InhibitorPde::default();
        let bacteria = patch(12);
        let mut virus = Field::<u64>::zeros(12, 12);
        virus.set(3, 3, 500);
        virus.set(10, 10, 40);
        let out = pde.solve(&bacteria, &virus);
        assert!(out.data().iter().all(|&c| c >= 0.0 && c.is_finite()));
        assert!(out.get(4, 4) > out.get(11, 0));
        assert!(out.max() > 0.0);
    }

    #[test]
    fn virus_consumes_inhibitor() {
        let pde = InhibitorPde::default();
        let bacteria = patch(12);
        let clean = pde.solve(&bacteria, &Field::zeros(12, 12));
        let mut virus = Field::<u64>::zeros(12, 12);
        virus.set(4, 4, 10);
        let consumed = pde.solve(&bacteria, &virus);
        assert!(consumed.get(4, 4) < clean.get(4, 4));
    }

    #[test]
    fn repeated_solves_are_identical() {
        let pde = InhibitorPde::default();
        let bacteria = patch(10);
        let mut virus = Field::<u64>::zeros(10, 10);
        virus.set(5, 7, 3);
        let a = pde.solve(&bacteria, &virus);
        let b = pde.solve(&bacteria, &virus);
        assert_eq!(a, b);
    }

    #[test]
    fn uniform_source_approaches_steady_state() {
        // Without gradients the field follows ds/dt = w - gamma * s.
        let pde = InhibitorPde::default();
        let mut bacteria = Field::<u8>::zeros(4, 4);
        bacteria.fill_rows(0..4, 1);
        let out = pde.solve(&bacteria, &Field::zeros(4, 4));
        for &c in out.data() {
            assert!((c - 1.0).abs() < 1e-3, "expected ~1.0, got {c}");
        }
    }

    #[test]
    fn zero_flux_edges_conserve_pure_diffusion_mass() {
        let pde = InhibitorPde {
            decay: 0.0,
            consumption: 0.0,
            ..InhibitorPde::default()
        };
        let mut bacteria = Field::<u8>::zeros(6, 6);
        bacteria.set(0, 0, 1);
        let out = pde.solve(&bacteria, &Field::zeros(6, 6));
        // One unit of secretion per unit time for t_range.
        assert!((out.total() - pde.t_range).abs() < 1e-9);
    }

    #[test]
    fn validate_rejects_unstable_or_negative_parameters() {
        assert!(InhibitorPde::default().validate().is_ok());
        let unstable = InhibitorPde {
            diffusivity: 5.0,
            ..InhibitorPde::default()
        };
        assert!(unstable.validate().is_err());
        let negative = InhibitorPde {
            decay: -1.0,
            ..InhibitorPde::default()
        };
        assert!(negative.validate().is_err());
        let zero_dt = InhibitorPde {
            dt: 0.0,
            ..InhibitorPde::default()
        };
        assert!(zero_dt.validate().is_err());
        assert_eq!(InhibitorPde::default().num_steps(), 100);
    }

    #[test]
    fn validate_caps_solver_step_count() {
        let tiny_dt = InhibitorPde {
            dt: 1e-9,
            ..InhibitorPde::default()
        };
        assert!(matches!(
            tiny_dt.validate(),
            Err(SimConfigError::InvalidInhibitor(_))
        ));

        let at_cap = InhibitorPde {
            t_range: InhibitorPde::MAX_SOLVER_STEPS as f64 * 0.25,
            dt: 0.25,
            ..InhibitorPde::default()
        };
        assert!(at_cap.validate().is_ok());
        let over_cap = InhibitorPde {
            t_range: (InhibitorPde::MAX_SOLVER_STEPS + 1) as f64 * 0.25,
            dt: 0.25,
            ..InhibitorPde::default()
        };
        assert!(over_cap.validate().is_err());
    }

    #[test]
    fn validate_rejects_partial_final_step() {
        let ragged = InhibitorPde {
            t_range: 10.05,
            ..InhibitorPde::default()
        };
        assert!(ragged.validate().is_err());
        let whole = InhibitorPde {
            t_range: 2.5,
            dt: 0.25,
            ..InhibitorPde::default()
        };
        assert!(whole.validate().is_ok());
        assert_eq!(whole.num_steps(), 10);
    }
}
