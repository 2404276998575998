//! Temperature-scan driver and critical-temperature estimation.
//!
//! A scan runs an independent simulation at each temperature point:
//! fresh random lattice, burn-in, then one (M, E) sample after every
//! Metropolis trial of the measurement phase. Samples are folded into
//! per-spin-normalized aggregates immediately.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{IsingError, Result};
use crate::ising::{analysis, IsingModel2D};

/// Explicit inputs of a temperature scan. There are no implicit defaults
/// here; defaults live in the configuration layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanParams {
    /// Lattice side length
    pub size: usize,
    /// Exchange coupling J
    pub coupling: f64,
    /// External field B
    pub field: f64,
    /// Lowest scanned temperature
    pub t_min: f64,
    /// Highest scanned temperature
    pub t_max: f64,
    /// Number of temperature points, endpoints included
    pub t_steps: usize,
    /// Discarded burn-in trials per temperature point
    pub equilibration_steps: usize,
    /// Measured trials per temperature point (one sample per trial)
    pub measurement_steps: usize,
    /// Seed for deterministic scans; each temperature point derives its own
    pub seed: Option<u64>,
}

impl ScanParams {
    /// Validate the scan domain before any simulation work.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(IsingError::DomainRange(
                "lattice size must be at least 1".to_string(),
            ));
        }
        if !self.coupling.is_finite() || !self.field.is_finite() {
            return Err(IsingError::DomainRange(
                "coupling and field must be finite".to_string(),
            ));
        }
        if !self.t_min.is_finite() || !self.t_max.is_finite() || self.t_min < 0.0 {
            return Err(IsingError::DomainRange(format!(
                "temperature range must be finite and non-negative, got [{}, {}]",
                self.t_min, self.t_max
            )));
        }
        if self.t_max < self.t_min {
            return Err(IsingError::DomainRange(format!(
                "t_max ({}) must not be below t_min ({})",
                self.t_max, self.t_min
            )));
        }
        if self.t_steps == 0 {
            return Err(IsingError::DomainRange(
                "a scan needs at least one temperature point".to_string(),
            ));
        }
        if self.measurement_steps == 0 {
            return Err(IsingError::DomainRange(
                "a scan needs at least one measurement step".to_string(),
            ));
        }
        Ok(())
    }

    /// Temperature of point `index`, linearly spaced with exact endpoints.
    fn temperature_at(&self, index: usize) -> f64 {
        if index == 0 {
            self.t_min
        } else if index + 1 == self.t_steps {
            self.t_max
        } else {
            let dt = (self.t_max - self.t_min) / (self.t_steps - 1) as f64;
            self.t_min + index as f64 * dt
        }
    }
}

/// Aggregated observables of one temperature point, per-spin normalized
/// except the temperature itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanPoint {
    pub temperature: f64,
    /// ⟨|M|⟩ / N
    pub mean_abs_magnetization: f64,
    /// std(M) / N
    pub magnetization_std_dev: f64,
    /// χ = (⟨M²⟩ - ⟨M⟩²) / (T·N); defined as 0 at T = 0
    pub susceptibility: f64,
    /// c = (⟨E²⟩ - ⟨E⟩²) / (T²·N); defined as 0 at T = 0
    pub specific_heat: f64,
    /// ⟨E⟩ / N
    pub mean_energy: f64,
}

/// Scan output, ordered by increasing temperature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub points: Vec<ScanPoint>,
}

/// Critical-temperature estimate from the susceptibility peak of a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalTemperatureEstimate {
    /// Temperature at the susceptibility maximum
    pub t_c_experimental: f64,
    /// Susceptibility at that point
    pub chi_max: f64,
    /// Onsager reference, 2.269 × J
    pub t_c_theoretical: f64,
    /// |T_c - T_c,theory| / T_c,theory × 100
    pub error_percent: f64,
    /// The scan the estimate was derived from
    pub scan: ScanResult,
}

/// Scan a temperature range, one independent simulation per point.
pub fn scan_temperature(params: &ScanParams) -> Result<ScanResult> {
    params.validate()?;

    let n_sites = (params.size * params.size) as f64;
    let mut points = Vec::with_capacity(params.t_steps);

    info!(
        "scanning {} temperature points in [{}, {}] on a {}x{} lattice",
        params.t_steps, params.t_min, params.t_max, params.size, params.size
    );

    for index in 0..params.t_steps {
        let temperature = params.temperature_at(index);

        // Every point starts from its own random configuration, not a
        // continuation of the previous point.
        let mut model = match params.seed {
            Some(seed) => IsingModel2D::with_seed(
                params.size,
                temperature,
                params.coupling,
                params.field,
                seed.wrapping_add(index as u64),
            )?,
            None => IsingModel2D::new(params.size, temperature, params.coupling, params.field)?,
        };

        for _ in 0..params.equilibration_steps {
            model.metropolis_step();
        }

        let mut magnetizations = Vec::with_capacity(params.measurement_steps);
        let mut energies = Vec::with_capacity(params.measurement_steps);

        for _ in 0..params.measurement_steps {
            model.metropolis_step();
            magnetizations.push(model.magnetization());
            energies.push(model.total_energy());
        }

        points.push(aggregate_point(
            temperature,
            n_sites,
            &magnetizations,
            &energies,
        ));

        debug!(
            "T = {:.4}: <|m|> = {:.4}, chi = {:.4}, acceptance = {:.3}",
            temperature,
            points[index].mean_abs_magnetization,
            points[index].susceptibility,
            model.stats.acceptance_rate()
        );
    }

    Ok(ScanResult { points })
}

/// Run a scan and locate the phase transition at the susceptibility peak.
///
/// Ties are broken by the first occurrence in increasing-temperature order.
/// Only ferromagnetic couplings (J > 0) have a transition to locate.
pub fn find_critical_temperature(params: &ScanParams) -> Result<CriticalTemperatureEstimate> {
    if params.coupling <= 0.0 {
        return Err(IsingError::DomainRange(format!(
            "critical-temperature estimation requires a ferromagnetic coupling (J > 0), got {}",
            params.coupling
        )));
    }

    let scan = scan_temperature(params)?;

    let mut peak = 0;
    for (index, point) in scan.points.iter().enumerate() {
        if point.susceptibility > scan.points[peak].susceptibility {
            peak = index;
        }
    }

    let t_c_experimental = scan.points[peak].temperature;
    let chi_max = scan.points[peak].susceptibility;
    let t_c_theoretical = analysis::CRITICAL_TEMPERATURE_PER_COUPLING * params.coupling;
    let error_percent = (t_c_experimental - t_c_theoretical).abs() / t_c_theoretical * 100.0;

    info!(
        "susceptibility peak at T = {:.4} (theory {:.4}, error {:.2}%)",
        t_c_experimental, t_c_theoretical, error_percent
    );

    Ok(CriticalTemperatureEstimate {
        t_c_experimental,
        chi_max,
        t_c_theoretical,
        error_percent,
        scan,
    })
}

fn aggregate_point(
    temperature: f64,
    n_sites: f64,
    magnetizations: &[f64],
    energies: &[f64],
) -> ScanPoint {
    let mean_m = mean(magnetizations);
    let mean_abs_m = magnetizations.iter().map(|m| m.abs()).sum::<f64>()
        / magnetizations.len() as f64;
    let mean_m_sq = magnetizations.iter().map(|m| m * m).sum::<f64>()
        / magnetizations.len() as f64;
    let variance_m = mean_m_sq - mean_m * mean_m;

    let mean_e = mean(energies);
    let mean_e_sq = energies.iter().map(|e| e * e).sum::<f64>() / energies.len() as f64;
    let variance_e = mean_e_sq - mean_e * mean_e;

    let susceptibility = if temperature > 0.0 {
        variance_m / (temperature * n_sites)
    } else {
        0.0
    };
    let specific_heat = if temperature > 0.0 {
        variance_e / (temperature * temperature * n_sites)
    } else {
        0.0
    };

    ScanPoint {
        temperature,
        mean_abs_magnetization: mean_abs_m / n_sites,
        magnetization_std_dev: variance_m.max(0.0).sqrt() / n_sites,
        susceptibility,
        specific_heat,
        mean_energy: mean_e / n_sites,
    }
}

fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small_params() -> ScanParams {
        ScanParams {
            size: 8,
            coupling: 1.0,
            field: 0.0,
            t_min: 1.0,
            t_max: 4.0,
            t_steps: 7,
            equilibration_steps: 200,
            measurement_steps: 200,
            seed: Some(42),
        }
    }

    #[test]
    fn test_scan_point_count_and_spacing() {
        let params = small_params();
        let result = scan_temperature(&params).unwrap();

        assert_eq!(result.points.len(), 7);
        assert_eq!(result.points[0].temperature, 1.0);
        assert_eq!(result.points[6].temperature, 4.0);

        let dt = (4.0 - 1.0) / 6.0;
        for (index, point) in result.points.iter().enumerate() {
            assert_relative_eq!(
                point.temperature,
                1.0 + index as f64 * dt,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_single_point_scan_measures_at_t_min() {
        let mut params = small_params();
        params.t_steps = 1;
        params.t_min = 2.0;
        params.t_max = 3.5;

        let result = scan_temperature(&params).unwrap();
        assert_eq!(result.points.len(), 1);
        assert_eq!(result.points[0].temperature, 2.0);
    }

    #[test]
    fn test_scan_observables_are_physical() {
        let result = scan_temperature(&small_params()).unwrap();
        for point in &result.points {
            assert!(point.mean_abs_magnetization >= 0.0);
            assert!(point.mean_abs_magnetization <= 1.0);
            assert!(point.magnetization_std_dev >= 0.0);
            assert!(point.susceptibility >= 0.0);
            assert!(point.specific_heat >= 0.0);
            assert!(point.mean_energy.is_finite());
            // 2D Ising energy per site lies in [-2|J| - |B|, 2|J| + |B|]
            assert!(point.mean_energy.abs() <= 2.0 + 1e-9);
        }
    }

    #[test]
    fn test_susceptibility_zero_at_zero_temperature() {
        let mut params = small_params();
        params.t_min = 0.0;
        params.t_max = 0.0;
        params.t_steps = 1;

        let result = scan_temperature(&params).unwrap();
        assert_eq!(result.points[0].susceptibility, 0.0);
        assert_eq!(result.points[0].specific_heat, 0.0);
    }

    #[test]
    fn test_seeded_scans_are_reproducible() {
        let params = small_params();
        let a = scan_temperature(&params).unwrap();
        let b = scan_temperature(&params).unwrap();

        for (pa, pb) in a.points.iter().zip(b.points.iter()) {
            assert_eq!(pa.mean_abs_magnetization, pb.mean_abs_magnetization);
            assert_eq!(pa.mean_energy, pb.mean_energy);
            assert_eq!(pa.susceptibility, pb.susceptibility);
        }
    }

    #[test]
    fn test_scan_validation() {
        let mut params = small_params();
        params.t_steps = 0;
        assert!(matches!(
            scan_temperature(&params),
            Err(IsingError::DomainRange(_))
        ));

        let mut params = small_params();
        params.t_max = 0.5; // below t_min
        assert!(matches!(
            scan_temperature(&params),
            Err(IsingError::DomainRange(_))
        ));

        let mut params = small_params();
        params.size = 0;
        assert!(matches!(
            scan_temperature(&params),
            Err(IsingError::DomainRange(_))
        ));

        let mut params = small_params();
        params.measurement_steps = 0;
        assert!(matches!(
            scan_temperature(&params),
            Err(IsingError::DomainRange(_))
        ));
    }

    #[test]
    fn test_theoretical_critical_temperature_scales_with_coupling() {
        let mut params = small_params();
        params.coupling = 1.5;

        let estimate = find_critical_temperature(&params).unwrap();
        assert_eq!(estimate.t_c_theoretical, 2.269 * 1.5);
        assert_eq!(estimate.scan.points.len(), params.t_steps);
        assert!(estimate.chi_max >= 0.0);
        assert!(estimate.error_percent >= 0.0);
    }

    #[test]
    fn test_estimate_peak_is_a_scan_point() {
        let params = small_params();
        let estimate = find_critical_temperature(&params).unwrap();

        let peak = estimate
            .scan
            .points
            .iter()
            .find(|p| p.temperature == estimate.t_c_experimental)
            .expect("peak temperature must come from the scan");
        assert_eq!(peak.susceptibility, estimate.chi_max);
        assert!(estimate
            .scan
            .points
            .iter()
            .all(|p| p.susceptibility <= estimate.chi_max));
    }

    #[test]
    fn test_tied_susceptibility_takes_first_occurrence() {
        // At T = 0 every point has chi = 0, so the argmax must stay on the
        // first point of the scan.
        let mut params = small_params();
        params.t_min = 0.0;
        params.t_max = 0.0;
        params.t_steps = 3;
        params.equilibration_steps = 0;
        params.measurement_steps = 10;

        let estimate = find_critical_temperature(&params).unwrap();
        assert_eq!(estimate.t_c_experimental, 0.0);
        assert_eq!(estimate.chi_max, 0.0);
    }

    #[test]
    fn test_antiferromagnetic_coupling_is_rejected() {
        let mut params = small_params();
        params.coupling = -1.0;
        assert!(matches!(
            find_critical_temperature(&params),
            Err(IsingError::DomainRange(_))
        ));
    }
}
