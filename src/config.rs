//! YAML configuration for temperature scans.
//!
//! Defaults reproduce the stock ferromagnetic scan (20x20 lattice, J = 1,
//! T from 0.5 to 4.0 over 25 points, 2000 burn-in and 1000 measurement
//! trials per point). Validation enforces the parameter domains of the
//! public API; the scan engine itself only ever sees explicit parameters.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{IsingError, Result};
use crate::scan::ScanParams;

/// Configuration for a temperature scan
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ScanConfig {
    /// Lattice setup parameters
    #[serde(default)]
    pub lattice: LatticeConfig,
    /// Temperature range of the scan
    #[serde(default)]
    pub scan: ScanRangeConfig,
    /// Burn-in and measurement lengths
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Optional seed for deterministic scans
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Lattice setup configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LatticeConfig {
    /// Lattice side length
    #[serde(default = "default_size")]
    pub size: usize,
    /// Exchange coupling J
    #[serde(default = "default_coupling")]
    pub coupling: f64,
    /// External field B
    #[serde(default)]
    pub field: f64,
}

/// Temperature range configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScanRangeConfig {
    #[serde(default = "default_t_min")]
    pub t_min: f64,
    #[serde(default = "default_t_max")]
    pub t_max: f64,
    #[serde(default = "default_t_steps")]
    pub t_steps: usize,
}

/// Sampling configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SamplingConfig {
    /// Discarded burn-in trials per temperature point
    #[serde(default = "default_equilibration_steps")]
    pub equilibration_steps: usize,
    /// Measured trials per temperature point
    #[serde(default = "default_measurement_steps")]
    pub measurement_steps: usize,
}

// Default value functions
fn default_size() -> usize {
    20
}
fn default_coupling() -> f64 {
    1.0
}
fn default_t_min() -> f64 {
    0.5
}
fn default_t_max() -> f64 {
    4.0
}
fn default_t_steps() -> usize {
    25
}
fn default_equilibration_steps() -> usize {
    2000
}
fn default_measurement_steps() -> usize {
    1000
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            coupling: default_coupling(),
            field: 0.0,
        }
    }
}

impl Default for ScanRangeConfig {
    fn default() -> Self {
        Self {
            t_min: default_t_min(),
            t_max: default_t_max(),
            t_steps: default_t_steps(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            equilibration_steps: default_equilibration_steps(),
            measurement_steps: default_measurement_steps(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from a YAML file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ScanConfig = serde_yml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration parameters against the public API domains.
    pub fn validate(&self) -> Result<()> {
        if !(10..=100).contains(&self.lattice.size) {
            return Err(IsingError::DomainRange(format!(
                "lattice size must be in [10, 100], got {}",
                self.lattice.size
            )));
        }
        if !(-2.0..=2.0).contains(&self.lattice.coupling) {
            return Err(IsingError::DomainRange(format!(
                "coupling must be in [-2, 2], got {}",
                self.lattice.coupling
            )));
        }
        if !(-1.0..=1.0).contains(&self.lattice.field) {
            return Err(IsingError::DomainRange(format!(
                "field must be in [-1, 1], got {}",
                self.lattice.field
            )));
        }
        if self.scan.t_min < 0.0 || self.scan.t_max > 5.0 {
            return Err(IsingError::DomainRange(format!(
                "temperature range must stay within [0, 5], got [{}, {}]",
                self.scan.t_min, self.scan.t_max
            )));
        }
        if self.scan.t_max < self.scan.t_min {
            return Err(IsingError::DomainRange(format!(
                "t_max ({}) must not be below t_min ({})",
                self.scan.t_max, self.scan.t_min
            )));
        }
        if self.scan.t_steps == 0 {
            return Err(IsingError::DomainRange(
                "a scan needs at least one temperature point".to_string(),
            ));
        }
        if self.sampling.measurement_steps == 0 {
            return Err(IsingError::DomainRange(
                "a scan needs at least one measurement step".to_string(),
            ));
        }
        Ok(())
    }

    /// Explicit scan parameters for the engine.
    pub fn params(&self) -> ScanParams {
        ScanParams {
            size: self.lattice.size,
            coupling: self.lattice.coupling,
            field: self.lattice.field,
            t_min: self.scan.t_min,
            t_max: self.scan.t_max,
            t_steps: self.scan.t_steps,
            equilibration_steps: self.sampling.equilibration_steps,
            measurement_steps: self.sampling.measurement_steps,
            seed: self.seed,
        }
    }
}
