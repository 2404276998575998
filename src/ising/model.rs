use itertools::iproduct;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{IsingError, Result};

/// Boltzmann constant in reduced units.
pub const KB: f64 = 1.0;

/// 2D Ising model evolved with the Metropolis algorithm.
///
/// Spins sit on a periodic square lattice and take the values +1 or -1.
/// Temperatures are measured in units of J/k_B with k_B = 1, so the
/// Boltzmann factor of a trial is exp(-dE / T).
#[derive(Debug)]
pub struct IsingModel2D {
    /// Lattice size (L x L); fixed at construction
    pub size: usize,
    /// Spin configuration: +1 or -1 for each site
    pub spins: Vec<Vec<i8>>,
    /// Temperature in units of J/k_B (reduced temperature)
    pub temperature: f64,
    /// Exchange coupling J; J > 0 ferromagnetic, J < 0 antiferromagnetic
    pub coupling: f64,
    /// External magnetic field B
    pub field: f64,
    /// Random number generator
    rng: StdRng,
    /// Monte Carlo trial counter
    pub step: u64,
    /// Attempt/accept counters for Metropolis trials
    pub stats: FlipStatistics,
}

impl Clone for IsingModel2D {
    fn clone(&self) -> Self {
        Self {
            size: self.size,
            spins: self.spins.clone(),
            temperature: self.temperature,
            coupling: self.coupling,
            field: self.field,
            rng: StdRng::from_entropy(), // Create new RNG for the clone
            step: self.step,
            stats: self.stats.clone(),
        }
    }
}

/// Attempt/accept statistics for Metropolis trials.
#[derive(Debug, Clone, Default)]
pub struct FlipStatistics {
    /// Number of trials attempted
    pub attempts: u64,
    /// Number of trials accepted
    pub accepted: u64,
}

impl FlipStatistics {
    /// Fraction of attempted trials that were accepted
    pub fn acceptance_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempts as f64
        }
    }

    /// Reset all counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Serializable snapshot of a lattice: grid, observables and parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub spins: Vec<Vec<i8>>,
    /// Magnetization per site, in [-1, 1]
    pub magnetization: f64,
    /// Total energy of the configuration
    pub energy: f64,
    pub size: usize,
    pub temperature: f64,
    pub coupling: f64,
    pub field: f64,
}

impl IsingModel2D {
    /// Create a new model with a random initial configuration.
    pub fn new(size: usize, temperature: f64, coupling: f64, field: f64) -> Result<Self> {
        Self::from_rng(
            size,
            temperature,
            coupling,
            field,
            StdRng::from_entropy(),
        )
    }

    /// Create a new model with a deterministic, seeded random source.
    pub fn with_seed(
        size: usize,
        temperature: f64,
        coupling: f64,
        field: f64,
        seed: u64,
    ) -> Result<Self> {
        Self::from_rng(
            size,
            temperature,
            coupling,
            field,
            StdRng::seed_from_u64(seed),
        )
    }

    /// Create a new model with all spins up (ordered state).
    pub fn new_ordered(size: usize, temperature: f64, coupling: f64, field: f64) -> Result<Self> {
        check_params(size, temperature, coupling, field)?;
        Ok(Self {
            size,
            spins: vec![vec![1i8; size]; size],
            temperature,
            coupling,
            field,
            rng: StdRng::from_entropy(),
            step: 0,
            stats: FlipStatistics::default(),
        })
    }

    fn from_rng(
        size: usize,
        temperature: f64,
        coupling: f64,
        field: f64,
        mut rng: StdRng,
    ) -> Result<Self> {
        check_params(size, temperature, coupling, field)?;
        let mut spins = vec![vec![0i8; size]; size];
        for row in spins.iter_mut() {
            for spin in row.iter_mut() {
                *spin = if rng.gen_bool(0.5) { 1 } else { -1 };
            }
        }
        Ok(Self {
            size,
            spins,
            temperature,
            coupling,
            field,
            rng,
            step: 0,
            stats: FlipStatistics::default(),
        })
    }

    /// Replace the spin configuration.
    ///
    /// Rejects grids that are not `size x size` or contain values other
    /// than +1/-1; the current configuration is untouched on failure.
    pub fn set_spins(&mut self, spins: Vec<Vec<i8>>) -> Result<()> {
        if spins.len() != self.size || spins.iter().any(|row| row.len() != self.size) {
            let rows = spins.len();
            let cols = spins.first().map_or(0, |row| row.len());
            return Err(IsingError::InvalidDimensions(format!(
                "expected a {}x{} grid, got {}x{}",
                self.size, self.size, rows, cols
            )));
        }
        if let Some((i, j)) =
            iproduct!(0..self.size, 0..self.size).find(|&(i, j)| spins[i][j].abs() != 1)
        {
            return Err(IsingError::InvalidDimensions(format!(
                "spin at ({}, {}) must be +1 or -1, got {}",
                i, j, spins[i][j]
            )));
        }
        self.spins = spins;
        Ok(())
    }

    /// Get a reference to the current spin configuration.
    pub fn get_spins(&self) -> &Vec<Vec<i8>> {
        &self.spins
    }

    /// Get the spin at position (i, j) with periodic boundary conditions.
    pub(crate) fn get_spin(&self, i: i32, j: i32) -> i8 {
        let i = ((i % self.size as i32) + self.size as i32) % self.size as i32;
        let j = ((j % self.size as i32) + self.size as i32) % self.size as i32;
        self.spins[i as usize][j as usize]
    }

    /// Energy of the bonds incident to site (i, j) plus its field term.
    ///
    /// E = -B*s - J*s*(up + down + left + right), neighbors wrapped
    /// periodically. Only bonds touching (i, j) enter, so the difference of
    /// this functional across a single flip equals the total-energy change
    /// of that flip.
    pub fn local_energy(&self, i: usize, j: usize) -> f64 {
        let spin = self.spins[i][j] as f64;
        let i = i as i32;
        let j = j as i32;

        let neighbors_sum = self.get_spin(i - 1, j) as f64
            + self.get_spin(i + 1, j) as f64
            + self.get_spin(i, j - 1) as f64
            + self.get_spin(i, j + 1) as f64;

        -self.field * spin - self.coupling * spin * neighbors_sum
    }

    /// Unconditionally negate the spin at (i, j).
    ///
    /// This is the manual toggle used by interactive front-ends; it bypasses
    /// the Metropolis acceptance rule.
    pub fn flip_spin(&mut self, i: usize, j: usize) {
        self.spins[i][j] = -self.spins[i][j];
    }

    /// Perform one Metropolis trial. Returns whether the flip was accepted.
    ///
    /// A site is drawn uniformly, tentatively flipped, and the flip is kept
    /// when dE <= 0 or with probability exp(-dE / (k_B T)) otherwise. A
    /// rejected trial restores the prior configuration exactly. At T = 0 an
    /// energy-raising move is never accepted (the limit of the exponential),
    /// not an arithmetic fault.
    pub fn metropolis_step(&mut self) -> bool {
        let i = self.rng.gen_range(0..self.size);
        let j = self.rng.gen_range(0..self.size);

        let e_before = self.local_energy(i, j);
        self.flip_spin(i, j);
        let e_after = self.local_energy(i, j);
        let delta_e = e_after - e_before;

        self.step += 1;
        self.stats.attempts += 1;

        let accept = if delta_e <= 0.0 {
            true
        } else if self.temperature <= 0.0 {
            false
        } else {
            self.rng.gen::<f64>() < (-delta_e / (KB * self.temperature)).exp()
        };

        if accept {
            self.stats.accepted += 1;
        } else {
            self.flip_spin(i, j);
        }

        accept
    }

    /// Execute `n_steps` Metropolis trials sequentially.
    ///
    /// Returns the number of accepted flips and the final configuration.
    /// `n_steps = 0` is a no-op returning `(0, unchanged grid)`.
    pub fn run_steps(&mut self, n_steps: usize) -> (u64, Vec<Vec<i8>>) {
        let mut accepted = 0u64;
        for _ in 0..n_steps {
            if self.metropolis_step() {
                accepted += 1;
            }
        }
        (accepted, self.spins.clone())
    }

    /// Signed sum of all spins.
    pub fn magnetization(&self) -> f64 {
        self.spins
            .iter()
            .flat_map(|row| row.iter())
            .map(|&s| s as f64)
            .sum()
    }

    /// Magnetization per site, in [-1, 1].
    pub fn magnetization_per_site(&self) -> f64 {
        self.magnetization() / (self.size * self.size) as f64
    }

    /// Absolute magnetization per site.
    pub fn abs_magnetization_per_site(&self) -> f64 {
        self.magnetization_per_site().abs()
    }

    /// Total energy of the configuration.
    ///
    /// Each spin is paired with its right and down neighbor only (wrapped
    /// periodically), so every bond is counted exactly once.
    pub fn total_energy(&self) -> f64 {
        let mut energy = 0.0;

        for i in 0..self.size {
            for j in 0..self.size {
                let spin = self.spins[i][j] as f64;
                let right = self.spins[i][(j + 1) % self.size] as f64;
                let down = self.spins[(i + 1) % self.size][j] as f64;

                energy -= self.coupling * spin * (right + down);
                energy -= self.field * spin;
            }
        }

        energy
    }

    /// Energy per site.
    pub fn energy_per_site(&self) -> f64 {
        self.total_energy() / (self.size * self.size) as f64
    }

    /// Snapshot of the grid, observables and parameters.
    pub fn get_state(&self) -> StateSnapshot {
        StateSnapshot {
            spins: self.spins.clone(),
            magnetization: self.magnetization_per_site(),
            energy: self.total_energy(),
            size: self.size,
            temperature: self.temperature,
            coupling: self.coupling,
            field: self.field,
        }
    }

    /// Set the temperature. Rejects negative or non-finite values.
    pub fn set_temperature(&mut self, temperature: f64) -> Result<()> {
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(IsingError::DomainRange(format!(
                "temperature must be finite and >= 0, got {}",
                temperature
            )));
        }
        self.temperature = temperature;
        Ok(())
    }

    /// Set the exchange coupling.
    pub fn set_coupling(&mut self, coupling: f64) -> Result<()> {
        if !coupling.is_finite() {
            return Err(IsingError::DomainRange(format!(
                "coupling must be finite, got {}",
                coupling
            )));
        }
        self.coupling = coupling;
        Ok(())
    }

    /// Set the external field.
    pub fn set_field(&mut self, field: f64) -> Result<()> {
        if !field.is_finite() {
            return Err(IsingError::DomainRange(format!(
                "field must be finite, got {}",
                field
            )));
        }
        self.field = field;
        Ok(())
    }
}

fn check_params(size: usize, temperature: f64, coupling: f64, field: f64) -> Result<()> {
    if size == 0 {
        return Err(IsingError::DomainRange(
            "lattice size must be at least 1".to_string(),
        ));
    }
    if !temperature.is_finite() || temperature < 0.0 {
        return Err(IsingError::DomainRange(format!(
            "temperature must be finite and >= 0, got {}",
            temperature
        )));
    }
    if !coupling.is_finite() {
        return Err(IsingError::DomainRange(format!(
            "coupling must be finite, got {}",
            coupling
        )));
    }
    if !field.is_finite() {
        return Err(IsingError::DomainRange(format!(
            "field must be finite, got {}",
            field
        )));
    }
    Ok(())
}
