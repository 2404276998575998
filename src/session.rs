//! Session registry mapping opaque ids to lattices.
//!
//! The registry owns all shared mutable state of the engine. Map structure
//! and insertion order sit behind one registry-wide lock; each lattice sits
//! behind its own lock so per-session mutation does not serialize unrelated
//! sessions. Eviction is by insertion order, not access order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::error::{IsingError, Result};
use crate::ising::{IsingModel2D, StateSnapshot};

/// Maximum number of live sessions before `cleanup` evicts the oldest half.
pub const SESSION_CAPACITY: usize = 100;

/// Parameters of the lattice created by `get_or_create` for unknown ids.
const DEFAULT_SIZE: usize = 30;
const DEFAULT_TEMPERATURE: f64 = 1.0;
const DEFAULT_COUPLING: f64 = 1.0;
const DEFAULT_FIELD: f64 = 0.0;

type SharedModel = Arc<Mutex<IsingModel2D>>;

#[derive(Default)]
struct RegistryInner {
    models: HashMap<String, SharedModel>,
    /// Session ids ordered oldest first
    order: Vec<String>,
}

/// Registry of interactive simulation sessions.
#[derive(Default)]
pub struct SessionRegistry {
    inner: Mutex<RegistryInner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with explicit parameters and an optional initial
    /// grid, returning the fresh id and the initial state.
    pub fn create(
        &self,
        size: usize,
        temperature: f64,
        coupling: f64,
        field: f64,
        spins: Option<Vec<Vec<i8>>>,
    ) -> Result<(String, StateSnapshot)> {
        let mut model = IsingModel2D::new(size, temperature, coupling, field)?;
        if let Some(spins) = spins {
            model.set_spins(spins)?;
        }
        let state = model.get_state();

        let id = Uuid::new_v4().to_string();
        self.insert(&id, model);
        self.cleanup();

        Ok((id, state))
    }

    /// Register a model under an explicit id. An existing session with the
    /// same id is replaced and keeps its insertion-order position.
    pub fn insert(&self, id: &str, model: IsingModel2D) {
        let mut inner = self.lock();
        if inner
            .models
            .insert(id.to_string(), Arc::new(Mutex::new(model)))
            .is_none()
        {
            inner.order.push(id.to_string());
        }
    }

    /// Fetch the session's model, creating a default lattice
    /// (size 30, T = 1, J = 1, B = 0) when the id is unknown.
    pub fn get_or_create(&self, id: &str) -> Result<SharedModel> {
        {
            let inner = self.lock();
            if let Some(model) = inner.models.get(id) {
                return Ok(Arc::clone(model));
            }
        }

        let model = IsingModel2D::new(
            DEFAULT_SIZE,
            DEFAULT_TEMPERATURE,
            DEFAULT_COUPLING,
            DEFAULT_FIELD,
        )?;
        self.insert(id, model);

        let inner = self.lock();
        Ok(Arc::clone(&inner.models[id]))
    }

    /// Execute `n_steps` Metropolis trials on the session's lattice.
    pub fn step(&self, id: &str, n_steps: usize) -> Result<(u64, StateSnapshot)> {
        let model = self.get(id)?;
        let mut model = model.lock().unwrap();
        let (accepted, _) = model.run_steps(n_steps);
        Ok((accepted, model.get_state()))
    }

    /// Toggle one spin of the session's lattice, bypassing the Metropolis
    /// acceptance rule.
    pub fn flip_spin(&self, id: &str, i: usize, j: usize) -> Result<StateSnapshot> {
        let model = self.get(id)?;
        let mut model = model.lock().unwrap();
        if i >= model.size || j >= model.size {
            return Err(IsingError::DomainRange(format!(
                "site ({}, {}) outside a {}x{} lattice",
                i, j, model.size, model.size
            )));
        }
        model.flip_spin(i, j);
        Ok(model.get_state())
    }

    /// Update any of T, J, B on the session's lattice.
    pub fn update_params(
        &self,
        id: &str,
        temperature: Option<f64>,
        coupling: Option<f64>,
        field: Option<f64>,
    ) -> Result<StateSnapshot> {
        let model = self.get(id)?;
        let mut model = model.lock().unwrap();
        if let Some(temperature) = temperature {
            model.set_temperature(temperature)?;
        }
        if let Some(coupling) = coupling {
            model.set_coupling(coupling)?;
        }
        if let Some(field) = field {
            model.set_field(field)?;
        }
        Ok(model.get_state())
    }

    /// Current state of the session's lattice.
    pub fn state(&self, id: &str) -> Result<StateSnapshot> {
        let model = self.get(id)?;
        let model = model.lock().unwrap();
        Ok(model.get_state())
    }

    /// Evict the oldest half of all sessions once more than
    /// `SESSION_CAPACITY` are held. A registry at or below capacity is
    /// left untouched.
    pub fn cleanup(&self) {
        let mut inner = self.lock();
        if inner.models.len() <= SESSION_CAPACITY {
            return;
        }
        let evict = inner.order.len() / 2;
        for id in inner.order.drain(..evict).collect::<Vec<_>>() {
            inner.models.remove(&id);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().models.is_empty()
    }

    fn get(&self, id: &str) -> Result<SharedModel> {
        let inner = self.lock();
        inner
            .models
            .get(id)
            .map(Arc::clone)
            .ok_or_else(|| IsingError::SessionNotFound(id.to_string()))
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap()
    }
}
