//! Error kinds surfaced at the engine boundary.
//!
//! Every variant is a deterministic validation failure; none are transient,
//! so no retry policy applies. The API layer in front of this crate is
//! responsible for mapping these onto protocol-level responses.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IsingError {
    /// An operation referenced a session id the registry does not hold.
    #[error("unknown session id: {0}")]
    SessionNotFound(String),

    /// A supplied spin grid does not match the lattice dimensions, or
    /// contains a value other than +1 or -1.
    #[error("invalid spin grid: {0}")]
    InvalidDimensions(String),

    /// A parameter is outside its physical or configured domain.
    #[error("parameter out of domain: {0}")]
    DomainRange(String),

    /// A configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_yml::Error),
}

pub type Result<T> = std::result::Result<T, IsingError>;
