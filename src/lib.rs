pub mod config;
pub mod error;
pub mod ising;
pub mod scan;
pub mod session;

pub use config::ScanConfig;
pub use error::{IsingError, Result};
pub use ising::{IsingModel2D, StateSnapshot};
pub use scan::{
    find_critical_temperature, scan_temperature, CriticalTemperatureEstimate, ScanParams,
    ScanPoint, ScanResult,
};
pub use session::SessionRegistry;
