//! Top level error of a capacity review run.

use thiserror::Error;

use crate::config::ConfigError;
use crate::review::ReviewError;
use crate::simulator::SimulationError;

#[derive(Debug, Error)]
pub enum CapacityError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error("simulation failed: {0}")]
    SimulationFailed(String),
}
