pub mod config;
pub mod core;
pub mod error;
pub mod metrics;
pub mod review;
pub mod runner;
pub mod simulator;
pub mod test_util;
