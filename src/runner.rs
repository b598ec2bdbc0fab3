//! Wires loaded inputs, the reference scheduler, the simulation and review rendering together.

use std::io::Write;
use std::path::PathBuf;

use log::{error, info};

use crate::config::{load_cluster_store, load_pod_templates, SimulationConfig};
use crate::core::scheduler::kube_scheduler::{default_kube_scheduler_config, KubeScheduler};
use crate::error::CapacityError;
use crate::review::printer::{print_review, OutputFormat};
use crate::review::types::ClusterCapacityReview;
use crate::review::validation::validate_review;
use crate::review::ReviewError;
use crate::simulator::{CapacitySimulation, SimulationState};

/// Inputs of a single capacity review after command line flags were applied over the config.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSettings {
    pub cluster_snapshot: Option<PathBuf>,
    pub podspecs: Vec<PathBuf>,
    pub max_limit: Option<u32>,
    pub output_format: OutputFormat,
    pub verbose: bool,
}

impl RunSettings {
    pub fn resolve(
        config: &SimulationConfig,
        cluster_snapshot: Option<PathBuf>,
        podspecs: Vec<PathBuf>,
        max_limit: Option<u32>,
        output_format: Option<&str>,
        verbose: bool,
    ) -> Result<Self, ReviewError> {
        let output_format = output_format
            .or(config.output_format.as_deref())
            .unwrap_or_default()
            .parse()?;
        Ok(Self {
            cluster_snapshot,
            podspecs,
            // zero means no ceiling
            max_limit: max_limit.or(config.max_limit).filter(|limit| *limit > 0),
            output_format,
            verbose: verbose || config.verbose,
        })
    }
}

/// Runs one capacity review and returns the review with the state the simulation ended in.
pub fn simulate(
    config: &SimulationConfig,
    settings: &RunSettings,
) -> Result<(ClusterCapacityReview, SimulationState), CapacityError> {
    let store = load_cluster_store(settings.cluster_snapshot.as_deref(), config)?;
    let templates = load_pod_templates(&settings.podspecs, config.default_namespace.as_deref())?;

    let scheduler = KubeScheduler::new(default_kube_scheduler_config());
    let mut simulation = CapacitySimulation::new(templates, store, Box::new(scheduler))
        .with_max_replicas(settings.max_limit);
    let state = simulation.run()?;

    let review = simulation.review()?;
    let field_errors = validate_review(&review);
    if !field_errors.is_empty() {
        return Err(ReviewError::Invalid(field_errors).into());
    }
    Ok((review, state))
}

/// Prints the review of the run to `out`. A failed simulation is still reported before its error
/// is returned.
pub fn run_capacity_review(
    config: &SimulationConfig,
    settings: &RunSettings,
    out: &mut dyn Write,
) -> Result<(), CapacityError> {
    if !config.sim_name.is_empty() {
        info!("Running capacity review {:?}", config.sim_name);
    }
    let (review, state) = simulate(config, settings)?;
    print_review(&review, settings.output_format, settings.verbose, out)?;

    if state == SimulationState::Failed {
        let cause = review
            .status
            .fail_reason
            .map(|reason| reason.fail_message)
            .unwrap_or_default();
        error!("Capacity simulation failed: {}", cause);
        return Err(CapacityError::SimulationFailed(cause));
    }
    Ok(())
}
