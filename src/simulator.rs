//! Capacity simulation driver. Repeatedly materializes candidate pods from the workload
//! templates, submits them to the placement algorithm against the synthetic cluster store and
//! stops once the algorithm cannot place another candidate or the replica ceiling is reached.

use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use thiserror::Error;

use crate::core::cluster_store::ClusterStore;
use crate::core::pod::Pod;
use crate::core::scheduler::interface::{Infeasibility, PlacementAlgorithm, PlacementOutcome};
use crate::metrics::collector::MetricsCollector;
use crate::review::classifier::classify_stop;
use crate::review::report::build_review;
use crate::review::types::ClusterCapacityReview;

/// Maps the index of a placement attempt to the template the candidate is generated from.
/// Reports attribute placements and the final failure back to templates with the same function.
pub type Attribution = fn(usize, usize) -> usize;

/// Templates take turns: attempt `i` uses template `i mod template_count`.
pub fn round_robin(attempt: usize, template_count: usize) -> usize {
    attempt % template_count
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    Idle,
    Running,
    /// The placement algorithm found no node for the next candidate.
    Exhausted,
    /// The configured replica ceiling has been reached.
    LimitReached,
    /// The placement algorithm failed.
    Failed,
}

impl SimulationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SimulationState::Exhausted | SimulationState::LimitReached | SimulationState::Failed
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedInstance {
    pub pod_name: String,
    pub node_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopSignal {
    Exhausted(Infeasibility),
    LimitReached { limit: u32 },
    Failed { cause: String },
}

/// Placed candidates in submission order and the signal that terminated the run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationStatus {
    pub placed: Vec<PlacedInstance>,
    pub stop: Option<StopSignal>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SimulationStatus {
    pub fn replicas(&self) -> usize {
        self.placed.len()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("simulation has already terminated")]
    AlreadyTerminated,
    #[error("no workload templates to simulate")]
    NoTemplates,
    #[error("simulation has not terminated yet")]
    NotTerminated,
}

pub struct CapacitySimulation {
    templates: Vec<Pod>,
    store: ClusterStore,
    algorithm: Box<dyn PlacementAlgorithm>,
    max_replicas: Option<u32>,
    attribution: Attribution,

    state: SimulationState,
    status: SimulationStatus,
    /// Sequence number of the next candidate pod.
    sequence: u64,

    metrics: MetricsCollector,
}

impl CapacitySimulation {
    /// The store must already contain the baseline cluster objects.
    pub fn new(
        templates: Vec<Pod>,
        store: ClusterStore,
        algorithm: Box<dyn PlacementAlgorithm>,
    ) -> Self {
        Self {
            templates,
            store,
            algorithm,
            max_replicas: None,
            attribution: round_robin,
            state: SimulationState::Idle,
            status: Default::default(),
            sequence: 0,
            metrics: MetricsCollector::new(),
        }
    }

    pub fn with_max_replicas(mut self, max_replicas: Option<u32>) -> Self {
        self.max_replicas = max_replicas;
        self
    }

    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = attribution;
        self
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn status(&self) -> &SimulationStatus {
        &self.status
    }

    pub fn store(&self) -> &ClusterStore {
        &self.store
    }

    pub fn templates(&self) -> &[Pod] {
        &self.templates
    }

    pub fn max_replicas(&self) -> Option<u32> {
        self.max_replicas
    }

    pub fn attribution(&self) -> Attribution {
        self.attribution
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Runs the simulation to one of its terminal states. A simulation runs only once.
    pub fn run(&mut self) -> Result<SimulationState, SimulationError> {
        if self.state != SimulationState::Idle {
            return Err(SimulationError::AlreadyTerminated);
        }
        if self.templates.is_empty() {
            return Err(SimulationError::NoTemplates);
        }

        info!(
            "Starting capacity simulation of {} template(s), replica ceiling: {:?}",
            self.templates.len(),
            self.max_replicas
        );
        self.state = SimulationState::Running;
        while self.state == SimulationState::Running {
            self.step();
        }

        info!(
            "Capacity simulation finished in state {:?} with {} placed pod(s)",
            self.state,
            self.status.replicas()
        );
        self.metrics.log_summary();
        Ok(self.state)
    }

    /// Builds the review of a terminated simulation.
    pub fn review(&self) -> Result<ClusterCapacityReview, SimulationError> {
        let stop = self
            .status
            .stop
            .as_ref()
            .ok_or(SimulationError::NotTerminated)?;
        let classified = classify_stop(stop);
        Ok(build_review(
            &self.templates,
            self.max_replicas,
            &self.status,
            &classified,
            self.attribution,
        ))
    }

    fn step(&mut self) {
        let attempt = self.status.replicas();
        if let Some(limit) = self.max_replicas {
            if attempt >= limit as usize {
                self.finish(
                    SimulationState::LimitReached,
                    StopSignal::LimitReached { limit },
                );
                return;
            }
        }

        let template_index = (self.attribution)(attempt, self.templates.len());
        let Some(candidate) = self.next_candidate(template_index) else {
            let cause = format!(
                "attribution selected template {} out of {}",
                template_index,
                self.templates.len()
            );
            self.finish(SimulationState::Failed, StopSignal::Failed { cause });
            return;
        };
        let pod_key = candidate.key();
        let pod_name = candidate.metadata.name.clone();

        let placement_start = Instant::now();
        let outcome = self.algorithm.place(candidate, &mut self.store);
        self.metrics
            .increment_placement_latency(placement_start.elapsed().as_secs_f64());

        match outcome {
            PlacementOutcome::Placed { node_name } => {
                let bound_node = self.store.get::<Pod>(&pod_key).and_then(Pod::node_name);
                if bound_node != Some(node_name.as_str()) {
                    let cause = format!(
                        "pod {:?} reported as placed on node {:?} but the store has it on {:?}",
                        pod_key, node_name, bound_node
                    );
                    self.finish(SimulationState::Failed, StopSignal::Failed { cause });
                    return;
                }
                debug!("Pod {:?} placed on node {:?}", pod_name, node_name);
                self.metrics.increment_pods_placed();
                self.status.placed.push(PlacedInstance {
                    pod_name,
                    node_name,
                });
            }
            PlacementOutcome::Infeasible(infeasibility) => {
                debug!("Pod {:?} does not fit: {:?}", pod_name, infeasibility);
                self.finish(
                    SimulationState::Exhausted,
                    StopSignal::Exhausted(infeasibility),
                );
            }
            PlacementOutcome::Error(err) => {
                warn!("Placement of pod {:?} failed: {}", pod_name, err);
                self.finish(
                    SimulationState::Failed,
                    StopSignal::Failed {
                        cause: err.to_string(),
                    },
                );
            }
        }
    }

    /// Deep copy of a template with a fresh sequence numbered identity.
    fn next_candidate(&mut self, template_index: usize) -> Option<Pod> {
        let template = self.templates.get(template_index)?;
        let mut candidate = template.clone();
        candidate.metadata.name = format!("{}-{}", template.metadata.name, self.sequence);
        candidate.metadata.namespace = Some(template.namespace().to_string());
        candidate.spec.node_name = None;
        self.sequence += 1;
        Some(candidate)
    }

    fn finish(&mut self, state: SimulationState, stop: StopSignal) {
        self.state = state;
        self.status.stop = Some(stop);
        self.status.finished_at = Some(Utc::now());
    }
}
