use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::cluster_store::{ClusterStore, StoreError};
use crate::core::pod::Pod;

#[derive(Debug, Error, PartialEq)]
pub enum PlacementError {
    #[error("pod {0:?} requests zero of every resource")]
    RequestedResourcesAreZeros(String),
    #[error("scheduler profile {0:?} is not configured")]
    UnknownSchedulerProfile(String),
    #[error("plugin {0:?} is not registered as a {1} plugin")]
    UnknownPlugin(String, &'static str),
    #[error("failed to bind pod: {0}")]
    Binding(#[from] StoreError),
    #[error("{0}")]
    Internal(String),
}

/// Infeasibility reported in structured form, bypassing diagnostic text parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct FitFailure {
    pub fail_type: String,
    pub fail_message: String,
    /// Failure cause to the number of nodes failing with it.
    pub node_failures: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Infeasibility {
    /// Free text: a `<FailType>: <FailMessage>` line optionally followed by a line listing
    /// `<cause> (<count>)` entries separated by commas.
    Diagnostic(String),
    Structured(FitFailure),
}

#[derive(Debug, PartialEq)]
pub enum PlacementOutcome {
    /// The pod has been written to the store bound to `node_name`.
    Placed { node_name: String },
    /// No node can accommodate the pod. The store is left untouched.
    Infeasible(Infeasibility),
    /// The algorithm failed. The store is left untouched.
    Error(PlacementError),
}

// Trait which should implement any placement algorithm driven by a capacity simulation.
pub trait PlacementAlgorithm {
    // Tries to place the candidate pod on one of the nodes known to the store. On success the
    // algorithm itself commits the binding by writing the pod into the store.
    fn place(&mut self, candidate: Pod, store: &mut ClusterStore) -> PlacementOutcome;
}
