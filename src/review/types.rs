//! Type definitions of the cluster capacity review document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::pod::Pod;
use crate::core::resources::ResourceDemand;

pub const REVIEW_KIND: &str = "ClusterCapacityReview";
pub const REVIEW_API_VERSION: &str = "v1alpha1";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCapacityReview {
    pub kind: String,
    pub api_version: String,
    pub spec: ClusterCapacityReviewSpec,
    pub status: ClusterCapacityReviewStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCapacityReviewSpec {
    // the pods desired for scheduling
    pub templates: Vec<Pod>,
    // desired number of replicas that should be scheduled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
    pub pod_requirements: Vec<Requirements>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    pub pod_name: String,
    pub resources: ResourceDemand,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selectors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCapacityReviewStatus {
    pub creation_timestamp: Option<DateTime<Utc>>,
    // actual number of replicas that could schedule
    pub replicas: u32,
    pub fail_reason: Option<FailReason>,
    // per template information about the scheduling simulation
    pub pods: Vec<ClusterCapacityReviewResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailReason {
    pub fail_type: String,
    pub fail_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCapacityReviewResult {
    pub pod_name: String,
    // numbers of replicas on nodes
    pub replicas_on_nodes: BTreeMap<String, u64>,
    // reason why no more pods could schedule: [reason] number of nodes with that reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_summary: Option<BTreeMap<String, u64>>,
}

impl ClusterCapacityReviewResult {
    pub fn instances(&self) -> u64 {
        self.replicas_on_nodes.values().sum()
    }
}
