//! Type definitions for node and namespace objects held by the cluster store and read from
//! cluster snapshots.

use serde::{Deserialize, Serialize};

use crate::core::common::{ObjectMeta, ResourceList};
use crate::core::quantity::Quantity;

#[derive(Default, Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NodeSpec {
    /// Cordoned nodes accept no new pods.
    #[serde(default)]
    pub unschedulable: bool,
}

#[derive(Default, Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NodeStatus {
    // Total amount of resources
    #[serde(default)]
    pub capacity: ResourceList,
    // Resources available for pods, defaults to capacity for every resource missing here.
    #[serde(default)]
    pub allocatable: ResourceList,
}

#[derive(Default, Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Node {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: NodeSpec,
    #[serde(default)]
    pub status: NodeStatus,
}

impl Node {
    pub fn new(name: &str, allocatable: ResourceList) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
            spec: Default::default(),
            status: NodeStatus {
                capacity: allocatable.clone(),
                allocatable,
            },
        }
    }

    /// Allocatable amount of a resource with fallback to capacity.
    pub fn allocatable(&self, resource: &str) -> Option<&Quantity> {
        self.status
            .allocatable
            .get(resource)
            .or_else(|| self.status.capacity.get(resource))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Namespace {
    pub metadata: ObjectMeta,
}

impl Namespace {
    pub fn new(name: &str) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
        }
    }
}
