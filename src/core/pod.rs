//! Type definition for Pod primitive in k8s cluster. Pods are both the workload templates a
//! capacity review is asked about and the candidate instances generated from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::common::{ObjectMeta, ResourceList, DEFAULT_NAMESPACE};

#[derive(Default, Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ResourceRequirements {
    #[serde(default, skip_serializing_if = "ResourceList::is_empty")]
    pub limits: ResourceList,
    #[serde(default, skip_serializing_if = "ResourceList::is_empty")]
    pub requests: ResourceList,
}

#[derive(Default, Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Container {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub resources: ResourceRequirements,
}

#[derive(Default, Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    #[serde(default)]
    pub containers: Vec<Container>,
    /// Labels a node must carry for the pod to fit on it.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,
    /// Node the pod is bound to, empty for pods waiting for placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Pod {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PodSpec,
}

impl Pod {
    /// Single container pod requesting the given resources.
    pub fn new(name: &str, requests: ResourceList) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
            spec: PodSpec {
                containers: vec![Container {
                    name: "main".to_string(),
                    resources: ResourceRequirements {
                        limits: requests.clone(),
                        requests,
                    },
                }],
                ..Default::default()
            },
        }
    }

    pub fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }

    /// Store key of a pod, pods are unique per namespace.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace(), self.metadata.name)
    }

    pub fn node_name(&self) -> Option<&str> {
        self.spec.node_name.as_deref()
    }
}
