use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::core::common::{RESOURCE_CPU, RESOURCE_MEMORY, RESOURCE_NVIDIA_GPU, RESOURCE_PODS};
use crate::core::pod::Pod;
use crate::core::quantity::Quantity;
use crate::core::resources::ResourceDemand;
use crate::core::scheduler::cache::NodeInfo;

pub enum PluginType {
    FilterPlugin(Box<dyn FilterPlugin>),
    ScorePlugin(Box<dyn ScorePlugin>),
}

lazy_static! {
    pub static ref PLUGIN_REGISTRY: HashMap<&'static str, PluginType> = {
        HashMap::from([
            (
                "NodeUnschedulable",
                PluginType::FilterPlugin(Box::new(NodeUnschedulable {})),
            ),
            (
                "NodeSelector",
                PluginType::FilterPlugin(Box::new(NodeSelector {})),
            ),
            (
                "NodeResourcesFit",
                PluginType::FilterPlugin(Box::new(NodeResourcesFit {})),
            ),
            (
                "LeastAllocatedResources",
                PluginType::ScorePlugin(Box::new(LeastAllocatedResources {})),
            ),
        ])
    };
}

pub trait FilterPlugin: Send + Sync {
    /// Reasons the pod does not fit the node, empty when it fits.
    fn filter(&self, pod: &Pod, demand: &ResourceDemand, node: &NodeInfo) -> Vec<String>;
}

pub trait ScorePlugin: Send + Sync {
    fn score(&self, demand: &ResourceDemand, node: &NodeInfo) -> f64;
}

// NodeUnschedulable filters out cordoned nodes.
pub struct NodeUnschedulable {}
impl FilterPlugin for NodeUnschedulable {
    fn filter(&self, _pod: &Pod, _demand: &ResourceDemand, node: &NodeInfo) -> Vec<String> {
        if node.node.spec.unschedulable {
            vec!["NodeUnschedulable".to_string()]
        } else {
            vec![]
        }
    }
}

// NodeSelector requires every label of pod's node selector to be set on the node.
pub struct NodeSelector {}
impl FilterPlugin for NodeSelector {
    fn filter(&self, pod: &Pod, _demand: &ResourceDemand, node: &NodeInfo) -> Vec<String> {
        let labels = &node.node.metadata.labels;
        let matches = pod
            .spec
            .node_selector
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value));
        if matches {
            vec![]
        } else {
            vec!["MatchNodeSelector".to_string()]
        }
    }
}

fn insufficient(resource: &str) -> String {
    format!("Insufficient {}", resource)
}

fn fits(requested: &Quantity, demand: &Quantity, allocatable: Option<&Quantity>) -> bool {
    if demand.is_zero() {
        return true;
    }
    let allocatable = allocatable.map_or(0, Quantity::milli_value);
    requested.milli_value().saturating_add(demand.milli_value()) <= allocatable
}

// NodeResourcesFit checks if a node has sufficient resources left for the pod, including the
// number of pods a node accepts.
pub struct NodeResourcesFit {}
impl FilterPlugin for NodeResourcesFit {
    fn filter(&self, _pod: &Pod, demand: &ResourceDemand, node: &NodeInfo) -> Vec<String> {
        let mut reasons = vec![];

        if let Some(max_pods) = node.allocatable(RESOURCE_PODS) {
            if node.pod_count + 1 > max_pods.value() {
                reasons.push(insufficient(RESOURCE_PODS));
            }
        }
        let dimensions = [
            (RESOURCE_CPU, &node.requested.cpu, &demand.cpu),
            (RESOURCE_MEMORY, &node.requested.memory, &demand.memory),
            (RESOURCE_NVIDIA_GPU, &node.requested.nvidia_gpu, &demand.nvidia_gpu),
        ];
        for (resource, requested, wanted) in dimensions {
            if !fits(requested, wanted, node.allocatable(resource)) {
                reasons.push(insufficient(resource));
            }
        }
        for (resource, wanted) in demand.opaque_int_resources.iter() {
            if *wanted == 0 {
                continue;
            }
            let requested = node
                .requested
                .opaque_int_resources
                .get(resource)
                .copied()
                .unwrap_or(0);
            let allocatable = node.allocatable(resource).map_or(0, Quantity::value);
            if requested.saturating_add(*wanted) > allocatable {
                reasons.push(insufficient(resource));
            }
        }
        reasons
    }
}

fn free_percentage(requested: &Quantity, demand: &Quantity, allocatable: Option<&Quantity>) -> f64 {
    let allocatable = allocatable.map_or(0, Quantity::milli_value);
    if allocatable == 0 {
        return 0.0;
    }
    let used = requested.milli_value().saturating_add(demand.milli_value());
    allocatable.saturating_sub(used) as f64 * 100.0 / allocatable as f64
}

// Least allocated resources plugin is a score plugin. Its score means that after subtracting pod's
// requested resources from node's free resources, the node with the highest free percentage
// (relatively to allocatable) is prioritized for scheduling.
//
// Weights for cpu and memory are equal.
pub struct LeastAllocatedResources {}
impl ScorePlugin for LeastAllocatedResources {
    fn score(&self, demand: &ResourceDemand, node: &NodeInfo) -> f64 {
        let cpu_score = free_percentage(
            &node.requested.cpu,
            &demand.cpu,
            node.allocatable(RESOURCE_CPU),
        );
        let ram_score = free_percentage(
            &node.requested.memory,
            &demand.memory,
            node.allocatable(RESOURCE_MEMORY),
        );
        (cpu_score + ram_score) / 2.0
    }
}
