//! Scheduler cache of nodes and the resources already requested on them. The cache is fed only
//! by cluster store watch events, the same way an informer feeds kube-scheduler.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};

use crate::core::cluster_store::{ClusterStore, WatchCursor};
use crate::core::node::Node;
use crate::core::pod::Pod;
use crate::core::quantity::Quantity;
use crate::core::resources::ResourceDemand;

#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub node: Node,
    /// Sum of requests of all pods bound to the node.
    pub requested: ResourceDemand,
    pub pod_count: u64,
}

impl NodeInfo {
    fn new(node: Node) -> Self {
        Self {
            node,
            requested: Default::default(),
            pod_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.node.metadata.name
    }

    pub fn allocatable(&self, resource: &str) -> Option<&Quantity> {
        self.node.allocatable(resource)
    }

    fn reserve(&mut self, demand: &ResourceDemand) {
        self.requested.add(demand);
        self.pod_count += 1;
    }

    fn release(&mut self, demand: &ResourceDemand) {
        self.requested.sub(demand);
        self.pod_count = self.pod_count.saturating_sub(1);
    }
}

#[derive(Debug, Default)]
pub struct SchedulerCache {
    cursor: WatchCursor,
    nodes: BTreeMap<String, NodeInfo>,
    /// Bound pods: pod key to the node name and the demand accounted for it.
    bound_pods: HashMap<String, (String, ResourceDemand)>,
}

impl SchedulerCache {
    /// Applies every store write not seen yet.
    pub fn sync(&mut self, store: &ClusterStore) {
        for event in store.poll(&mut self.cursor) {
            if let Some(node) = event.object.downcast_ref::<Node>() {
                self.upsert_node(node);
            } else if let Some(pod) = event.object.downcast_ref::<Pod>() {
                self.upsert_pod(pod);
            }
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeInfo> {
        self.nodes.values()
    }

    pub fn get_node(&self, node_name: &str) -> Option<&NodeInfo> {
        self.nodes.get(node_name)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn upsert_node(&mut self, node: &Node) {
        let node_name = node.metadata.name.clone();
        match self.nodes.get_mut(&node_name) {
            Some(info) => info.node = node.clone(),
            None => {
                let mut info = NodeInfo::new(node.clone());
                // Pods may have been bound before the node itself was observed.
                for (bound_node, demand) in self.bound_pods.values() {
                    if *bound_node == node_name {
                        info.reserve(demand);
                    }
                }
                self.nodes.insert(node_name, info);
            }
        }
    }

    fn upsert_pod(&mut self, pod: &Pod) {
        let pod_key = pod.key();
        if let Some((previous_node, demand)) = self.bound_pods.remove(&pod_key) {
            if let Some(info) = self.nodes.get_mut(&previous_node) {
                info.release(&demand);
            }
        }

        let Some(node_name) = pod.node_name() else {
            return;
        };
        let demand = ResourceDemand::of_pod(pod);
        match self.nodes.get_mut(node_name) {
            Some(info) => {
                info.reserve(&demand);
                debug!(
                    "Cache: pod {:?} accounted on node {:?}, {} pods there",
                    pod_key, node_name, info.pod_count
                );
            }
            None => warn!(
                "Cache: pod {:?} is bound to node {:?} which is not known yet",
                pod_key, node_name
            ),
        }
        self.bound_pods
            .insert(pod_key, (node_name.to_string(), demand));
    }
}
