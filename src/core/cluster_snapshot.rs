//! Baseline cluster state a capacity simulation starts from.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::core::cluster_store::{ClusterStore, StoreError};
use crate::core::node::{Namespace, Node};
use crate::core::pod::Pod;

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClusterSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub namespaces: Vec<Namespace>,
    /// Pods already running in the cluster. Bound pods consume capacity of their node.
    #[serde(default)]
    pub pods: Vec<Pod>,
}

impl ClusterSnapshot {
    /// Adds every snapshot object to the store, stopping at the first duplicate identity.
    pub fn populate(self, store: &mut ClusterStore) -> Result<(), StoreError> {
        info!(
            "Populating cluster store with {} node(s), {} namespace(s) and {} pod(s)",
            self.nodes.len(),
            self.namespaces.len(),
            self.pods.len()
        );
        for node in self.nodes {
            store.add(node)?;
        }
        for namespace in self.namespaces {
            store.add(namespace)?;
        }
        for pod in self.pods {
            if let Some(node_name) = pod.node_name() {
                if store.get::<Node>(node_name).is_none() {
                    warn!(
                        "Pod {:?} is bound to node {:?} which is not in the snapshot",
                        pod.key(),
                        node_name
                    );
                }
            }
            store.add(pod)?;
        }
        Ok(())
    }

    pub fn into_store(self) -> Result<ClusterStore, StoreError> {
        let mut store = ClusterStore::new();
        self.populate(&mut store)?;
        Ok(store)
    }
}
