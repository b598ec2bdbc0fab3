//! Builders shared by unit and integration tests.

use crate::config::SimulationConfig;
use crate::core::cluster_store::ClusterStore;
use crate::core::common::ResourceList;
use crate::core::node::Node;
use crate::core::pod::Pod;

/// Resource list with cpu and memory given as quantity strings, panics on malformed input.
pub fn resources(cpu: &str, memory: &str) -> ResourceList {
    ResourceList::from([
        ("cpu".to_string(), cpu.parse().unwrap()),
        ("memory".to_string(), memory.parse().unwrap()),
    ])
}

pub fn pod_template(name: &str, cpu: &str, memory: &str) -> Pod {
    Pod::new(name, resources(cpu, memory))
}

/// Store holding identical nodes `node_0`, `node_1`, ...
pub fn store_with_nodes(count: usize, cpu: &str, memory: &str) -> ClusterStore {
    let mut store = ClusterStore::new();
    for idx in 0..count {
        store
            .add(Node::new(&format!("node_{}", idx), resources(cpu, memory)))
            .unwrap();
    }
    store
}

pub fn default_test_simulation_config(with_suffix: Option<&str>) -> SimulationConfig {
    let mut default = r#"
    sim_name: "test_kubernetriks_capacity"
    "#
    .to_string();

    if let Some(suffix) = with_suffix {
        default.push_str(suffix);
    }

    serde_yaml::from_str::<SimulationConfig>(&default).unwrap()
}
