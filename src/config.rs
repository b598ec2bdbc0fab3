//! Config fields definitions and loaders of the inputs of a capacity simulation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;
use thiserror::Error;

use crate::core::cluster_snapshot::ClusterSnapshot;
use crate::core::cluster_store::{ClusterStore, StoreError};
use crate::core::node::Node;
use crate::core::pod::Pod;
use crate::core::resources::ResourceDemand;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path:?}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid pod template {path:?}: {detail}")]
    InvalidTemplate { path: PathBuf, detail: String },
    #[error("invalid cluster: {0}")]
    Cluster(#[from] StoreError),
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub sim_name: String,
    /// Replica ceiling, zero or unset means the cluster is filled until exhaustion.
    pub max_limit: Option<u32>,
    /// One of `pretty`, `json`, `yaml`, the pretty summary if not set.
    pub output_format: Option<String>,
    pub verbose: bool,
    /// If not set default output of logs is stdout/stderr
    pub logs_filepath: Option<String>,
    /// Namespace of templates which do not set one.
    pub default_namespace: Option<String>,
    /// Nodes added to the baseline cluster on top of the snapshot.
    pub default_cluster: Option<Vec<NodeGroup>>,
}

#[derive(Clone, Default, Debug, Deserialize, PartialEq)]
pub struct NodeGroup {
    // If node count is not none and node's metadata has name, then it's taken as a prefix of all nodes
    // in a group.
    // If node count is none or 1 and node's metadata has name, then it's a single node and its name is set
    // to metadata name.
    // If metadata has got no name, then prefix default_node(_<idx>)? is used.
    pub node_count: Option<u64>,
    pub node_template: Node,
}

/// Materializes node groups into nodes. Generated names are suffixed with an index which runs
/// through all the groups.
pub fn expand_node_groups(node_groups: &[NodeGroup]) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut total_nodes = 0;
    for node_group in node_groups.iter() {
        let node_count_in_group = node_group.node_count.unwrap_or(1);
        let template_name = &node_group.node_template.metadata.name;

        if node_count_in_group == 1 && !template_name.is_empty() {
            nodes.push(node_group.node_template.clone());
            continue;
        }
        let name_prefix = if template_name.is_empty() {
            "default_node"
        } else {
            template_name.as_str()
        };

        for _ in 0..node_count_in_group {
            let mut node = node_group.node_template.clone();
            node.metadata.name = format!("{}_{}", name_prefix, total_nodes);
            nodes.push(node);
            total_nodes += 1;
        }
    }
    nodes
}

fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&yaml).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_config(path: &Path) -> Result<SimulationConfig, ConfigError> {
    info!("Path to config file: {:?}", path);
    read_yaml(path)
}

/// Baseline cluster store built from an optional snapshot file and the configured default cluster.
pub fn load_cluster_store(
    snapshot_path: Option<&Path>,
    config: &SimulationConfig,
) -> Result<ClusterStore, ConfigError> {
    let mut snapshot = match snapshot_path {
        Some(path) => {
            info!("Path to cluster snapshot file: {:?}", path);
            read_yaml::<ClusterSnapshot>(path)?
        }
        None => ClusterSnapshot::default(),
    };
    if let Some(node_groups) = &config.default_cluster {
        snapshot.nodes.extend(expand_node_groups(node_groups));
    }
    Ok(snapshot.into_store()?)
}

/// Reads one pod template and checks it can be simulated: it must be named and request some
/// amount of at least one resource the simulation accounts for.
pub fn load_pod_template(path: &Path, default_namespace: Option<&str>) -> Result<Pod, ConfigError> {
    info!("Path to pod template file: {:?}", path);
    let mut template: Pod = read_yaml(path)?;
    let invalid = |detail: &str| ConfigError::InvalidTemplate {
        path: path.to_path_buf(),
        detail: detail.to_string(),
    };

    if template.metadata.name.is_empty() {
        return Err(invalid("metadata.name is required"));
    }
    if ResourceDemand::of_pod(&template).is_zero() {
        return Err(invalid("pod requests no cpu, memory or accelerator resources"));
    }
    if template.metadata.namespace.is_none() {
        template.metadata.namespace = default_namespace.map(ToString::to_string);
    }
    template.spec.node_name = None;
    Ok(template)
}

pub fn load_pod_templates(
    paths: &[PathBuf],
    default_namespace: Option<&str>,
) -> Result<Vec<Pod>, ConfigError> {
    let mut names = HashSet::new();
    let mut templates = Vec::with_capacity(paths.len());
    for path in paths.iter() {
        let template = load_pod_template(path, default_namespace)?;
        if !names.insert(template.metadata.name.clone()) {
            return Err(ConfigError::InvalidTemplate {
                path: path.clone(),
                detail: format!("duplicate template name {:?}", template.metadata.name),
            });
        }
        templates.push(template);
    }
    Ok(templates)
}
