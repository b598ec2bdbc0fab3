//! Reference implementation of a placement algorithm which mimics kube-scheduler: nodes are
//! filtered with filter plugins, the rest are scored with score plugins and the pod is bound to the
//! node with the highest score.

use std::collections::BTreeMap;

use log::debug;
use serde::Deserialize;

use crate::core::cluster_store::ClusterStore;
use crate::core::pod::Pod;
use crate::core::resources::ResourceDemand;
use crate::core::scheduler::cache::{NodeInfo, SchedulerCache};
use crate::core::scheduler::interface::{
    Infeasibility, PlacementAlgorithm, PlacementError, PlacementOutcome,
};
use crate::core::scheduler::plugin::{PluginType, PLUGIN_REGISTRY};

pub const DEFAULT_SCHEDULER_NAME: &str = "default_scheduler";

/// Label selecting a scheduler profile for a pod.
pub const SCHEDULER_NAME_LABEL: &str = "scheduler_name";

pub const NO_NODES_MESSAGE: &str = "Unschedulable: no nodes available to schedule pods";

#[derive(Debug, Deserialize, PartialEq)]
pub struct KubeSchedulerConfig {
    // Map from scheduler name to scheduler profile
    pub profiles: BTreeMap<String, KubeSchedulerProfile>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct KubeSchedulerProfile {
    pub plugins: Plugins,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct Plugins {
    // Each extension point is a list of enabled plugins which are registered globally in plugin registry.
    pub filter: Vec<Plugin>,
    pub score: Vec<Plugin>,
}

// Plugin specifies a plugin name and its weight when applicable.
#[derive(Debug, Deserialize, PartialEq)]
pub struct Plugin {
    pub name: String,
    // Weight is used only for Score plugins.
    #[serde(default)]
    pub weight: Option<f64>,
}

impl Plugin {
    fn named(name: &str, weight: Option<f64>) -> Self {
        Self {
            name: name.to_string(),
            weight,
        }
    }
}

impl Default for KubeSchedulerConfig {
    fn default() -> Self {
        default_kube_scheduler_config()
    }
}

pub fn default_kube_scheduler_config() -> KubeSchedulerConfig {
    let default_profile = KubeSchedulerProfile {
        plugins: Plugins {
            filter: vec![
                Plugin::named("NodeUnschedulable", None),
                Plugin::named("NodeSelector", None),
                Plugin::named("NodeResourcesFit", None),
            ],
            score: vec![Plugin::named("LeastAllocatedResources", Some(1.0))],
        },
    };
    KubeSchedulerConfig {
        profiles: BTreeMap::from([(DEFAULT_SCHEDULER_NAME.to_string(), default_profile)]),
    }
}

/// Two line diagnostic in the form kube-scheduler reports fit errors.
pub fn fit_error_message(pod_name: &str, node_failures: &BTreeMap<String, u64>) -> String {
    let summary: Vec<String> = node_failures
        .iter()
        .map(|(reason, nodes)| format!("{} ({})", reason, nodes))
        .collect();
    format!(
        "Unschedulable: pod ({}) failed to fit in any node\nfit failure summary on nodes : {}",
        pod_name,
        summary.join(", ")
    )
}

#[derive(Debug, PartialEq)]
pub enum ScheduleError {
    NoNodesInCluster,
    /// Failure reasons mapped to the number of nodes failing with them.
    NoSufficientNodes(BTreeMap<String, u64>),
    Failed(PlacementError),
}

impl From<PlacementError> for ScheduleError {
    fn from(err: PlacementError) -> Self {
        ScheduleError::Failed(err)
    }
}

#[derive(Default)]
pub struct KubeScheduler {
    // Profiles are scheduling profiles that kube-scheduler supports. Pods can
    // choose to be scheduled under a particular profile by setting its associated
    // scheduler name in labels. Pods that don't specify any scheduler name are scheduled
    // with the "default_scheduler" profile, if present here.
    pub config: KubeSchedulerConfig,
    cache: SchedulerCache,
}

impl KubeScheduler {
    pub fn new(config: KubeSchedulerConfig) -> Self {
        Self {
            config,
            cache: Default::default(),
        }
    }

    pub fn cache(&self) -> &SchedulerCache {
        &self.cache
    }

    fn profile_for(&self, pod: &Pod) -> Result<&KubeSchedulerProfile, PlacementError> {
        let scheduler_name = pod
            .metadata
            .labels
            .get(SCHEDULER_NAME_LABEL)
            .map(String::as_str)
            .unwrap_or(DEFAULT_SCHEDULER_NAME);
        self.config
            .profiles
            .get(scheduler_name)
            .ok_or_else(|| PlacementError::UnknownSchedulerProfile(scheduler_name.to_string()))
    }

    /// Reasons of the first filter plugin rejecting the node, empty when the node fits.
    fn filter_node(
        &self,
        profile: &KubeSchedulerProfile,
        pod: &Pod,
        demand: &ResourceDemand,
        node: &NodeInfo,
    ) -> Result<Vec<String>, PlacementError> {
        for filter in profile.plugins.filter.iter() {
            match PLUGIN_REGISTRY.get(filter.name.as_str()) {
                Some(PluginType::FilterPlugin(filter_plugin)) => {
                    let reasons = filter_plugin.filter(pod, demand, node);
                    if !reasons.is_empty() {
                        return Ok(reasons);
                    }
                }
                _ => return Err(PlacementError::UnknownPlugin(filter.name.clone(), "filter")),
            }
        }
        Ok(vec![])
    }

    pub fn schedule_one(&self, pod: &Pod) -> Result<String, ScheduleError> {
        let demand = ResourceDemand::of_pod(pod);
        if demand.is_zero() {
            return Err(
                PlacementError::RequestedResourcesAreZeros(pod.metadata.name.clone()).into(),
            );
        }
        let profile = self.profile_for(pod)?;
        if self.cache.node_count() == 0 {
            return Err(ScheduleError::NoNodesInCluster);
        }

        let mut filtered_nodes: Vec<&NodeInfo> = vec![];
        let mut node_failures: BTreeMap<String, u64> = Default::default();
        for node in self.cache.nodes() {
            let reasons = self.filter_node(profile, pod, &demand, node)?;
            if reasons.is_empty() {
                filtered_nodes.push(node);
            }
            for reason in reasons {
                *node_failures.entry(reason).or_default() += 1;
            }
        }

        if filtered_nodes.is_empty() {
            return Err(ScheduleError::NoSufficientNodes(node_failures));
        }

        let mut node_scores = vec![0.0; filtered_nodes.len()];
        for scorer in profile.plugins.score.iter() {
            let Some(PluginType::ScorePlugin(score_plugin)) =
                PLUGIN_REGISTRY.get(scorer.name.as_str())
            else {
                return Err(PlacementError::UnknownPlugin(scorer.name.clone(), "score").into());
            };
            let weight = scorer.weight.unwrap_or(1.0);
            for (node, score) in filtered_nodes.iter().zip(node_scores.iter_mut()) {
                *score += score_plugin.score(&demand, node) * weight;
            }
        }

        // Nodes are ordered by name, strict comparison keeps the first of equally scored nodes.
        let mut assigned_node = 0;
        for (idx, score) in node_scores.iter().enumerate() {
            if *score > node_scores[assigned_node] {
                assigned_node = idx;
            }
        }

        Ok(filtered_nodes[assigned_node].name().to_string())
    }
}

impl PlacementAlgorithm for KubeScheduler {
    fn place(&mut self, mut candidate: Pod, store: &mut ClusterStore) -> PlacementOutcome {
        self.cache.sync(store);

        let node_name = match self.schedule_one(&candidate) {
            Ok(node_name) => node_name,
            Err(ScheduleError::NoNodesInCluster) => {
                return PlacementOutcome::Infeasible(Infeasibility::Diagnostic(
                    NO_NODES_MESSAGE.to_string(),
                ))
            }
            Err(ScheduleError::NoSufficientNodes(node_failures)) => {
                debug!(
                    "failed to schedule pod {:?}: {:?}",
                    candidate.metadata.name, node_failures
                );
                return PlacementOutcome::Infeasible(Infeasibility::Diagnostic(fit_error_message(
                    &candidate.metadata.name,
                    &node_failures,
                )));
            }
            Err(ScheduleError::Failed(err)) => return PlacementOutcome::Error(err),
        };

        candidate.spec.node_name = Some(node_name.clone());
        let pod_name = candidate.metadata.name.clone();
        match store.add(candidate) {
            Ok(()) => {
                debug!("Pod {:?} has been assigned a Node {:?}", pod_name, node_name);
                PlacementOutcome::Placed { node_name }
            }
            Err(err) => PlacementOutcome::Error(err.into()),
        }
    }
}
