use std::collections::BTreeMap;

use kubernetriks_capacity::core::cluster_store::ClusterStore;
use kubernetriks_capacity::core::pod::Pod;
use kubernetriks_capacity::core::scheduler::kube_scheduler::KubeScheduler;
use kubernetriks_capacity::review::types::ClusterCapacityReview;
use kubernetriks_capacity::simulator::CapacitySimulation;

pub fn kube_simulation(
    templates: Vec<Pod>,
    store: ClusterStore,
    max_replicas: Option<u32>,
) -> CapacitySimulation {
    CapacitySimulation::new(templates, store, Box::new(KubeScheduler::default()))
        .with_max_replicas(max_replicas)
}

pub fn replicas_on_nodes(review: &ClusterCapacityReview, template: usize) -> BTreeMap<&str, u64> {
    review.status.pods[template]
        .replicas_on_nodes
        .iter()
        .map(|(node, count)| (node.as_str(), *count))
        .collect()
}

pub fn check_replicas_match_placements(review: &ClusterCapacityReview) {
    let total: u64 = review.status.pods.iter().map(|pod| pod.instances()).sum();
    assert_eq!(review.status.replicas as u64, total);
}
