mod helpers;

use std::collections::BTreeMap;

use kubernetriks_capacity::core::cluster_snapshot::ClusterSnapshot;
use kubernetriks_capacity::core::cluster_store::{ClusterStore, ObjectKind};
use kubernetriks_capacity::core::node::Node;
use kubernetriks_capacity::core::pod::Pod;
use kubernetriks_capacity::core::scheduler::kube_scheduler::SCHEDULER_NAME_LABEL;
use kubernetriks_capacity::simulator::SimulationState;
use kubernetriks_capacity::test_util::helpers::{pod_template, resources, store_with_nodes};

use helpers::{check_replicas_match_placements, kube_simulation, replicas_on_nodes};

#[test]
fn test_cluster_is_filled_until_exhausted() {
    let _ = env_logger::try_init();

    let store = store_with_nodes(2, "4", "8Gi");
    let mut sim = kube_simulation(vec![pod_template("web", "1", "1Gi")], store, None);

    assert_eq!(Ok(SimulationState::Exhausted), sim.run());
    assert_eq!(8, sim.status().replicas());
    assert_eq!(8, sim.store().count(ObjectKind::Pod));

    let review = sim.review().unwrap();
    assert_eq!(8, review.status.replicas);
    assert_eq!(
        BTreeMap::from([("node_0", 4), ("node_1", 4)]),
        replicas_on_nodes(&review, 0)
    );
    let fail_reason = review.status.fail_reason.as_ref().unwrap();
    assert_eq!("Unschedulable", fail_reason.fail_type);
    assert_eq!("pod (web-8) failed to fit in any node", fail_reason.fail_message);
    assert_eq!(
        Some(BTreeMap::from([("Insufficient cpu".to_string(), 2)])),
        review.status.pods[0].fail_summary
    );
    assert_eq!(
        review.status.creation_timestamp,
        sim.status().finished_at
    );
}

#[test]
fn test_replica_ceiling_is_reached() {
    let store = store_with_nodes(2, "4", "8Gi");
    let mut sim = kube_simulation(vec![pod_template("web", "1", "1Gi")], store, Some(3));

    assert_eq!(Ok(SimulationState::LimitReached), sim.run());
    assert_eq!(3, sim.status().replicas());

    let review = sim.review().unwrap();
    assert_eq!(3, review.status.replicas);
    assert_eq!(Some(3), review.spec.replicas);
    let fail_reason = review.status.fail_reason.as_ref().unwrap();
    assert_eq!("LimitReached", fail_reason.fail_type);
    assert_eq!("Maximum number of pods simulated: 3", fail_reason.fail_message);
    assert_eq!(None, review.status.pods[0].fail_summary);
    check_replicas_match_placements(&review);
}

#[test]
fn test_templates_take_turns() {
    let store = store_with_nodes(1, "6", "64Gi");
    let templates = vec![
        pod_template("small", "1", "1Gi"),
        pod_template("large", "2", "1Gi"),
    ];
    let mut sim = kube_simulation(templates, store, None);

    assert_eq!(Ok(SimulationState::Exhausted), sim.run());
    let placed: Vec<&str> = sim
        .status()
        .placed
        .iter()
        .map(|placed| placed.pod_name.as_str())
        .collect();
    assert_eq!(vec!["small-0", "large-1", "small-2", "large-3"], placed);

    let review = sim.review().unwrap();
    assert_eq!(BTreeMap::from([("node_0", 2)]), replicas_on_nodes(&review, 0));
    assert_eq!(BTreeMap::from([("node_0", 2)]), replicas_on_nodes(&review, 1));
    // the summary describes the template of the last placed pod, large-3
    assert_eq!(None, review.status.pods[0].fail_summary);
    assert_eq!(
        Some(BTreeMap::from([("Insufficient cpu".to_string(), 1)])),
        review.status.pods[1].fail_summary
    );
    check_replicas_match_placements(&review);
}

#[test]
fn test_running_pods_consume_capacity() {
    let mut running = pod_template("running", "3", "1Gi");
    running.spec.node_name = Some("node_0".to_string());
    let snapshot = ClusterSnapshot {
        nodes: vec![Node::new("node_0", resources("4", "8Gi"))],
        namespaces: vec![],
        pods: vec![running],
    };
    let mut sim = kube_simulation(
        vec![pod_template("web", "1", "1Gi")],
        snapshot.into_store().unwrap(),
        None,
    );

    assert_eq!(Ok(SimulationState::Exhausted), sim.run());
    assert_eq!(1, sim.status().replicas());
    assert!(sim.store().get::<Pod>("default/running").is_some());
}

#[test]
fn test_empty_cluster_places_nothing() {
    let mut sim = kube_simulation(
        vec![pod_template("web", "1", "1Gi")],
        ClusterStore::new(),
        None,
    );

    assert_eq!(Ok(SimulationState::Exhausted), sim.run());
    let review = sim.review().unwrap();
    assert_eq!(0, review.status.replicas);
    assert_eq!(
        "no nodes available to schedule pods",
        review.status.fail_reason.as_ref().unwrap().fail_message
    );
    assert_eq!(None, review.status.pods[0].fail_summary);
    assert!(review.status.pods[0].replicas_on_nodes.is_empty());
}

#[test]
fn test_node_selector_restricts_placement() {
    let mut store = store_with_nodes(2, "2", "4Gi");
    let mut labeled = Node::new("gpu_node", resources("2", "4Gi"));
    labeled
        .metadata
        .labels
        .insert("accelerator".to_string(), "yes".to_string());
    store.add(labeled).unwrap();

    let mut template = pod_template("trainer", "1", "1Gi");
    template
        .spec
        .node_selector
        .insert("accelerator".to_string(), "yes".to_string());
    let mut sim = kube_simulation(vec![template], store, None);

    assert_eq!(Ok(SimulationState::Exhausted), sim.run());
    let review = sim.review().unwrap();
    assert_eq!(BTreeMap::from([("gpu_node", 2)]), replicas_on_nodes(&review, 0));
    assert_eq!(
        Some(BTreeMap::from([
            ("Insufficient cpu".to_string(), 1),
            ("MatchNodeSelector".to_string(), 2),
        ])),
        review.status.pods[0].fail_summary
    );
    assert_eq!(
        "accelerator",
        review.spec.pod_requirements[0]
            .node_selectors
            .keys()
            .next()
            .unwrap()
    );
}

#[test]
fn test_placement_error_fails_the_run() {
    let mut template = pod_template("web", "1", "1Gi");
    template
        .metadata
        .labels
        .insert(SCHEDULER_NAME_LABEL.to_string(), "custom".to_string());
    let mut sim = kube_simulation(vec![template], store_with_nodes(1, "4", "8Gi"), None);

    assert_eq!(Ok(SimulationState::Failed), sim.run());
    let review = sim.review().unwrap();
    let fail_reason = review.status.fail_reason.as_ref().unwrap();
    assert_eq!("Failed", fail_reason.fail_type);
    assert_eq!(
        "scheduler profile \"custom\" is not configured",
        fail_reason.fail_message
    );
    assert_eq!(0, sim.store().count(ObjectKind::Pod));
}

#[test]
fn test_zero_request_template_is_reported_as_failure() {
    let template = Pod::new("idle", Default::default());
    let mut sim = kube_simulation(vec![template], store_with_nodes(1, "4", "8Gi"), None);

    assert_eq!(Ok(SimulationState::Failed), sim.run());
    assert_eq!(0, sim.status().replicas());
}
