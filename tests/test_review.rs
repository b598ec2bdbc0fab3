mod helpers;

use kubernetriks_capacity::review::printer::{print_review, OutputFormat};
use kubernetriks_capacity::review::types::ClusterCapacityReview;
use kubernetriks_capacity::review::validation::validate_review;
use kubernetriks_capacity::test_util::helpers::{pod_template, store_with_nodes};

use helpers::kube_simulation;

fn finished_review() -> ClusterCapacityReview {
    let mut sim = kube_simulation(
        vec![
            pod_template("frontend", "500m", "256Mi"),
            pod_template("backend", "1", "1Gi"),
        ],
        store_with_nodes(2, "2", "4Gi"),
        None,
    );
    sim.run().unwrap();
    sim.review().unwrap()
}

fn render(review: &ClusterCapacityReview, format: OutputFormat, verbose: bool) -> String {
    let mut out = Vec::new();
    print_review(review, format, verbose, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_review_of_finished_run_is_valid() {
    let review = finished_review();
    assert!(validate_review(&review).is_empty());
    assert!(review.status.creation_timestamp.is_some());
    assert_eq!(2, review.spec.pod_requirements.len());
    assert_eq!("256Mi", review.spec.pod_requirements[0].resources.memory.to_string());
}

#[test]
fn test_review_rendering_is_deterministic() {
    let review = finished_review();
    assert_eq!(
        render(&review, OutputFormat::Json, false),
        render(&review.clone(), OutputFormat::Json, false)
    );

    let json: serde_json::Value =
        serde_json::from_str(&render(&review, OutputFormat::Json, false)).unwrap();
    assert_eq!(review.status.replicas, json["status"]["replicas"].as_u64().unwrap() as u32);
    assert!(json["status"]["creationTimestamp"].is_string());
    assert!(json["spec"].get("replicas").is_none());
}

#[test]
fn test_yaml_rendering_parses_back() {
    let review = finished_review();
    let parsed: ClusterCapacityReview =
        serde_yaml::from_str(&render(&review, OutputFormat::Yaml, false)).unwrap();
    assert_eq!(review, parsed);
}

#[test]
fn test_pretty_rendering_lists_every_template() {
    let review = finished_review();
    let text = render(&review, OutputFormat::Pretty, true);

    for pod in review.status.pods.iter() {
        assert!(text.contains(&format!(
            "The cluster can schedule {} instance(s) of the pod {}.",
            pod.instances(),
            pod.pod_name
        )));
    }
    assert!(text.contains("frontend pod requirements:"));
    assert!(text.contains("Termination reason: Unschedulable: "));
    assert!(text.contains("Pod distribution among nodes:"));
}
