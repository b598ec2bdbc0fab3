//! Builds the capacity review of a terminated simulation.

use std::collections::BTreeMap;

use crate::core::pod::Pod;
use crate::core::resources::ResourceDemand;
use crate::review::classifier::ClassifiedStop;
use crate::review::types::{
    ClusterCapacityReview, ClusterCapacityReviewResult, ClusterCapacityReviewSpec,
    ClusterCapacityReviewStatus, Requirements, REVIEW_API_VERSION, REVIEW_KIND,
};
use crate::simulator::{Attribution, SimulationStatus};

pub fn pod_requirements(templates: &[Pod]) -> Vec<Requirements> {
    templates
        .iter()
        .map(|template| Requirements {
            pod_name: template.metadata.name.clone(),
            resources: ResourceDemand::of_pod(template),
            node_selectors: template.spec.node_selector.clone(),
        })
        .collect()
}

/// Placed instance `i` is counted for template `attribution(i, templates.len())`. The fail
/// summary goes to the template of the last placed instance, or to the first template when
/// nothing was placed.
pub fn build_review(
    templates: &[Pod],
    max_replicas: Option<u32>,
    status: &SimulationStatus,
    classified: &ClassifiedStop,
    attribution: Attribution,
) -> ClusterCapacityReview {
    let mut results: Vec<ClusterCapacityReviewResult> = templates
        .iter()
        .map(|template| ClusterCapacityReviewResult {
            pod_name: template.metadata.name.clone(),
            replicas_on_nodes: BTreeMap::new(),
            fail_summary: None,
        })
        .collect();

    if !results.is_empty() {
        for (idx, placed) in status.placed.iter().enumerate() {
            let template_idx = attribution(idx, templates.len());
            if let Some(result) = results.get_mut(template_idx) {
                *result
                    .replicas_on_nodes
                    .entry(placed.node_name.clone())
                    .or_default() += 1;
            }
        }

        if let Some(fail_summary) = &classified.fail_summary {
            let template_idx = status
                .placed
                .len()
                .checked_sub(1)
                .map_or(0, |last| attribution(last, templates.len()));
            if let Some(result) = results.get_mut(template_idx) {
                result.fail_summary = Some(fail_summary.clone());
            }
        }
    }

    ClusterCapacityReview {
        kind: REVIEW_KIND.to_string(),
        api_version: REVIEW_API_VERSION.to_string(),
        spec: ClusterCapacityReviewSpec {
            templates: templates.to_vec(),
            replicas: max_replicas,
            pod_requirements: pod_requirements(templates),
        },
        status: ClusterCapacityReviewStatus {
            creation_timestamp: status.finished_at,
            replicas: u32::try_from(status.placed.len()).unwrap_or(u32::MAX),
            fail_reason: Some(classified.reason.clone()),
            pods: results,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};

    use super::build_review;
    use crate::core::pod::Pod;
    use crate::core::scheduler::interface::Infeasibility;
    use crate::review::classifier::{classify_diagnostic, classify_stop, ClassifiedStop};
    use crate::simulator::{round_robin, PlacedInstance, SimulationStatus, StopSignal};

    fn template(name: &str, cpu: &str, memory: &str) -> Pod {
        Pod::new(
            name,
            BTreeMap::from([
                ("cpu".to_string(), cpu.parse().unwrap()),
                ("memory".to_string(), memory.parse().unwrap()),
            ]),
        )
    }

    fn status(nodes: &[&str]) -> SimulationStatus {
        SimulationStatus {
            placed: nodes
                .iter()
                .enumerate()
                .map(|(idx, node)| PlacedInstance {
                    pod_name: format!("pod-{}", idx),
                    node_name: node.to_string(),
                })
                .collect(),
            stop: Some(StopSignal::Exhausted(Infeasibility::Diagnostic(
                "Unschedulable: full\nsummary: Insufficient cpu (2)".to_string(),
            ))),
            finished_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
        }
    }

    fn classified() -> ClassifiedStop {
        classify_diagnostic("Unschedulable: full\nsummary: Insufficient cpu (2)")
    }

    #[test]
    fn test_round_robin_distribution() {
        let templates = vec![
            template("a", "100m", "1Mi"),
            template("b", "200m", "2Mi"),
            template("c", "300m", "3Mi"),
        ];
        let status = status(&["n1", "n2", "n1", "n1", "n2"]);

        let review = build_review(&templates, None, &status, &classified(), round_robin);

        assert_eq!(5, review.status.replicas);
        let pods = &review.status.pods;
        assert_eq!(BTreeMap::from([("n1".to_string(), 2)]), pods[0].replicas_on_nodes);
        assert_eq!(BTreeMap::from([("n2".to_string(), 2)]), pods[1].replicas_on_nodes);
        assert_eq!(BTreeMap::from([("n1".to_string(), 1)]), pods[2].replicas_on_nodes);
        assert_eq!(5, pods.iter().map(|pod| pod.instances()).sum::<u64>());
    }

    #[test]
    fn test_fail_summary_goes_to_last_placed_template() {
        let templates = vec![template("a", "100m", "1Mi"), template("b", "200m", "2Mi")];
        let review = build_review(
            &templates,
            None,
            &status(&["n1", "n1", "n1", "n1"]),
            &classified(),
            round_robin,
        );

        // the fourth placement, index 3, belongs to template b
        assert_eq!(None, review.status.pods[0].fail_summary);
        assert_eq!(
            Some(BTreeMap::from([("Insufficient cpu".to_string(), 2)])),
            review.status.pods[1].fail_summary
        );

        let review = build_review(
            &templates,
            None,
            &status(&["n1", "n1", "n1"]),
            &classified(),
            round_robin,
        );
        assert!(review.status.pods[0].fail_summary.is_some());
        assert_eq!(None, review.status.pods[1].fail_summary);
    }

    #[test]
    fn test_requirements_and_spec() {
        let mut selected = template("a", "150m", "1Gi");
        selected
            .spec
            .node_selector
            .insert("zone".to_string(), "eu".to_string());
        let limit = classify_stop(&StopSignal::LimitReached { limit: 4 });

        let review = build_review(&[selected], Some(4), &status(&["n1"]), &limit, round_robin);

        assert_eq!("ClusterCapacityReview", review.kind);
        assert_eq!("v1alpha1", review.api_version);
        assert_eq!(Some(4), review.spec.replicas);
        let requirements = &review.spec.pod_requirements[0];
        assert_eq!("a", requirements.pod_name);
        assert_eq!("150m", requirements.resources.cpu.to_string());
        assert_eq!("1Gi", requirements.resources.memory.to_string());
        assert_eq!("eu", requirements.node_selectors["zone"]);
        assert_eq!(
            "LimitReached",
            review.status.fail_reason.as_ref().unwrap().fail_type
        );
        assert_eq!(None, review.status.pods[0].fail_summary);
    }

    #[test]
    fn test_building_twice_is_identical() {
        let templates = vec![template("a", "100m", "1Mi"), template("b", "200m", "2Mi")];
        let status = status(&["n1", "n2", "n3"]);

        let first = build_review(&templates, Some(10), &status, &classified(), round_robin);
        let second = build_review(&templates, Some(10), &status, &classified(), round_robin);

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(
            serde_yaml::to_string(&first).unwrap(),
            serde_yaml::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_no_placements() {
        let templates = vec![template("a", "100m", "1Mi")];
        let review = build_review(&templates, None, &status(&[]), &classified(), round_robin);

        assert_eq!(0, review.status.replicas);
        assert!(review.status.pods[0].replicas_on_nodes.is_empty());
        assert!(review.status.pods[0].fail_summary.is_some());
    }
}
