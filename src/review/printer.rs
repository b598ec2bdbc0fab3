use std::{io::Write, str::FromStr};

use prettytable::{row, Table};
use serde::{Deserialize, Serialize};

use crate::review::types::ClusterCapacityReview;
use crate::review::ReviewError;

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "pretty" => Ok(OutputFormat::Pretty),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            other => Err(ReviewError::UnknownOutputFormat(other.to_string())),
        }
    }
}

pub fn print_review(
    review: &ClusterCapacityReview,
    format: OutputFormat,
    verbose: bool,
    out: &mut dyn Write,
) -> Result<(), ReviewError> {
    match format {
        OutputFormat::Pretty => print_review_as_pretty_text(review, verbose, out),
        OutputFormat::Json => print_review_as_json(review, out),
        OutputFormat::Yaml => print_review_as_yaml(review, out),
    }
}

pub fn print_review_as_json(
    review: &ClusterCapacityReview,
    out: &mut dyn Write,
) -> Result<(), ReviewError> {
    let serialized_json = serde_json::to_string_pretty(review)?;
    writeln!(out, "{}", serialized_json)?;
    Ok(())
}

pub fn print_review_as_yaml(
    review: &ClusterCapacityReview,
    out: &mut dyn Write,
) -> Result<(), ReviewError> {
    let serialized_yaml = serde_yaml::to_string(review)?;
    write!(out, "{}", serialized_yaml)?;
    Ok(())
}

fn join_pairs<'a, V: std::fmt::Display + 'a>(
    pairs: impl Iterator<Item = (&'a String, V)>,
    separator: &str,
) -> String {
    pairs
        .map(|(key, value)| format!("{}{}{}", key, separator, value))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn print_review_as_pretty_text(
    review: &ClusterCapacityReview,
    verbose: bool,
    out: &mut dyn Write,
) -> Result<(), ReviewError> {
    if verbose {
        for requirements in review.spec.pod_requirements.iter() {
            let resources = &requirements.resources;
            writeln!(out, "{} pod requirements:", requirements.pod_name)?;
            writeln!(out, "\t- CPU: {}", resources.cpu)?;
            writeln!(out, "\t- Memory: {}", resources.memory)?;
            if !resources.nvidia_gpu.is_zero() {
                writeln!(out, "\t- NvidiaGPU: {}", resources.nvidia_gpu)?;
            }
            if !resources.opaque_int_resources.is_empty() {
                writeln!(
                    out,
                    "\t- OpaqueIntResources: {}",
                    join_pairs(resources.opaque_int_resources.iter(), ": ")
                )?;
            }
            if !requirements.node_selectors.is_empty() {
                writeln!(
                    out,
                    "\t- NodeSelector: {}",
                    join_pairs(requirements.node_selectors.iter(), "=")
                )?;
            }
            writeln!(out)?;
        }
    }

    for pod in review.status.pods.iter() {
        writeln!(
            out,
            "The cluster can schedule {} instance(s) of the pod {}.",
            pod.instances(),
            pod.pod_name
        )?;
    }
    if let Some(fail_reason) = &review.status.fail_reason {
        writeln!(
            out,
            "\nTermination reason: {}: {}",
            fail_reason.fail_type, fail_reason.fail_message
        )?;
    }

    if verbose && review.status.replicas > 0 {
        for pod in review.status.pods.iter() {
            if let Some(fail_summary) = &pod.fail_summary {
                writeln!(
                    out,
                    "fit failure summary on nodes: {}",
                    fail_summary
                        .iter()
                        .map(|(reason, count)| format!("{} ({})", reason, count))
                        .collect::<Vec<_>>()
                        .join(", ")
                )?;
            }
        }

        let mut distribution_table = Table::new();
        distribution_table.add_row(row!["Pod", "Node", "Instances"]);
        for pod in review.status.pods.iter() {
            for (node_name, replicas) in pod.replicas_on_nodes.iter() {
                distribution_table.add_row(row![pod.pod_name, node_name, replicas]);
            }
        }
        writeln!(out, "\nPod distribution among nodes:")?;
        write!(out, "{}", distribution_table)?;
    }

    Ok(())
}
