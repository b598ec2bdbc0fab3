//! Classification of the signal which terminated a simulation into a fail reason and a per node
//! failure cause histogram.
//!
//! Placement algorithms which only report prose are parsed here. The first line of the text must
//! be `<FailType>: <FailMessage>`. An optional second line lists `<cause> (<count>)` entries
//! separated by commas, possibly after a `<prefix>:` such as `fit failure summary on nodes :`.

use std::collections::BTreeMap;

use log::warn;

use crate::core::scheduler::interface::Infeasibility;
use crate::review::types::FailReason;
use crate::simulator::StopSignal;

pub const UNPARSEABLE_FAIL_TYPE: &str = "Unparseable";
pub const LIMIT_REACHED_FAIL_TYPE: &str = "LimitReached";
pub const FAILED_FAIL_TYPE: &str = "Failed";

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedStop {
    pub reason: FailReason,
    /// Failure cause to the number of nodes failing with it.
    pub fail_summary: Option<BTreeMap<String, u64>>,
}

pub fn classify_stop(stop: &StopSignal) -> ClassifiedStop {
    match stop {
        StopSignal::Exhausted(Infeasibility::Diagnostic(text)) => classify_diagnostic(text),
        StopSignal::Exhausted(Infeasibility::Structured(failure)) => ClassifiedStop {
            reason: FailReason {
                fail_type: failure.fail_type.clone(),
                fail_message: failure.fail_message.clone(),
            },
            fail_summary: Some(failure.node_failures.clone()).filter(|summary| !summary.is_empty()),
        },
        StopSignal::LimitReached { limit } => ClassifiedStop {
            reason: FailReason {
                fail_type: LIMIT_REACHED_FAIL_TYPE.to_string(),
                fail_message: format!("Maximum number of pods simulated: {}", limit),
            },
            fail_summary: None,
        },
        StopSignal::Failed { cause } => ClassifiedStop {
            reason: FailReason {
                fail_type: FAILED_FAIL_TYPE.to_string(),
                fail_message: cause.clone(),
            },
            fail_summary: None,
        },
    }
}

pub fn classify_diagnostic(text: &str) -> ClassifiedStop {
    let mut lines = text.lines();
    let first_line = lines.next().unwrap_or_default();

    let reason = match first_line.split_once(':') {
        Some((fail_type, fail_message)) => FailReason {
            fail_type: fail_type.trim().to_string(),
            fail_message: fail_message.trim().to_string(),
        },
        None => {
            warn!("Stop reason {:?} has no fail type", first_line);
            FailReason {
                fail_type: UNPARSEABLE_FAIL_TYPE.to_string(),
                fail_message: first_line.trim().to_string(),
            }
        }
    };

    let fail_summary = lines
        .next()
        .filter(|line| !line.trim().is_empty())
        .map(parse_fail_summary);

    ClassifiedStop {
        reason,
        fail_summary,
    }
}

fn strip_summary_prefix(line: &str) -> &str {
    match line.split_once(':') {
        Some((prefix, rest))
            if !prefix.contains('(')
                && !prefix.contains(',')
                && rest.starts_with(char::is_whitespace) =>
        {
            rest
        }
        _ => line,
    }
}

fn parse_fail_summary(line: &str) -> BTreeMap<String, u64> {
    let mut summary: BTreeMap<String, u64> = BTreeMap::new();
    for entry in strip_summary_prefix(line).split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        // Causes themselves may contain parentheses, the count is in the last pair.
        let (cause, count) = match entry.rfind('(') {
            Some(idx) => (entry[..idx].trim(), parse_count(&entry[idx + 1..])),
            None => (entry, 0),
        };
        let total = summary.entry(cause.to_string()).or_default();
        *total = total.saturating_add(count);
    }
    summary
}

fn parse_count(raw: &str) -> u64 {
    raw.trim()
        .trim_end_matches(')')
        .trim()
        .parse()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{classify_diagnostic, classify_stop, UNPARSEABLE_FAIL_TYPE};
    use crate::core::scheduler::interface::{FitFailure, Infeasibility};
    use crate::core::scheduler::kube_scheduler::fit_error_message;
    use crate::simulator::StopSignal;

    fn histogram(entries: &[(&str, u64)]) -> BTreeMap<String, u64> {
        entries
            .iter()
            .map(|(cause, count)| (cause.to_string(), *count))
            .collect()
    }

    #[test]
    fn test_two_line_diagnostic() {
        let classified = classify_diagnostic(
            "LimitReached: replicas exhausted\nfit failure on nodes: NodeResourcesFit (2), PodAffinity (1)",
        );
        assert_eq!("LimitReached", classified.reason.fail_type);
        assert_eq!("replicas exhausted", classified.reason.fail_message);
        assert_eq!(
            Some(histogram(&[("NodeResourcesFit", 2), ("PodAffinity", 1)])),
            classified.fail_summary
        );
    }

    #[test]
    fn test_single_line_diagnostic_has_no_histogram() {
        let classified = classify_diagnostic("Unschedulable: no nodes available");
        assert_eq!("Unschedulable", classified.reason.fail_type);
        assert_eq!("no nodes available", classified.reason.fail_message);
        assert_eq!(None, classified.fail_summary);
    }

    #[test]
    fn test_message_keeps_later_colons() {
        let classified = classify_diagnostic("Unschedulable: pod (a:b) failed");
        assert_eq!("pod (a:b) failed", classified.reason.fail_message);
    }

    #[test]
    fn test_missing_colon_is_unparseable() {
        let classified = classify_diagnostic("something went sideways\nNodeResourcesFit (3)");
        assert_eq!(UNPARSEABLE_FAIL_TYPE, classified.reason.fail_type);
        assert_eq!("something went sideways", classified.reason.fail_message);
        assert_eq!(Some(histogram(&[("NodeResourcesFit", 3)])), classified.fail_summary);

        let empty = classify_diagnostic("");
        assert_eq!(UNPARSEABLE_FAIL_TYPE, empty.reason.fail_type);
        assert_eq!(None, empty.fail_summary);
    }

    #[test]
    fn test_causes_with_parentheses_and_bad_counts() {
        let classified = classify_diagnostic(
            "Unschedulable: full\nnode(s) didn't match (anti)affinity (4), Insufficient cpu (many), NoCount",
        );
        assert_eq!(
            Some(histogram(&[
                ("Insufficient cpu", 0),
                ("NoCount", 0),
                ("node(s) didn't match (anti)affinity", 4),
            ])),
            classified.fail_summary
        );
    }

    #[test]
    fn test_cause_with_colon_is_not_a_prefix() {
        let classified =
            classify_diagnostic("Unschedulable: full\nInsufficient example.com:gpu (2)");
        assert_eq!(
            Some(histogram(&[("Insufficient example.com:gpu", 2)])),
            classified.fail_summary
        );

        let prefixed = classify_diagnostic(
            "Unschedulable: full\nsummary: Insufficient example.com:gpu (2), Insufficient cpu (1)",
        );
        assert_eq!(
            Some(histogram(&[
                ("Insufficient cpu", 1),
                ("Insufficient example.com:gpu", 2),
            ])),
            prefixed.fail_summary
        );
    }

    #[test]
    fn test_reference_scheduler_message_round_trip() {
        let failures = histogram(&[("Insufficient memory", 2), ("MatchNodeSelector", 1)]);
        let classified = classify_diagnostic(&fit_error_message("web-7", &failures));
        assert_eq!("Unschedulable", classified.reason.fail_type);
        assert_eq!(
            "pod (web-7) failed to fit in any node",
            classified.reason.fail_message
        );
        assert_eq!(Some(failures), classified.fail_summary);
    }

    #[test]
    fn test_structured_infeasibility_bypasses_parsing() {
        let classified = classify_stop(&StopSignal::Exhausted(Infeasibility::Structured(
            FitFailure {
                fail_type: "Unschedulable".to_string(),
                fail_message: "0/2 nodes: a, b".to_string(),
                node_failures: histogram(&[("Insufficient cpu", 2)]),
            },
        )));
        assert_eq!("0/2 nodes: a, b", classified.reason.fail_message);
        assert_eq!(Some(histogram(&[("Insufficient cpu", 2)])), classified.fail_summary);
    }

    #[test]
    fn test_limit_and_failure_signals() {
        let limit = classify_stop(&StopSignal::LimitReached { limit: 6 });
        assert_eq!("LimitReached", limit.reason.fail_type);
        assert_eq!("Maximum number of pods simulated: 6", limit.reason.fail_message);

        let failed = classify_stop(&StopSignal::Failed {
            cause: "scheduler crashed".to_string(),
        });
        assert_eq!("Failed", failed.reason.fail_type);
        assert_eq!("scheduler crashed", failed.reason.fail_message);
        assert_eq!(None, failed.fail_summary);
    }
}
