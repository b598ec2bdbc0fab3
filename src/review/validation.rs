//! Field level validation of a capacity review document.

use thiserror::Error;

use crate::review::types::ClusterCapacityReview;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {detail}")]
pub struct FieldError {
    pub field: String,
    pub detail: String,
}

impl FieldError {
    fn required(field: String) -> Self {
        Self {
            field,
            detail: "Required value".to_string(),
        }
    }
}

/// Returns every missing required field, nothing when the review is valid.
pub fn validate_review(review: &ClusterCapacityReview) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for (idx, template) in review.spec.templates.iter().enumerate() {
        if template.metadata.name.is_empty() {
            errors.push(FieldError::required(format!(
                "spec.templates[{}].metadata.name",
                idx
            )));
        }
    }
    for (idx, requirements) in review.spec.pod_requirements.iter().enumerate() {
        if requirements.pod_name.is_empty() {
            errors.push(FieldError::required(format!(
                "spec.podRequirements[{}].podName",
                idx
            )));
        }
    }

    if review.status.creation_timestamp.is_none() {
        errors.push(FieldError::required(
            "status.creationTimestamp".to_string(),
        ));
    }
    for (idx, result) in review.status.pods.iter().enumerate() {
        if result.pod_name.is_empty() {
            errors.push(FieldError::required(format!("status.pods[{}].podName", idx)));
        }
    }

    errors
}
