//! Capacity review document: building it from a terminated simulation, validating and rendering it.

use thiserror::Error;

use crate::review::validation::FieldError;

pub mod classifier;
pub mod printer;
pub mod report;
pub mod types;
pub mod validation;

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("output format {0:?} not recognized")]
    UnknownOutputFormat(String),
    #[error("failed to create json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to create yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to write review: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid review: {}", join_field_errors(.0))]
    Invalid(Vec<FieldError>),
}
