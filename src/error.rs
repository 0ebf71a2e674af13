//! Custom error types for annotation checks and document dissection

use std::io;

use thiserror;

use crate::annotation::Annotation;

/// Error that occured when reading or checking a document's annotation
#[derive(thiserror::Error, Debug)]
pub enum AnnotationError {
    #[error("Unexpected file annotation: {line}")]
    Malformed { line: String },
    #[error("Unsupported file annotation '{line}' (accepted: {})", join_annotations(.accepted))]
    Unsupported {
        line: String,
        accepted: Vec<Annotation>,
    },
    #[error("Could not read the annotation line")]
    Read(#[from] io::Error),
}

impl AnnotationError {
    /// Create a new error of variant `Malformed` for the given raw line.
    pub(crate) fn malformed(line: impl Into<String>) -> AnnotationError {
        AnnotationError::Malformed { line: line.into() }
    }
}

/// Error that occured when cutting a document into blurbs
#[derive(thiserror::Error, Debug)]
pub enum DissectError {
    #[error("Could not read document content")]
    Read(#[from] io::Error),
    #[error("Invalid delimiter (pattern {pattern:?}, offset {offset}): {reason}")]
    InvalidDelimiter {
        pattern: String,
        offset: usize,
        reason: &'static str,
    },
    #[error("Could not start the dissection thread")]
    Spawn(#[source] io::Error),
}

/// Error of the conversion helpers
#[derive(thiserror::Error, Debug)]
pub enum ConversionError {
    #[error("Could not decode string as base64")]
    InvalidBase64(#[from] base64::DecodeError),
}

fn join_annotations(accepted: &[Annotation]) -> String {
    accepted
        .iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
