//! Error types for pipeline documents, project providers and run requests
//!
//! The validator has no error type: it always returns a report.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reading or writing pipeline and project documents
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML for the expected shape
    #[error("Failed to parse document: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document could not be rendered
    #[error("Failed to serialize document: {0}")]
    Serialize(String),
}

/// Failure to supply a project descriptor for one `uses` reference
///
/// Scoped to the steps using that reference; never fatal to a validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// No project is known under this reference
    #[error("project '{0}' not found")]
    NotFound(String),

    /// The project exists but its descriptor could not be read or parsed
    #[error("project '{reference}' is unreadable: {reason}")]
    Unreadable { reference: String, reason: String },
}

/// Caller-visible failures of the run request builder
///
/// No partial request is ever produced alongside one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Selection mode needs exactly one `List[GenotypeRecord]` pipeline input
    #[error("no pipeline accepts this input shape: expected exactly one List[GenotypeRecord] input, found {found}")]
    NoCompatibleInput { found: usize },

    /// Selection mode was requested without any file identifier
    #[error("no valid file IDs were provided for the pipeline run")]
    EmptySelection,

    /// URLs were supplied but none survived trimming
    #[error("no valid URLs were provided for the pipeline run")]
    NoValidUrls,
}

impl ProviderError {
    pub fn unreadable(reference: impl Into<String>, reason: impl ToString) -> Self {
        Self::Unreadable {
            reference: reference.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
