//! Lattice Flow
//!
//! Checks and prepares pipeline definitions before they are run.
//! It includes:
//! - YAML document parsing for pipelines and project descriptors
//! - The project provider seam and concurrent descriptor fetching
//! - Declaration-order graph lookups and a text diagram
//! - The validator producing a per-step report
//! - The run request builder for override and selection modes

pub mod document;
pub mod error;
pub mod graph;
pub mod provider;
pub mod report;
pub mod request;
pub mod validator;

pub use document::{parse_pipeline, parse_pipeline_file, parse_project, render_pipeline};
pub use error::{DocumentError, ProviderError, RequestError};
pub use graph::{Edge, LookupError, PipelineGraph};
pub use provider::{
    DirectoryProjectProvider, ProjectProvider, ResolvedProjects, StaticProjectProvider,
    fetch_projects,
};
pub use report::{Issue, IssueKind, Severity, StepReport, StepStatus, ValidationReport};
pub use request::{RunRequestBuilder, Selection};
pub use validator::{validate, validate_with};
