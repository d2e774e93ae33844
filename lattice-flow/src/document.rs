//! Pipeline and project documents
//!
//! Both documents are plain YAML. Parsing never evaluates anything: the
//! result is the data model, with bindings and types still in text form.

use lattice_core::domain::pipeline::Pipeline;
use lattice_core::domain::project::ProjectDescriptor;
use std::path::Path;

use crate::error::DocumentError;

/// Parse a pipeline document
///
/// # Arguments
/// * `source` - YAML text with `name`, `inputs` and `steps`
///
/// # Errors
/// Returns [`DocumentError::Parse`] if the text is not valid YAML or does not
/// have the pipeline shape (for instance a step without `id` or `uses`).
///
/// # Example
/// ```
/// use lattice_flow::parse_pipeline;
///
/// let source = r#"
/// name: demo
/// inputs:
///   samplesheet: File
/// steps:
///   - id: filter
///     uses: filter@1.0
///     with:
///       samplesheet: inputs.samplesheet
/// "#;
///
/// let pipeline = parse_pipeline(source)?;
/// assert_eq!(pipeline.steps[0].with["samplesheet"], "inputs.samplesheet");
/// # Ok::<(), lattice_flow::DocumentError>(())
/// ```
pub fn parse_pipeline(source: &str) -> Result<Pipeline, DocumentError> {
    Ok(serde_yaml::from_str(source)?)
}

/// Read and parse a pipeline document from disk
pub fn parse_pipeline_file(path: impl AsRef<Path>) -> Result<Pipeline, DocumentError> {
    let source = read(path.as_ref())?;
    parse_pipeline(&source)
}

/// Render a pipeline back to its YAML document form
///
/// Map order (inputs, `with`, `publish`, `store`) is preserved.
pub fn render_pipeline(pipeline: &Pipeline) -> Result<String, DocumentError> {
    serde_yaml::to_string(pipeline).map_err(|e| DocumentError::Serialize(e.to_string()))
}

/// Parse a project descriptor document
pub fn parse_project(source: &str) -> Result<ProjectDescriptor, DocumentError> {
    Ok(serde_yaml::from_str(source)?)
}

fn read(path: &Path) -> Result<String, DocumentError> {
    std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })
}
