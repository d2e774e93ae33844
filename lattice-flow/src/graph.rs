//! Declaration-order pipeline graph
//!
//! There is no explicit dependency list. A step may only consume outputs of
//! steps declared before it, so every lookup is restricted to that prefix.
//! Forward references, self references and cycles all fail the same way.

use lattice_core::domain::binding::Binding;
use lattice_core::domain::pipeline::{Pipeline, Step};
use lattice_core::domain::types::TypeDescriptor;
use std::fmt::Write;
use thiserror::Error;

use crate::provider::ResolvedProjects;

/// Why a reference did not resolve
///
/// Every variant means "not found"; the variant only sharpens the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("pipeline input '{0}' does not exist")]
    UnknownInput(String),

    #[error("step '{0}' cannot consume its own outputs")]
    SelfReference(String),

    #[error("step '{0}' is declared later; only earlier steps can be referenced")]
    ForwardReference(String),

    #[error("step '{0}' does not exist")]
    UnknownStep(String),

    #[error("step '{step_id}' does not declare output '{output}'")]
    UnknownOutput { step_id: String, output: String },

    #[error("project of step '{0}' could not be loaded, so its outputs are unknown")]
    ProjectUnavailable(String),
}

/// Data dependency between two steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Upstream step producing the value
    pub from: String,
    /// Downstream step consuming it
    pub to: String,
    pub output: String,
    /// Input of the downstream step the output is bound to
    pub input: String,
}

/// Read-only view over a pipeline and the descriptors of its steps
pub struct PipelineGraph<'a> {
    pipeline: &'a Pipeline,
    projects: &'a ResolvedProjects,
}

impl<'a> PipelineGraph<'a> {
    pub fn new(pipeline: &'a Pipeline, projects: &'a ResolvedProjects) -> Self {
        Self { pipeline, projects }
    }

    /// Steps the step at `index` may bind to
    pub fn steps_before(&self, index: usize) -> &'a [Step] {
        self.pipeline.steps_before(index)
    }

    /// Resolve `step.<step_id>.outputs.<output>` as seen from the step at `index`
    ///
    /// Only the steps declared before `index` can satisfy the lookup. The rest
    /// of the list is consulted solely to pick the error variant.
    ///
    /// # Returns
    /// The producing step and the declared type of its output
    ///
    /// # Errors
    /// Returns a [`LookupError`] when the step is not an earlier step, when
    /// its project could not be loaded, or when it has no such output.
    pub fn resolve_step_output(
        &self,
        index: usize,
        step_id: &str,
        output: &str,
    ) -> Result<(&'a Step, &'a TypeDescriptor), LookupError> {
        let earlier = self.steps_before(index);

        let Some(position) = earlier.iter().position(|s| s.id == step_id) else {
            return Err(self.missing_step(index, step_id));
        };

        let step = &earlier[position];
        let project = self
            .projects
            .descriptor(position)
            .ok_or_else(|| LookupError::ProjectUnavailable(step_id.to_string()))?;

        project
            .output(output)
            .map(|spec| (step, &spec.ty))
            .ok_or_else(|| LookupError::UnknownOutput {
                step_id: step_id.to_string(),
                output: output.to_string(),
            })
    }

    /// Resolve `inputs.<name>` to the pipeline input's declared type
    pub fn resolve_pipeline_input(&self, name: &str) -> Result<&'a TypeDescriptor, LookupError> {
        self.pipeline
            .input(name)
            .map(|input| &input.ty)
            .ok_or_else(|| LookupError::UnknownInput(name.to_string()))
    }

    /// Only called once the earlier prefix has no step `step_id`, so any
    /// declaration found sits at or after `index`
    fn missing_step(&self, index: usize, step_id: &str) -> LookupError {
        match self.pipeline.step_index(step_id) {
            Some(position) if position == index => {
                LookupError::SelfReference(step_id.to_string())
            }
            Some(_) => LookupError::ForwardReference(step_id.to_string()),
            None => LookupError::UnknownStep(step_id.to_string()),
        }
    }

    /// Step-to-step dependencies in declaration order
    ///
    /// Only bindings whose upstream step is an earlier step are listed; the
    /// output itself is not checked.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::new();
        for (index, step) in self.pipeline.steps.iter().enumerate() {
            for (input, text) in &step.with {
                let Some(Binding::StepOutput { step_id, output }) = Binding::classify(text) else {
                    continue;
                };
                if self.steps_before(index).iter().any(|s| s.id == step_id) {
                    edges.push(Edge {
                        from: step_id,
                        to: step.id.clone(),
                        output,
                        input: input.clone(),
                    });
                }
            }
        }
        edges
    }

    /// Plain-text flow diagram, one line per step
    ///
    /// ```text
    /// filter (filter@1.0) <- inputs.samplesheet
    /// count (count) <- filter.filtered_sheet
    /// ```
    pub fn diagram(&self) -> String {
        let mut out = String::new();
        for step in &self.pipeline.steps {
            let sources: Vec<String> = step
                .with
                .values()
                .filter_map(|text| match Binding::classify(text)? {
                    Binding::PipelineInput { name } => Some(format!("inputs.{}", name)),
                    Binding::StepOutput { step_id, output } => {
                        Some(format!("{}.{}", step_id, output))
                    }
                    Binding::Literal(_) => None,
                })
                .collect();

            let _ = write!(out, "{} ({})", step.id, step.uses);
            if !sources.is_empty() {
                let _ = write!(out, " <- {}", sources.join(", "));
            }
            out.push('\n');
        }
        out
    }
}
