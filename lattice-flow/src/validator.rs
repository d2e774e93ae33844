//! Pipeline validator
//!
//! Checks every step, in declaration order, against its project descriptor:
//! required inputs are bound, references resolve to the pipeline's inputs or
//! to earlier steps, and bound types are compatible. Findings are graded:
//! unresolved references and missing inputs are errors, while type
//! mismatches and unknown bindings are warnings.
//!
//! The validator never fails. A step whose project cannot be loaded gets a
//! single error and the remaining steps are still checked.

use lattice_core::domain::binding::Binding;
use lattice_core::domain::pipeline::{Pipeline, Step};
use lattice_core::domain::project::ProjectDescriptor;
use lattice_core::domain::types::{Compatibility, TypeDescriptor};
use std::sync::Arc;

use crate::graph::PipelineGraph;
use crate::provider::{ProjectProvider, ResolvedProjects, fetch_projects};
use crate::report::{IssueKind, StepReport, ValidationReport};

/// Validate a pipeline against already fetched project descriptors
///
/// # Arguments
/// * `pipeline` - Snapshot to check; it is not modified
/// * `projects` - Descriptor outcomes aligned with `pipeline.steps`
///
/// # Returns
/// A report with one entry per step, in declaration order
pub fn validate(pipeline: &Pipeline, projects: &ResolvedProjects) -> ValidationReport {
    let graph = PipelineGraph::new(pipeline, projects);

    let steps: Vec<StepReport> = pipeline
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| validate_step(&graph, index, step, projects))
        .collect();

    let report = ValidationReport::new(pipeline.name.clone(), steps);
    tracing::info!(
        "Validated pipeline {}: {} error(s), {} warning(s)",
        pipeline.name,
        report.errors().len(),
        report.warnings().len()
    );
    report
}

/// Fetch every step's descriptor through `provider`, then validate
pub async fn validate_with(
    provider: Arc<dyn ProjectProvider>,
    pipeline: &Pipeline,
) -> ValidationReport {
    let projects = fetch_projects(provider, pipeline).await;
    validate(pipeline, &projects)
}

fn validate_step(
    graph: &PipelineGraph<'_>,
    index: usize,
    step: &Step,
    projects: &ResolvedProjects,
) -> StepReport {
    let mut report = StepReport::new(step);

    if step.id.trim().is_empty() {
        report.error(IssueKind::InvalidStep, None, "step id is empty");
    }
    if step.uses.trim().is_empty() {
        report.error(IssueKind::InvalidStep, None, "step does not reference a project");
    }
    if graph.steps_before(index).iter().any(|s| s.id == step.id) {
        report.error(
            IssueKind::DuplicateStep,
            None,
            format!("duplicate step id '{}'", step.id),
        );
    }

    let project = match projects.for_step(index) {
        Some(Ok(project)) => project,
        Some(Err(err)) => {
            report.error(
                IssueKind::ProjectUnavailable,
                None,
                format!("cannot load referenced project: {}", err),
            );
            return report;
        }
        None => {
            report.error(
                IssueKind::ProjectUnavailable,
                None,
                format!("cannot load referenced project '{}'", step.uses),
            );
            return report;
        }
    };

    tracing::debug!("Checking step {} against {}", step.id, project.reference());

    check_inputs(graph, index, step, project, &mut report);
    check_unknown_inputs(step, project, &mut report);
    check_publish(step, project, &mut report);
    check_store(step, project, &mut report);

    report
}

fn check_inputs(
    graph: &PipelineGraph<'_>,
    index: usize,
    step: &Step,
    project: &ProjectDescriptor,
    report: &mut StepReport,
) {
    for spec in &project.inputs {
        let name = spec.name.as_str();

        let Some(binding) = step.binding(name) else {
            if spec.ty.is_required() {
                report.error(
                    IssueKind::MissingInput,
                    Some(name),
                    format!("missing required input '{}' ({})", name, spec.ty),
                );
            }
            continue;
        };

        let source = match &binding {
            Binding::PipelineInput { name: input } => match graph.resolve_pipeline_input(input) {
                Ok(ty) => ty.clone(),
                Err(err) => {
                    report.error(
                        IssueKind::UnresolvedReference,
                        Some(name),
                        format!("binding refers to nonexistent pipeline input: {}", err),
                    );
                    continue;
                }
            },
            Binding::StepOutput { step_id, output } => {
                match graph.resolve_step_output(index, step_id, output) {
                    Ok((_, ty)) => ty.clone(),
                    Err(err) => {
                        report.error(
                            IssueKind::UnresolvedReference,
                            Some(name),
                            format!(
                                "binding refers to nonexistent or non-earlier step/output: {}",
                                err
                            ),
                        );
                        continue;
                    }
                }
            }
            Binding::Literal(literal) => match literal.implied_type() {
                Some(ty) => ty,
                None => {
                    report.warning(
                        IssueKind::OpaqueLiteral,
                        Some(name),
                        format!(
                            "unrecognized binding '{}'; treated as a free-form literal",
                            binding
                        ),
                    );
                    continue;
                }
            },
        };

        check_types(name, &binding, &source, &spec.ty, report);
    }
}

fn check_types(
    input: &str,
    binding: &Binding,
    source: &TypeDescriptor,
    target: &TypeDescriptor,
    report: &mut StepReport,
) {
    match TypeDescriptor::check_compatibility(source, target) {
        Compatibility::Compatible => {}
        Compatibility::Mismatch => report.warning(
            IssueKind::TypeMismatch,
            Some(input),
            format!(
                "type mismatch: '{}' provides {} but input '{}' expects {}",
                binding, source, input, target
            ),
        ),
        Compatibility::Unsupported => report.warning(
            IssueKind::UnsupportedType,
            Some(input),
            format!(
                "cannot compare {} with {} for input '{}': nested types are not supported",
                source, target, input
            ),
        ),
    }
}

fn check_unknown_inputs(step: &Step, project: &ProjectDescriptor, report: &mut StepReport) {
    for name in step.with.keys() {
        if project.input(name).is_none() {
            report.warning(
                IssueKind::UnknownInput,
                Some(name.as_str()),
                format!(
                    "unknown input '{}' is not declared by project '{}'",
                    name,
                    project.reference()
                ),
            );
        }
    }
}

fn check_publish(step: &Step, project: &ProjectDescriptor, report: &mut StepReport) {
    for (output, value) in step.publish.iter().flatten() {
        if project.output(output).is_none() {
            report.warning(
                IssueKind::UnknownPublish,
                Some(output.as_str()),
                format!("published output '{}' is not declared by the project", output),
            );
        }

        let typed = matches!(
            Binding::classify(value),
            Some(Binding::Literal(literal)) if literal.is_typed()
        );
        if !typed {
            report.warning(
                IssueKind::UntypedPublish,
                Some(output.as_str()),
                format!(
                    "published output '{}' should be a File(...) or Directory(...) literal, got '{}'",
                    output, value
                ),
            );
        }
    }
}

fn check_store(step: &Step, project: &ProjectDescriptor, report: &mut StepReport) {
    for (name, store) in step.store.iter().flatten() {
        if project.output(&store.source).is_none() {
            report.warning(
                IssueKind::UnknownStoreSource,
                Some(name.as_str()),
                format!(
                    "store '{}' reads output '{}' which the project does not declare",
                    name, store.source
                ),
            );
        }
    }
}
