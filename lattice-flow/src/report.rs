//! Validation report types
//!
//! A report is transient: it is recomputed on every validation pass and has
//! no identity of its own.

use lattice_core::domain::pipeline::Step;
use serde::Serialize;
use std::fmt;

/// Aggregate outcome of one step
///
/// Ordered so that the worst status of a set of issues is its maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Execution is plausible; surfaced for review
    Warning,
    /// Blocks a run
    Error,
}

/// Machine-readable category of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Step has an empty id or `uses`
    InvalidStep,
    DuplicateStep,
    ProjectUnavailable,
    MissingInput,
    /// Binding points at a missing pipeline input or a missing/non-earlier step output
    UnresolvedReference,
    TypeMismatch,
    /// Nested collection or malformed type on one side of a binding
    UnsupportedType,
    /// Binding for an input the project does not declare
    UnknownInput,
    /// Free-form literal of unspecified type
    OpaqueLiteral,
    UnknownPublish,
    UntypedPublish,
    UnknownStoreSource,
}

/// One finding attached to a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub kind: IssueKind,
    /// Step input (or publish/store entry) the issue concerns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    pub message: String,
}

/// Findings for one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step_id: String,
    pub uses: String,
    status: StepStatus,
    issues: Vec<Issue>,
}

/// Per-step outcome of a validation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub pipeline: String,
    is_valid: bool,
    /// Flat `step: message` lists, derived from `steps`
    errors: Vec<String>,
    warnings: Vec<String>,
    steps: Vec<StepReport>,
}

impl StepReport {
    pub fn new(step: &Step) -> Self {
        Self {
            step_id: step.id.clone(),
            uses: step.uses.clone(),
            status: StepStatus::Ok,
            issues: Vec::new(),
        }
    }

    /// Record an issue and raise the status accordingly
    pub fn push(&mut self, issue: Issue) {
        let status = match issue.severity {
            Severity::Warning => StepStatus::Warning,
            Severity::Error => StepStatus::Error,
        };
        self.status = self.status.max(status);
        self.issues.push(issue);
    }

    pub fn error(&mut self, kind: IssueKind, input: Option<&str>, message: impl Into<String>) {
        self.push(Issue {
            severity: Severity::Error,
            kind,
            input: input.map(str::to_string),
            message: message.into(),
        });
    }

    pub fn warning(&mut self, kind: IssueKind, input: Option<&str>, message: impl Into<String>) {
        self.push(Issue {
            severity: Severity::Warning,
            kind,
            input: input.map(str::to_string),
            message: message.into(),
        });
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Issues of one kind
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }
}

impl ValidationReport {
    pub fn new(pipeline: impl Into<String>, steps: Vec<StepReport>) -> Self {
        let is_valid = steps.iter().all(|s| s.status != StepStatus::Error);
        Self {
            pipeline: pipeline.into(),
            is_valid,
            errors: messages(&steps, Severity::Error),
            warnings: messages(&steps, Severity::Warning),
            steps,
        }
    }

    /// No step has status `error`; warnings never affect this
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn steps(&self) -> &[StepReport] {
        &self.steps
    }

    /// First report for `step_id`
    pub fn step(&self, step_id: &str) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.step_id == step_id)
    }

    /// Every error message, prefixed with its step id
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Every warning message, prefixed with its step id
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

fn messages(steps: &[StepReport], severity: Severity) -> Vec<String> {
    steps
        .iter()
        .flat_map(|step| {
            step.issues
                .iter()
                .filter(move |i| i.severity == severity)
                .map(move |i| format!("{}: {}", step.step_id, i.message))
        })
        .collect()
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Ok => write!(f, "ok"),
            StepStatus::Warning => write!(f, "warning"),
            StepStatus::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: &str) -> StepReport {
        StepReport::new(&Step::new(id, "proj"))
    }

    #[test]
    fn test_status_is_worst_issue() {
        let mut report = step("a");
        assert_eq!(report.status(), StepStatus::Ok);

        report.warning(IssueKind::TypeMismatch, Some("x"), "mismatch");
        assert_eq!(report.status(), StepStatus::Warning);

        report.error(IssueKind::MissingInput, Some("y"), "missing");
        report.warning(IssueKind::UnknownInput, Some("z"), "unknown");
        assert_eq!(report.status(), StepStatus::Error);
        assert_eq!(report.issues_of(IssueKind::MissingInput).count(), 1);
    }

    #[test]
    fn test_warnings_never_invalidate() {
        let mut warned = step("a");
        for _ in 0..5 {
            warned.warning(IssueKind::OpaqueLiteral, None, "free text");
        }
        let report = ValidationReport::new("demo", vec![warned, step("b")]);
        assert!(report.is_valid());
        assert_eq!(report.warnings().len(), 5);
        assert!(report.errors().is_empty());

        let mut failed = step("c");
        failed.error(IssueKind::ProjectUnavailable, None, "cannot load referenced project");
        let report = ValidationReport::new("demo", vec![step("a"), failed]);
        assert!(!report.is_valid());
        assert_eq!(report.errors(), vec!["c: cannot load referenced project"]);
    }

    #[test]
    fn test_report_json_shape() {
        let mut failed = step("count");
        failed.error(IssueKind::MissingInput, Some("samplesheet"), "missing required input");
        failed.warning(IssueKind::UnknownInput, Some("extra"), "unknown input 'extra'");
        let report = ValidationReport::new("demo", vec![failed]);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["is_valid"], false);
        assert_eq!(
            value["errors"],
            serde_json::json!(["count: missing required input"])
        );
        assert_eq!(value["warnings"], serde_json::json!(["count: unknown input 'extra'"]));
        assert_eq!(value["steps"][0]["status"], "error");
        assert_eq!(value["steps"][0]["issues"][0]["kind"], "missing_input");
        assert_eq!(value["steps"][0]["issues"][0]["input"], "samplesheet");
    }
}
