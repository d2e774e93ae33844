//! Binding grammar
//!
//! A binding is the symbolic expression supplying one step input. It is
//! stored as a single string so the pipeline document stays flat:
//!
//! | Form | Meaning |
//! |---|---|
//! | `inputs.<name>` | the pipeline's own input `<name>` |
//! | `step.<stepId>.outputs.<output>` | an output of an earlier step |
//! | `File(<path>)` / `Directory(<path>)` | a typed literal |
//!
//! Any other non-empty text is an opaque literal.

use std::fmt;

use crate::domain::types::{DIRECTORY_TYPE, FILE_TYPE, TypeDescriptor};

const INPUT_PREFIX: &str = "inputs.";
const STEP_PREFIX: &str = "step.";
const OUTPUTS_SEGMENT: &str = ".outputs.";

/// Symbolic source of one step input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// `inputs.<name>`
    PipelineInput { name: String },
    /// `step.<step_id>.outputs.<output>`
    StepOutput { step_id: String, output: String },
    /// Fixed, author-supplied value
    Literal(Literal),
}

/// Literal binding value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    File(String),
    Directory(String),
    /// Free-form text of unspecified type
    Opaque(String),
}

impl Binding {
    /// Classify binding text
    ///
    /// Returns `None` for empty or whitespace-only text, which callers treat
    /// as "unbound".
    pub fn classify(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(name) = text.strip_prefix(INPUT_PREFIX) {
            if !name.is_empty() {
                return Some(Binding::PipelineInput {
                    name: name.to_string(),
                });
            }
        }

        if let Some((step_id, output)) = text
            .strip_prefix(STEP_PREFIX)
            .and_then(|rest| rest.split_once(OUTPUTS_SEGMENT))
        {
            if !step_id.is_empty() && !output.is_empty() {
                return Some(Binding::StepOutput {
                    step_id: step_id.to_string(),
                    output: output.to_string(),
                });
            }
        }

        Some(Binding::Literal(Literal::classify(text)))
    }

    pub fn pipeline_input(name: impl Into<String>) -> Self {
        Binding::PipelineInput { name: name.into() }
    }

    pub fn step_output(step_id: impl Into<String>, output: impl Into<String>) -> Self {
        Binding::StepOutput {
            step_id: step_id.into(),
            output: output.into(),
        }
    }

    /// Render back to the stored text form
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl Literal {
    fn classify(text: &str) -> Self {
        if let Some(path) = constructor_argument(text, FILE_TYPE) {
            Literal::File(path.to_string())
        } else if let Some(path) = constructor_argument(text, DIRECTORY_TYPE) {
            Literal::Directory(path.to_string())
        } else {
            Literal::Opaque(text.to_string())
        }
    }

    /// Type implied by the constructor; opaque literals have none
    pub fn implied_type(&self) -> Option<TypeDescriptor> {
        match self {
            Literal::File(_) => Some(TypeDescriptor::new(FILE_TYPE)),
            Literal::Directory(_) => Some(TypeDescriptor::new(DIRECTORY_TYPE)),
            Literal::Opaque(_) => None,
        }
    }

    pub fn is_typed(&self) -> bool {
        !matches!(self, Literal::Opaque(_))
    }
}

/// `Name(<arg>)` -> `<arg>`
fn constructor_argument<'a>(text: &'a str, constructor: &str) -> Option<&'a str> {
    text.strip_prefix(constructor)?
        .strip_prefix('(')?
        .strip_suffix(')')
        .map(str::trim)
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::PipelineInput { name } => write!(f, "{}{}", INPUT_PREFIX, name),
            Binding::StepOutput { step_id, output } => {
                write!(f, "{}{}{}{}", STEP_PREFIX, step_id, OUTPUTS_SEGMENT, output)
            }
            Binding::Literal(literal) => write!(f, "{}", literal),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::File(path) => write!(f, "{}({})", FILE_TYPE, path),
            Literal::Directory(path) => write!(f, "{}({})", DIRECTORY_TYPE, path),
            Literal::Opaque(text) => f.write_str(text),
        }
    }
}
