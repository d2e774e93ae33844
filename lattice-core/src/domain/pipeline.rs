//! Pipeline domain types
//!
//! A pipeline is an ordered list of steps plus the pipeline-level inputs they
//! may bind to. Declaration order is the only dependency ordering: a step may
//! only consume outputs of steps declared before it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::binding::Binding;
use crate::domain::types::TypeDescriptor;

/// Pipeline definition
///
/// Structure shared between the persistence layer (stores it as a flat
/// document), the validator and the run request builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub inputs: IndexMap<String, PipelineInput>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Pipeline-level input declaration
///
/// Serialized either as a bare type string (`"File"`) or as
/// `{ type, default }` when a default is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PipelineInputDocument", into = "PipelineInputDocument")]
pub struct PipelineInput {
    pub ty: TypeDescriptor,
    pub default: Option<JsonValue>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PipelineInputDocument {
    Bare(TypeDescriptor),
    Detailed {
        #[serde(rename = "type")]
        ty: TypeDescriptor,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<JsonValue>,
    },
}

/// One invocation of a reusable project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Unique within the pipeline; the name used in `step.<id>.outputs.<x>`
    pub id: String,
    /// Project reference, resolved by a project provider
    pub uses: String,
    /// Project input name -> binding text. A missing key means unbound.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub with: IndexMap<String, String>,
    /// Locally produced output name -> literal constructor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<IndexMap<String, String>>,
    /// Store name -> persistence of one output into a structured sink
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<IndexMap<String, StoreSpec>>,
}

/// Persistence of one step output into a structured sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSpec {
    pub kind: String,
    pub destination: String,
    /// Output of the owning step that is stored
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_column: Option<String>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: IndexMap::new(),
            steps: Vec::new(),
        }
    }

    /// Builder form of [`Pipeline::add_input`]
    pub fn with_input(mut self, name: impl Into<String>, input: PipelineInput) -> Self {
        self.add_input(name, input);
        self
    }

    /// Builder form of [`Pipeline::push_step`]
    pub fn with_step(mut self, step: Step) -> Self {
        self.push_step(step);
        self
    }

    /// Declare (or replace) a pipeline input
    pub fn add_input(&mut self, name: impl Into<String>, input: PipelineInput) {
        self.inputs.insert(name.into(), input);
    }

    /// Remove a pipeline input, keeping the order of the others
    pub fn remove_input(&mut self, name: &str) -> Option<PipelineInput> {
        self.inputs.shift_remove(name)
    }

    /// Append a step after every step it may depend on
    pub fn push_step(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn input(&self, name: &str) -> Option<&PipelineInput> {
        self.inputs.get(name)
    }

    /// First step declared with `id`
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Position of the first step declared with `id`
    pub fn step_index(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    /// Steps declared strictly before `index`
    ///
    /// This prefix is the complete set of steps the step at `index` may bind
    /// to. Out-of-range indexes yield the whole list.
    pub fn steps_before(&self, index: usize) -> &[Step] {
        &self.steps[..index.min(self.steps.len())]
    }
}

impl PipelineInput {
    pub fn new(ty: TypeDescriptor) -> Self {
        Self { ty, default: None }
    }

    pub fn with_default(mut self, default: impl Into<JsonValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// The caller must supply a value at run time
    pub fn needs_value(&self) -> bool {
        self.default.is_none()
    }
}

impl From<PipelineInputDocument> for PipelineInput {
    fn from(doc: PipelineInputDocument) -> Self {
        match doc {
            PipelineInputDocument::Bare(ty) => Self { ty, default: None },
            PipelineInputDocument::Detailed { ty, default } => Self { ty, default },
        }
    }
}

impl From<PipelineInput> for PipelineInputDocument {
    fn from(input: PipelineInput) -> Self {
        match input.default {
            None => PipelineInputDocument::Bare(input.ty),
            Some(default) => PipelineInputDocument::Detailed {
                ty: input.ty,
                default: Some(default),
            },
        }
    }
}

impl Step {
    pub fn new(id: impl Into<String>, uses: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uses: uses.into(),
            with: IndexMap::new(),
            publish: None,
            store: None,
        }
    }

    /// Builder form of [`Step::bind`]
    pub fn with_binding(mut self, input: impl Into<String>, binding: Binding) -> Self {
        self.bind(input, binding);
        self
    }

    /// Classified binding of one project input, if bound
    pub fn binding(&self, input: &str) -> Option<Binding> {
        self.with.get(input).and_then(|text| Binding::classify(text))
    }

    /// Replace the binding of one input with the rendered text of `binding`
    pub fn bind(&mut self, input: impl Into<String>, binding: Binding) {
        self.with.insert(input.into(), binding.render());
    }

    pub fn with_publish(mut self, output: impl Into<String>, literal: impl Into<String>) -> Self {
        self.publish
            .get_or_insert_with(IndexMap::new)
            .insert(output.into(), literal.into());
        self
    }

    pub fn with_store(mut self, name: impl Into<String>, spec: StoreSpec) -> Self {
        self.store
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), spec);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_steps() -> Pipeline {
        Pipeline::new("demo")
            .with_step(Step::new("a", "proj-a"))
            .with_step(Step::new("b", "proj-b"))
            .with_step(Step::new("c", "proj-c"))
    }

    #[test]
    fn test_steps_before_is_strict_prefix() {
        let pipeline = three_steps();
        let ids = |steps: &[Step]| steps.iter().map(|s| s.id.clone()).collect::<Vec<_>>();

        assert!(pipeline.steps_before(0).is_empty());
        assert_eq!(ids(pipeline.steps_before(2)), vec!["a", "b"]);
        assert_eq!(ids(pipeline.steps_before(10)), vec!["a", "b", "c"]);
        assert_eq!(pipeline.step_index("c"), Some(2));
        assert_eq!(pipeline.step_index("z"), None);
    }

    #[test]
    fn test_remove_input_keeps_order() {
        let mut pipeline = Pipeline::new("demo")
            .with_input("x", PipelineInput::new(TypeDescriptor::parse("File")))
            .with_input("y", PipelineInput::new(TypeDescriptor::parse("String")))
            .with_input("z", PipelineInput::new(TypeDescriptor::parse("Bool")));

        assert!(pipeline.remove_input("y").is_some());
        assert!(pipeline.remove_input("missing").is_none());
        assert_eq!(pipeline.inputs.keys().collect::<Vec<_>>(), vec!["x", "z"]);
    }

    #[test]
    fn test_bind_replaces_text() {
        let mut step =
            Step::new("count", "counter").with_binding("sheet", Binding::pipeline_input("sheet"));
        assert_eq!(step.with["sheet"], "inputs.sheet");

        step.bind("sheet", Binding::step_output("filter", "filtered"));
        assert_eq!(step.with["sheet"], "step.filter.outputs.filtered");
        assert_eq!(
            step.binding("sheet"),
            Some(Binding::step_output("filter", "filtered"))
        );
        assert_eq!(step.binding("other"), None);
    }

    #[test]
    fn test_input_serializes_bare_without_default() {
        let bare = PipelineInput::new(TypeDescriptor::parse("File"));
        assert_eq!(serde_json::to_value(&bare).unwrap(), serde_json::json!("File"));

        let detailed = PipelineInput::new(TypeDescriptor::parse("String?")).with_default("hg38");
        assert_eq!(
            serde_json::to_value(&detailed).unwrap(),
            serde_json::json!({ "type": "String?", "default": "hg38" })
        );
    }

    #[test]
    fn test_input_deserializes_both_shapes() {
        let bare: PipelineInput =
            serde_json::from_value(serde_json::json!("List[GenotypeRecord]")).unwrap();
        assert!(bare.ty.is_list());
        assert!(bare.needs_value());

        let detailed: PipelineInput =
            serde_json::from_value(serde_json::json!({ "type": "File", "default": "a.csv" }))
                .unwrap();
        assert_eq!(detailed.default, Some(serde_json::json!("a.csv")));
        assert!(!detailed.needs_value());
    }

    #[test]
    fn test_step_document_shape() {
        let step = Step::new("filter", "filter@1.0")
            .with_binding("samplesheet", Binding::pipeline_input("samplesheet"))
            .with_publish("filtered_sheet", "File(filtered.csv)")
            .with_store(
                "counts",
                StoreSpec {
                    kind: "sql".to_string(),
                    destination: "SQL()".to_string(),
                    source: "filtered_sheet".to_string(),
                    table_name: Some("counts".to_string()),
                    key_column: None,
                },
            );

        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["with"]["samplesheet"], "inputs.samplesheet");
        assert_eq!(value["publish"]["filtered_sheet"], "File(filtered.csv)");
        assert_eq!(value["store"]["counts"]["table_name"], "counts");
        assert!(value["store"]["counts"].get("key_column").is_none());

        let back: Step = serde_json::from_value(value).unwrap();
        assert_eq!(back, step);
    }
}
