//! Project descriptor types
//!
//! A project is an independently versioned, reusable computation unit. The
//! descriptor is its declared contract: typed inputs, outputs and parameters.
//! It is read-only here and supplied by a project provider.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::domain::types::TypeDescriptor;

/// Declared input/output/parameter contract of one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub inputs: Vec<InputSpec>,
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
    /// Resolved at run time as overrides; never part of the binding graph
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

/// Declared project input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Declared project output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Declared project parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parsed `uses` reference: `name` or `name@version`
///
/// The version is opaque; no range or ordering semantics are applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectRef {
    pub name: String,
    pub version: Option<String>,
}

impl ProjectDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            parameters: Vec::new(),
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, ty: &str) -> Self {
        self.inputs.push(InputSpec {
            name: name.into(),
            ty: TypeDescriptor::parse(ty),
            description: None,
        });
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, ty: &str) -> Self {
        self.outputs.push(OutputSpec {
            name: name.into(),
            ty: TypeDescriptor::parse(ty),
            description: None,
        });
        self
    }

    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        ty: &str,
        default: Option<JsonValue>,
    ) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            ty: TypeDescriptor::parse(ty),
            default,
            description: None,
        });
        self
    }

    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&OutputSpec> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// `name` or `name@version`
    pub fn reference(&self) -> String {
        ProjectRef {
            name: self.name.clone(),
            version: self.version.clone(),
        }
        .to_string()
    }
}

impl ProjectRef {
    pub fn parse(uses: &str) -> Self {
        let uses = uses.trim();
        match uses.rsplit_once('@') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => Self {
                name: name.to_string(),
                version: Some(version.to_string()),
            },
            _ => Self {
                name: uses.to_string(),
                version: None,
            },
        }
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_ref_parse() {
        assert_eq!(
            ProjectRef::parse("filter@1.2.0"),
            ProjectRef {
                name: "filter".to_string(),
                version: Some("1.2.0".to_string())
            }
        );
        assert_eq!(ProjectRef::parse("filter").version, None);
        assert_eq!(ProjectRef::parse("filter@").name, "filter@");
        assert_eq!(ProjectRef::parse("filter@1.2.0").to_string(), "filter@1.2.0");
    }

    #[test]
    fn test_descriptor_lookups() {
        let project = ProjectDescriptor::new("filter")
            .with_input("samplesheet", "File")
            .with_output("filtered_sheet", "File")
            .with_parameter("threshold", "String", Some(serde_json::json!("0.05")));

        assert!(project.input("samplesheet").is_some());
        assert!(project.input("filtered_sheet").is_none());
        assert_eq!(project.output("filtered_sheet").unwrap().ty.base(), "File");
        assert_eq!(
            project.parameter("threshold").unwrap().default,
            Some(serde_json::json!("0.05"))
        );
        assert_eq!(project.reference(), "filter");
    }

    #[test]
    fn test_descriptor_document_shape() {
        let json = serde_json::json!({
            "name": "count",
            "version": "0.3.1",
            "inputs": [
                { "name": "samplesheet", "type": "File", "description": "Sheet to count" },
                { "name": "reference", "type": "Directory?" }
            ],
            "outputs": [{ "name": "counts", "type": "Map[String, File]" }]
        });

        let project: ProjectDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(project.reference(), "count@0.3.1");
        assert!(project.input("reference").unwrap().ty.is_optional());
        assert!(project.output("counts").unwrap().ty.is_map());
        assert!(project.parameters.is_empty());
    }
}
