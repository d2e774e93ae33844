//! Run DTOs for the execution engine

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};

/// Request to trigger a run of one pipeline
///
/// Carries exactly one input mode, flattened into the payload as either
/// `input_overrides` or `selection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub pipeline: String,
    #[serde(flatten)]
    pub input: RunInput,
    /// `<stepId>.<parameter>` -> value
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameter_overrides: IndexMap<String, String>,
    /// When absent the engine allocates one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_dir: Option<String>,
}

/// How the pipeline inputs are supplied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunInput {
    /// Pipeline input name -> literal value
    InputOverrides(IndexMap<String, String>),
    /// Stored records the engine materializes into the input artifact
    Selection(DataSelection),
}

/// Selection of stored records for the single record-list pipeline input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSelection {
    /// Pipeline input the materialized artifact is bound to
    pub input: String,
    /// Record URLs; when present, `file_ids` is empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participant_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_name: Option<String>,
    #[serde(flatten)]
    pub context: SelectionContext,
}

/// Pass-through hints about where the selected records come from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub asset_keys: Vec<String>,
}

impl RunRequest {
    pub fn input_overrides(&self) -> Option<&IndexMap<String, String>> {
        match &self.input {
            RunInput::InputOverrides(overrides) => Some(overrides),
            RunInput::Selection(_) => None,
        }
    }

    pub fn selection(&self) -> Option<&DataSelection> {
        match &self.input {
            RunInput::Selection(selection) => Some(selection),
            RunInput::InputOverrides(_) => None,
        }
    }

    /// Render as `--set key=value` arguments for command-line engines
    ///
    /// Input overrides are addressed as `inputs.<name>`; parameter overrides
    /// keep their `<stepId>.<parameter>` key. A selection contributes no
    /// `--set` pair since the engine binds the materialized artifact itself.
    pub fn set_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(overrides) = self.input_overrides() {
            for (name, value) in overrides {
                args.push("--set".to_string());
                args.push(format!("inputs.{}={}", name, value));
            }
        }

        for (key, value) in &self.parameter_overrides {
            args.push("--set".to_string());
            args.push(format!("{}={}", key, value));
        }

        if let Some(dir) = &self.results_dir {
            args.push("--results-dir".to_string());
            args.push(dir.clone());
        }

        args
    }

    /// Summary stored alongside the run record
    pub fn metadata(&self) -> JsonValue {
        let inputs: Map<String, JsonValue> = self
            .input_overrides()
            .into_iter()
            .flatten()
            .map(|(name, value)| (format!("inputs.{}", name), json!(value)))
            .collect();

        let mut root = Map::new();
        root.insert("input_overrides".to_string(), JsonValue::Object(inputs));
        root.insert(
            "parameter_overrides".to_string(),
            json!(self.parameter_overrides),
        );
        if let Some(selection) = self.selection() {
            root.insert("data_selection".to_string(), json!(selection));
        }
        JsonValue::Object(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn override_request() -> RunRequest {
        let mut overrides = IndexMap::new();
        overrides.insert("samplesheet".to_string(), "/data/sheet.csv".to_string());

        let mut params = IndexMap::new();
        params.insert("filter.threshold".to_string(), "0.1".to_string());

        RunRequest {
            pipeline: "demo".to_string(),
            input: RunInput::InputOverrides(overrides),
            parameter_overrides: params,
            results_dir: Some("/runs/demo".to_string()),
        }
    }

    #[test]
    fn test_override_payload_shape() {
        let value = serde_json::to_value(override_request()).unwrap();
        assert_eq!(value["pipeline"], "demo");
        assert_eq!(value["input_overrides"]["samplesheet"], "/data/sheet.csv");
        assert_eq!(value["parameter_overrides"]["filter.threshold"], "0.1");
        assert!(value.get("selection").is_none());
    }

    #[test]
    fn test_selection_payload_round_trips() {
        let request = RunRequest {
            pipeline: "gwas".to_string(),
            input: RunInput::Selection(DataSelection {
                input: "genotypes".to_string(),
                urls: vec![],
                file_ids: vec![3, 1],
                participant_ids: vec![],
                dataset_name: None,
                context: SelectionContext {
                    data_type: Some("mock".to_string()),
                    ..Default::default()
                },
            }),
            parameter_overrides: IndexMap::new(),
            results_dir: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["selection"]["file_ids"], json!([3, 1]));
        assert_eq!(value["selection"]["data_type"], "mock");
        assert!(value["selection"].get("participant_ids").is_none());
        assert!(value["selection"].get("urls").is_none());
        assert!(value.get("input_overrides").is_none());

        let back: RunRequest = serde_json::from_value(value).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_url_selection_payload() {
        let request = RunRequest {
            pipeline: "gwas".to_string(),
            input: RunInput::Selection(DataSelection {
                input: "genotypes".to_string(),
                urls: vec!["syft://alice@example.org/a.txt".to_string()],
                file_ids: vec![],
                participant_ids: vec![],
                dataset_name: Some("cohort".to_string()),
                context: SelectionContext::default(),
            }),
            parameter_overrides: IndexMap::new(),
            results_dir: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["selection"]["urls"], json!(["syft://alice@example.org/a.txt"]));
        assert_eq!(value["selection"]["dataset_name"], "cohort");
        assert!(value["selection"].get("file_ids").is_none());
        assert_eq!(request.metadata()["data_selection"]["dataset_name"], "cohort");
    }

    #[test]
    fn test_set_args() {
        assert_eq!(
            override_request().set_args(),
            vec![
                "--set",
                "inputs.samplesheet=/data/sheet.csv",
                "--set",
                "filter.threshold=0.1",
                "--results-dir",
                "/runs/demo",
            ]
        );
    }

    #[test]
    fn test_metadata_prefixes_inputs() {
        let metadata = override_request().metadata();
        assert_eq!(
            metadata["input_overrides"]["inputs.samplesheet"],
            "/data/sheet.csv"
        );
        assert_eq!(metadata["parameter_overrides"]["filter.threshold"], "0.1");
        assert!(metadata.get("data_selection").is_none());
    }
}
