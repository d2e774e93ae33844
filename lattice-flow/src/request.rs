//! Run request builder
//!
//! Assembles the payload handed to the execution engine. Two mutually
//! exclusive modes exist, each with its own constructor:
//!
//! - [`RunRequestBuilder::with_overrides`]: literal values for pipeline inputs
//! - [`RunRequestBuilder::with_selection`]: stored record ids the engine
//!   materializes into the pipeline's single `List[GenotypeRecord]` input
//!
//! The builder does not re-validate types; run the validator first.

use indexmap::IndexMap;
use lattice_core::domain::pipeline::Pipeline;
use lattice_core::domain::types::GENOTYPE_RECORD_TYPE;
use lattice_core::dto::run::{DataSelection, RunInput, RunRequest, SelectionContext};
use std::collections::HashSet;
use std::hash::Hash;

use crate::error::RequestError;

const INPUT_PREFIX: &str = "inputs.";

/// Records chosen by the caller for a selection-mode run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Stored file ids; ignored when `urls` is non-empty
    pub file_ids: Vec<i64>,
    pub urls: Vec<String>,
    pub participant_ids: Vec<i64>,
    pub dataset_name: Option<String>,
    pub context: SelectionContext,
}

/// Builder for [`RunRequest`]
#[derive(Debug, Clone)]
pub struct RunRequestBuilder {
    pipeline: String,
    input: RunInput,
    parameter_overrides: IndexMap<String, String>,
    results_dir: Option<String>,
}

impl Selection {
    pub fn new(file_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            file_ids: file_ids.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Select records by URL instead of stored file id
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_dataset(mut self, name: impl Into<String>) -> Self {
        self.dataset_name = Some(name.into());
        self
    }

    pub fn with_participants(mut self, participant_ids: impl IntoIterator<Item = i64>) -> Self {
        self.participant_ids = participant_ids.into_iter().collect();
        self
    }

    pub fn with_context(mut self, context: SelectionContext) -> Self {
        self.context = context;
        self
    }
}

impl RunRequestBuilder {
    /// Start an override-mode request
    ///
    /// Keys may be written bare (`samplesheet`) or prefixed
    /// (`inputs.samplesheet`); they are stored bare. Inputs that have no
    /// default and no override are only logged: whether the run can succeed
    /// is the validator's and the engine's concern.
    pub fn with_overrides<I, K, V>(pipeline: &Pipeline, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut values = IndexMap::new();
        for (key, value) in overrides {
            let key = key.as_ref().trim();
            let name = key.strip_prefix(INPUT_PREFIX).unwrap_or(key);
            if pipeline.input(name).is_none() {
                tracing::warn!(
                    "Override for undeclared input '{}' in pipeline {}",
                    name,
                    pipeline.name
                );
            }
            values.insert(name.to_string(), value.into());
        }

        for (name, input) in &pipeline.inputs {
            if input.needs_value() && !values.contains_key(name) {
                tracing::warn!(
                    "Input '{}' of pipeline {} has no default and no override",
                    name,
                    pipeline.name
                );
            }
        }

        Self {
            pipeline: pipeline.name.clone(),
            input: RunInput::InputOverrides(values),
            parameter_overrides: IndexMap::new(),
            results_dir: None,
        }
    }

    /// Start a selection-mode request
    ///
    /// # Errors
    /// Returns [`RequestError::NoCompatibleInput`] unless the pipeline declares
    /// exactly one input of type `List[GenotypeRecord]`. URLs take precedence
    /// over file ids; [`RequestError::NoValidUrls`] is returned when URLs were
    /// given but all are blank, and [`RequestError::EmptySelection`] when
    /// neither URLs nor file ids remain after de-duplication.
    pub fn with_selection(pipeline: &Pipeline, selection: Selection) -> Result<Self, RequestError> {
        let input = selection_input(pipeline)?;

        let (urls, file_ids) = if selection.urls.is_empty() {
            (Vec::new(), dedupe(selection.file_ids))
        } else {
            let urls = dedupe(
                selection
                    .urls
                    .into_iter()
                    .map(|url| url.trim().to_string())
                    .filter(|url| !url.is_empty()),
            );
            if urls.is_empty() {
                return Err(RequestError::NoValidUrls);
            }
            if !selection.file_ids.is_empty() {
                tracing::debug!("URLs given; ignoring {} file id(s)", selection.file_ids.len());
            }
            (urls, Vec::new())
        };
        if urls.is_empty() && file_ids.is_empty() {
            return Err(RequestError::EmptySelection);
        }

        tracing::debug!(
            "Selected {} record(s) for input '{}' of pipeline {}",
            urls.len() + file_ids.len(),
            input,
            pipeline.name
        );

        Ok(Self {
            pipeline: pipeline.name.clone(),
            input: RunInput::Selection(DataSelection {
                input,
                urls,
                file_ids,
                participant_ids: dedupe(selection.participant_ids),
                dataset_name: selection
                    .dataset_name
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty()),
                context: clean_context(selection.context),
            }),
            parameter_overrides: IndexMap::new(),
            results_dir: None,
        })
    }

    /// Override one step parameter, keyed `<stepId>.<parameter>`
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if !key.contains('.') {
            tracing::warn!("Parameter override '{}' is not of the form step.parameter", key);
        }
        self.parameter_overrides.insert(key, value.into());
        self
    }

    pub fn parameters<I, K, V>(self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        overrides
            .into_iter()
            .fold(self, |builder, (key, value)| builder.parameter(key, value))
    }

    /// Output directory for the run; blank leaves allocation to the engine
    pub fn results_dir(mut self, dir: impl Into<String>) -> Self {
        let dir = dir.into();
        self.results_dir = if dir.trim().is_empty() { None } else { Some(dir) };
        self
    }

    pub fn build(self) -> RunRequest {
        RunRequest {
            pipeline: self.pipeline,
            input: self.input,
            parameter_overrides: self.parameter_overrides,
            results_dir: self.results_dir,
        }
    }
}

/// Name of the only input of type exactly `List[GenotypeRecord]`
fn selection_input(pipeline: &Pipeline) -> Result<String, RequestError> {
    let candidates: Vec<&String> = pipeline
        .inputs
        .iter()
        .filter(|(_, input)| {
            input.ty.is_list()
                && !input.ty.is_map()
                && !input.ty.is_optional()
                && input.ty.base() == GENOTYPE_RECORD_TYPE
        })
        .map(|(name, _)| name)
        .collect();

    match candidates.as_slice() {
        [name] => Ok((*name).clone()),
        _ => Err(RequestError::NoCompatibleInput {
            found: candidates.len(),
        }),
    }
}

/// Drop repeats, keeping first-seen order
fn dedupe<T, I>(items: I) -> Vec<T>
where
    T: Clone + Eq + Hash,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn clean_context(context: SelectionContext) -> SelectionContext {
    let keep = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    SelectionContext {
        data_type: keep(context.data_type),
        data_source: keep(context.data_source),
        dataset_owner: keep(context.dataset_owner),
        asset_keys: context
            .asset_keys
            .into_iter()
            .filter(|k| !k.trim().is_empty())
            .collect(),
    }
}
