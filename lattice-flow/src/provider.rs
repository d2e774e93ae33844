//! Project descriptor providers
//!
//! A provider turns a step's `uses` reference into the [`ProjectDescriptor`]
//! it declares. Failures are per reference and never abort a validation pass:
//! [`fetch_projects`] records them against every step sharing the reference.

use async_trait::async_trait;
use lattice_core::domain::pipeline::Pipeline;
use lattice_core::domain::project::{ProjectDescriptor, ProjectRef};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::document::parse_project;
use crate::error::ProviderError;

/// File name looked up inside a project directory
pub const PROJECT_FILE: &str = "project.yaml";

/// Source of project descriptors
///
/// Implementations must be safe to call concurrently: [`fetch_projects`]
/// issues one call per distinct reference in parallel.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use lattice_core::domain::project::{ProjectDescriptor, ProjectRef};
/// use lattice_flow::{ProjectProvider, ProviderError};
///
/// struct Fixed;
///
/// #[async_trait]
/// impl ProjectProvider for Fixed {
///     async fn fetch(&self, uses: &str) -> Result<ProjectDescriptor, ProviderError> {
///         match uses {
///             "filter" => Ok(ProjectDescriptor::new("filter").with_input("samplesheet", "File")),
///             other => Err(ProviderError::NotFound(other.to_string())),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait ProjectProvider: Send + Sync {
    /// Fetch the descriptor for one `uses` reference
    ///
    /// # Errors
    /// Returns [`ProviderError::NotFound`] when nothing is known under the
    /// reference and [`ProviderError::Unreadable`] when the descriptor exists
    /// but cannot be loaded.
    async fn fetch(&self, uses: &str) -> Result<ProjectDescriptor, ProviderError>;
}

/// Descriptor fetch outcome for every step, aligned with `pipeline.steps`
#[derive(Debug, Clone, Default)]
pub struct ResolvedProjects {
    results: Vec<Result<ProjectDescriptor, ProviderError>>,
}

impl ResolvedProjects {
    /// Resolve every step synchronously through `lookup`
    ///
    /// Convenient for callers that already hold descriptors in memory.
    pub fn resolve_with<F>(pipeline: &Pipeline, mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Result<ProjectDescriptor, ProviderError>,
    {
        Self {
            results: pipeline.steps.iter().map(|s| lookup(&s.uses)).collect(),
        }
    }

    /// Outcome for the step at `index`
    ///
    /// `None` when the index lies beyond the resolved list, which callers
    /// treat like a failed fetch.
    pub fn for_step(&self, index: usize) -> Option<&Result<ProjectDescriptor, ProviderError>> {
        self.results.get(index)
    }

    /// Descriptor for the step at `index`, if it was fetched successfully
    pub fn descriptor(&self, index: usize) -> Option<&ProjectDescriptor> {
        self.results.get(index).and_then(|r| r.as_ref().ok())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of steps whose descriptor could not be fetched
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.is_err()).count()
    }
}

/// Fetch the descriptor of every step in `pipeline`
///
/// Each distinct `uses` reference is fetched once; fetches run concurrently
/// and all of them are awaited. A failed fetch is recorded for every step
/// sharing the reference while the other steps still resolve.
///
/// # Arguments
/// * `provider` - Shared provider used by every fetch task
/// * `pipeline` - Pipeline whose steps are resolved
///
/// # Returns
/// Outcomes aligned with `pipeline.steps`
pub async fn fetch_projects(
    provider: Arc<dyn ProjectProvider>,
    pipeline: &Pipeline,
) -> ResolvedProjects {
    let mut references: Vec<String> = Vec::new();
    for step in &pipeline.steps {
        if !references.contains(&step.uses) {
            references.push(step.uses.clone());
        }
    }

    tracing::debug!(
        "Fetching {} project(s) for pipeline: {}",
        references.len(),
        pipeline.name
    );

    let mut tasks = JoinSet::new();
    for uses in references {
        let provider = Arc::clone(&provider);
        tasks.spawn(async move {
            let result = provider.fetch(&uses).await;
            (uses, result)
        });
    }

    let mut fetched: HashMap<String, Result<ProjectDescriptor, ProviderError>> = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((uses, result)) => {
                if let Err(err) = &result {
                    tracing::warn!("Failed to fetch project {}: {}", uses, err);
                }
                fetched.insert(uses, result);
            }
            Err(err) => tracing::warn!("Project fetch task failed: {}", err),
        }
    }

    ResolvedProjects::resolve_with(pipeline, |uses| {
        fetched
            .get(uses)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::unreadable(uses, "fetch task did not complete")))
    })
}

/// Provider reading descriptors from a directory tree
///
/// `uses` is resolved to `<root>/<uses>/project.yaml`, or to `<root>/<uses>`
/// when that path is itself a YAML file. A versioned reference
/// `name@version` may also live under `<root>/<name>/<version>/` or, failing
/// that, `<root>/<name>/`.
#[derive(Debug, Clone)]
pub struct DirectoryProjectProvider {
    root: PathBuf,
}

impl DirectoryProjectProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Descriptor file for `uses`, if one exists
    ///
    /// `name@version` that has no directory of its own falls back to
    /// `<name>/<version>` and then to `<name>`.
    async fn locate(&self, uses: &str) -> Option<PathBuf> {
        if let Some(path) = self.locate_relative(Path::new(uses)).await {
            return Some(path);
        }

        let reference = ProjectRef::parse(uses);
        let version = reference.version.as_deref()?;
        if !is_relative_name(Path::new(version)) {
            return None;
        }
        let name = Path::new(&reference.name);
        if let Some(path) = self.locate_relative(&name.join(version)).await {
            return Some(path);
        }

        tracing::debug!("No directory for version {} of {}", version, reference.name);
        self.locate_relative(name).await
    }

    async fn locate_relative(&self, relative: &Path) -> Option<PathBuf> {
        if !is_relative_name(relative) {
            return None;
        }

        let base = self.root.join(relative);
        let nested = base.join(PROJECT_FILE);
        if is_file(&nested).await {
            return Some(nested);
        }

        let is_yaml = matches!(
            base.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml && is_file(&base).await {
            return Some(base);
        }

        None
    }
}

/// Non-empty and made only of plain components, so it stays under the root
fn is_relative_name(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

#[async_trait]
impl ProjectProvider for DirectoryProjectProvider {
    async fn fetch(&self, uses: &str) -> Result<ProjectDescriptor, ProviderError> {
        let uses = uses.trim();
        let path = self
            .locate(uses)
            .await
            .ok_or_else(|| ProviderError::NotFound(uses.to_string()))?;

        tracing::debug!("Reading project {} from {}", uses, path.display());

        let source = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ProviderError::unreadable(uses, e))?;
        parse_project(&source).map_err(|e| ProviderError::unreadable(uses, e))
    }
}

/// In-memory provider keyed by `uses` reference
#[derive(Debug, Clone, Default)]
pub struct StaticProjectProvider {
    projects: HashMap<String, ProjectDescriptor>,
}

impl StaticProjectProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under its own reference (`name` or `name@version`)
    pub fn with_project(mut self, project: ProjectDescriptor) -> Self {
        self.projects.insert(project.reference(), project);
        self
    }

    /// Register a descriptor under an explicit `uses` reference
    pub fn insert(&mut self, uses: impl Into<String>, project: ProjectDescriptor) {
        self.projects.insert(uses.into(), project);
    }

    pub fn get(&self, uses: &str) -> Result<ProjectDescriptor, ProviderError> {
        self.projects
            .get(uses.trim())
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(uses.to_string()))
    }
}

#[async_trait]
impl ProjectProvider for StaticProjectProvider {
    async fn fetch(&self, uses: &str) -> Result<ProjectDescriptor, ProviderError> {
        self.get(uses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::domain::pipeline::Step;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingProvider {
        inner: StaticProjectProvider,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProjectProvider for CountingProvider {
        async fn fetch(&self, uses: &str) -> Result<ProjectDescriptor, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(uses).await
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::new("demo")
            .with_step(Step::new("a", "filter"))
            .with_step(Step::new("b", "missing"))
            .with_step(Step::new("c", "filter"))
    }

    #[tokio::test]
    async fn test_fetch_failure_is_scoped_to_step() {
        let provider = Arc::new(CountingProvider {
            inner: StaticProjectProvider::new().with_project(ProjectDescriptor::new("filter")),
            calls: AtomicUsize::new(0),
        });

        let resolved = fetch_projects(provider.clone(), &pipeline()).await;

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved.failures(), 1);
        assert!(resolved.descriptor(0).is_some());
        assert!(matches!(
            resolved.for_step(1),
            Some(Err(ProviderError::NotFound(r))) if r == "missing"
        ));
        assert!(resolved.descriptor(2).is_some());
        // "filter" is shared by two steps but fetched once
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_directory_provider_layouts() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("filter")).unwrap();
        std::fs::write(
            dir.path().join("filter").join(PROJECT_FILE),
            "name: filter\noutputs:\n  - name: filtered_sheet\n    type: File\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("count.yaml"), "name: count\n").unwrap();

        let provider = DirectoryProjectProvider::new(dir.path());

        let filter = provider.fetch("filter").await.unwrap();
        assert!(filter.output("filtered_sheet").is_some());

        let count = provider.fetch("count.yaml").await.unwrap();
        assert_eq!(count.name, "count");
    }

    #[tokio::test]
    async fn test_directory_provider_versioned_references() {
        let dir = TempDir::new().unwrap();
        let versioned = dir.path().join("filter").join("2.0");
        std::fs::create_dir_all(&versioned).unwrap();
        std::fs::write(
            dir.path().join("filter").join(PROJECT_FILE),
            "name: filter\nversion: \"1.0\"\n",
        )
        .unwrap();
        std::fs::write(
            versioned.join(PROJECT_FILE),
            "name: filter\nversion: \"2.0\"\n",
        )
        .unwrap();

        let provider = DirectoryProjectProvider::new(dir.path());

        let v2 = provider.fetch("filter@2.0").await.unwrap();
        assert_eq!(v2.version.as_deref(), Some("2.0"));

        let fallback = provider.fetch("filter@3.0").await.unwrap();
        assert_eq!(fallback.version.as_deref(), Some("1.0"));

        assert!(provider.fetch("filter@../x").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_directory_provider_errors() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("broken")).unwrap();
        std::fs::write(
            dir.path().join("broken").join(PROJECT_FILE),
            "inputs: [not, a, descriptor",
        )
        .unwrap();

        let provider = DirectoryProjectProvider::new(dir.path());

        assert!(provider.fetch("absent").await.unwrap_err().is_not_found());
        assert!(provider.fetch("../escape").await.unwrap_err().is_not_found());
        assert!(matches!(
            provider.fetch("broken").await,
            Err(ProviderError::Unreadable { .. })
        ));
    }

    #[test]
    fn test_static_provider_keys_by_reference() {
        let mut provider = StaticProjectProvider::new().with_project(ProjectDescriptor {
            version: Some("1.0".to_string()),
            ..ProjectDescriptor::new("filter")
        });
        provider.insert("alias", ProjectDescriptor::new("count"));

        assert!(provider.get("filter@1.0").is_ok());
        assert!(provider.get("filter").unwrap_err().is_not_found());
        assert_eq!(provider.get("alias").unwrap().name, "count");
    }
}
