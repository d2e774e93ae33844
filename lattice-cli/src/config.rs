//! Configuration module
//!
//! Handles CLI configuration: where the engine lives and where project
//! descriptors come from.

use anyhow::{Result, bail};
use lattice_client::{EngineClient, RegistryProjectProvider};
use lattice_flow::{DirectoryProjectProvider, ProjectProvider};
use std::path::PathBuf;
use std::sync::Arc;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the execution engine
    pub engine_url: String,
    /// Root of a directory tree of project descriptors
    pub projects_dir: Option<PathBuf>,
    /// URL of a remote project registry
    pub registry_url: Option<String>,
}

impl Config {
    /// Reject settings no command can work with
    pub fn validate(&self) -> Result<()> {
        if self.engine_url.trim().is_empty() {
            bail!("Engine URL cannot be empty");
        }

        if let Some(dir) = &self.projects_dir {
            if !dir.is_dir() {
                bail!("Projects directory does not exist: {}", dir.display());
            }
        }

        Ok(())
    }

    pub fn engine_client(&self) -> EngineClient {
        EngineClient::new(&self.engine_url)
    }

    /// Provider used to resolve step `uses` references
    ///
    /// The projects directory wins over the registry when both are set.
    pub fn project_provider(&self) -> Result<Arc<dyn ProjectProvider>> {
        if let Some(dir) = &self.projects_dir {
            return Ok(Arc::new(DirectoryProjectProvider::new(dir)));
        }

        match self.registry_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(Arc::new(RegistryProjectProvider::new(url))),
            _ => bail!(
                "No project source configured: pass --projects <dir> or --registry-url <url> \
                 (or set LATTICE_PROJECTS_DIR / LATTICE_REGISTRY_URL)"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config() -> Config {
        Config {
            engine_url: "http://localhost:8080".to_string(),
            projects_dir: None,
            registry_url: None,
        }
    }

    #[test]
    fn test_validate_rejects_empty_engine_url() {
        let config = Config {
            engine_url: "  ".to_string(),
            ..config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_projects_dir() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            projects_dir: Some(dir.path().join("absent")),
            ..config()
        };
        assert!(config.validate().is_err());

        let config = Config {
            projects_dir: Some(dir.path().to_path_buf()),
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_project_provider_requires_a_source() {
        assert!(config().project_provider().is_err());

        let config = Config {
            registry_url: Some("https://registry.example.org".to_string()),
            ..config()
        };
        assert!(config.project_provider().is_ok());
    }

    #[tokio::test]
    async fn test_projects_dir_wins_over_registry() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("filter")).unwrap();
        std::fs::write(dir.path().join("filter/project.yaml"), "name: filter\n").unwrap();

        let config = Config {
            projects_dir: Some(dir.path().to_path_buf()),
            registry_url: Some("http://127.0.0.1:1".to_string()),
            ..config()
        };

        let provider = config.project_provider().unwrap();
        assert_eq!(provider.fetch("filter").await.unwrap().name, "filter");
    }
}
