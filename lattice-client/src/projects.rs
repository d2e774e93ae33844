//! Registry-backed project provider

use async_trait::async_trait;
use lattice_core::domain::project::ProjectDescriptor;
use lattice_flow::{ProjectProvider, ProviderError};
use reqwest::{Client, StatusCode};

use crate::trim_base_url;

/// Project provider fetching descriptors from a remote registry
///
/// Each reference is requested as `GET {base_url}/api/projects?ref=<uses>`.
#[derive(Debug, Clone)]
pub struct RegistryProjectProvider {
    base_url: String,
    client: Client,
}

impl RegistryProjectProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: trim_base_url(base_url.into()),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn projects_url(&self) -> String {
        format!("{}/api/projects", self.base_url)
    }
}

/// Map a registry status onto the provider error taxonomy
fn status_error(uses: &str, status: StatusCode, body: String) -> ProviderError {
    if status == StatusCode::NOT_FOUND {
        ProviderError::NotFound(uses.to_string())
    } else {
        ProviderError::unreadable(uses, format!("registry returned {}: {}", status, body))
    }
}

#[async_trait]
impl ProjectProvider for RegistryProjectProvider {
    async fn fetch(&self, uses: &str) -> Result<ProjectDescriptor, ProviderError> {
        tracing::debug!("Fetching project {} from {}", uses, self.base_url);

        let response = self
            .client
            .get(self.projects_url())
            .query(&[("ref", uses)])
            .send()
            .await
            .map_err(|e| ProviderError::unreadable(uses, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(uses, status, body));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::unreadable(uses, format!("invalid descriptor: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projects_url() {
        let provider = RegistryProjectProvider::new("https://registry.example.org/");
        assert_eq!(provider.base_url(), "https://registry.example.org");
        assert_eq!(
            provider.projects_url(),
            "https://registry.example.org/api/projects"
        );
    }

    #[test]
    fn test_status_error_mapping() {
        assert_eq!(
            status_error("filter@1.0", StatusCode::NOT_FOUND, String::new()),
            ProviderError::NotFound("filter@1.0".to_string())
        );

        match status_error("filter", StatusCode::BAD_GATEWAY, "upstream down".to_string()) {
            ProviderError::Unreadable { reference, reason } => {
                assert_eq!(reference, "filter");
                assert!(reason.contains("502"));
                assert!(reason.contains("upstream down"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
