//! Lattice HTTP Client
//!
//! HTTP adapters for the two remote collaborators of a pipeline run: the
//! execution engine that launches runs, and the project registry that serves
//! project descriptors.
//!
//! # Example
//!
//! ```no_run
//! use lattice_client::EngineClient;
//! use lattice_core::domain::pipeline::Pipeline;
//! use lattice_flow::RunRequestBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = EngineClient::new("http://localhost:8080");
//!
//!     let pipeline = Pipeline::new("demo");
//!     let request = RunRequestBuilder::with_overrides(&pipeline, [("samplesheet", "/data/a.csv")])
//!         .build();
//!
//!     let run = client.launch_run(&request).await?;
//!     println!("Launched run: {}", run.id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod projects;
mod runs;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use lattice_core::domain::run::{Run, RunStatus};
pub use projects::RegistryProjectProvider;

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the execution engine API
///
/// Covers launching a run from a built request and reading run records back.
#[derive(Debug, Clone)]
pub struct EngineClient {
    /// Base URL of the engine (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl EngineClient {
    /// Create a new engine client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the engine API (e.g., "http://localhost:8080")
    ///
    /// # Example
    /// ```
    /// use lattice_client::EngineClient;
    ///
    /// let client = EngineClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new engine client with a custom HTTP client
    ///
    /// Use this to configure timeouts, proxies or TLS.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the engine API
    /// * `client` - A configured reqwest Client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: trim_base_url(base_url.into()),
            client,
        }
    }

    /// Get the base URL of the engine
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

pub(crate) fn trim_base_url(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = EngineClient::new("http://localhost:8080");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_trims_trailing_slashes() {
        let client = EngineClient::new("http://engine.local:9000//");
        assert_eq!(client.base_url(), "http://engine.local:9000");
    }

    #[test]
    fn test_client_with_custom_client() {
        let client = EngineClient::with_client("http://localhost:8080/", Client::new());
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
