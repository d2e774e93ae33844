//! Run-related engine endpoints

use crate::EngineClient;
use crate::error::Result;
use lattice_core::domain::run::Run;
use lattice_core::dto::run::RunRequest;
use uuid::Uuid;

impl EngineClient {
    // =============================================================================
    // Runs
    // =============================================================================

    /// Launch a run from a built request
    ///
    /// # Arguments
    /// * `request` - Output of the run request builder
    ///
    /// # Returns
    /// The run record allocated by the engine
    ///
    /// # Errors
    /// An engine that cannot start the run (for instance because its
    /// container runtime is missing) answers with a non-2xx status, returned
    /// as [`ClientError::ApiError`](crate::ClientError::ApiError).
    ///
    /// # Example
    /// ```no_run
    /// # use lattice_client::EngineClient;
    /// # use lattice_core::domain::pipeline::Pipeline;
    /// # use lattice_flow::{RunRequestBuilder, Selection};
    /// # async fn example(pipeline: Pipeline) -> anyhow::Result<()> {
    /// let client = EngineClient::new("http://localhost:8080");
    /// let request = RunRequestBuilder::with_selection(&pipeline, Selection::new([12, 15]))?
    ///     .results_dir("/runs/gwas")
    ///     .build();
    /// let run = client.launch_run(&request).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn launch_run(&self, request: &RunRequest) -> Result<Run> {
        tracing::info!("Launching run for pipeline: {}", request.pipeline);
        tracing::debug!("Run metadata: {}", request.metadata());

        let url = format!("{}/api/runs", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;

        self.handle_response(response).await
    }

    /// Get a run by ID
    pub async fn get_run(&self, run_id: Uuid) -> Result<Run> {
        tracing::debug!("Getting run: {}", run_id);

        let url = format!("{}/api/runs/{}", self.base_url, run_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List every run the engine knows about
    pub async fn list_runs(&self) -> Result<Vec<Run>> {
        tracing::debug!("Listing all runs");

        let url = format!("{}/api/runs", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
