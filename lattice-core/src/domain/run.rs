//! Run domain types
//!
//! A run is the execution engine's record of one triggered pipeline. The
//! engine owns it; Lattice only reads it back after launching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Run record returned by the execution engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Identifier allocated by the engine
    pub id: Uuid,

    /// Pipeline the run was launched from
    pub pipeline: String,

    /// Current status of the run
    pub status: RunStatus,

    /// Output directory, allocated by the engine when none was requested
    #[serde(default)]
    pub results_dir: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Run execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunStatus {
    /// No further transitions will happen
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Queued => write!(f, "Queued"),
            RunStatus::Running => write!(f, "Running"),
            RunStatus::Succeeded => write!(f, "Succeeded"),
            RunStatus::Failed => write!(f, "Failed"),
            RunStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}
