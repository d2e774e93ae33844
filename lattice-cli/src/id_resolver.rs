//! ID resolver module
//!
//! Resolves run ID prefixes to full UUIDs by querying the engine, so users
//! can type short, unambiguous prefixes.

use anyhow::{Context, Result, anyhow};
use lattice_client::{EngineClient, Run};
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Resolve a run ID or prefix to a full UUID
///
/// If the input is already a full UUID, returns it immediately.
/// Otherwise, fetches all runs and finds the one matching the prefix.
///
/// # Errors
/// Returns an error if:
/// - No run matches the prefix
/// - Multiple runs match the prefix (ambiguous)
/// - API call fails
pub async fn resolve_run_id(client: &EngineClient, id_or_prefix: &IdOrPrefix) -> Result<Uuid> {
    if let Some(uuid) = id_or_prefix.as_uuid() {
        return Ok(uuid);
    }

    let runs = client
        .list_runs()
        .await
        .context("Failed to fetch runs for ID resolution")?;

    tracing::debug!("Resolving run prefix {} among {} run(s)", id_or_prefix, runs.len());
    match_unique(&runs, id_or_prefix)
}

fn match_unique(runs: &[Run], id_or_prefix: &IdOrPrefix) -> Result<Uuid> {
    let matches: Vec<&Run> = runs.iter().filter(|r| id_or_prefix.matches(&r.id)).collect();

    match matches.as_slice() {
        [] => Err(anyhow!("No run found with ID starting with '{}'", id_or_prefix)),
        [run] => Ok(run.id),
        _ => {
            let ids: Vec<String> = matches.iter().map(|r| r.id.to_string()).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple runs: {}",
                id_or_prefix,
                ids.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(id: &str) -> Run {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "pipeline": "demo",
            "status": "Queued",
            "created_at": "2026-01-01T00:00:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn test_match_unique() {
        let runs = vec![
            run("aa000000-0000-4000-8000-000000000001"),
            run("ab000000-0000-4000-8000-000000000002"),
        ];

        assert_eq!(
            match_unique(&runs, &IdOrPrefix::parse("aa")).unwrap(),
            runs[0].id
        );
        assert!(match_unique(&runs, &IdOrPrefix::parse("a")).is_err());
        assert!(match_unique(&runs, &IdOrPrefix::parse("ff")).is_err());
    }
}
