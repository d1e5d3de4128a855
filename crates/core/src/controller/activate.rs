//! Activate transition: drop partitions left behind by older versions.

use futures_util::future::join_all;
use serde::Serialize;

use super::{CacheController, Phase};

/// What activation did. Cleanup is best-effort; the takeover always happens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct ActivateOutcome {
    pub deleted: Vec<String>,
    pub retained: Vec<String>,
    /// Stale partitions whose deletion failed.
    pub failed: Vec<String>,
    /// Partition enumeration itself failed, so nothing was cleaned up.
    pub enumeration_failed: bool,
    /// Take control of every open client page now.
    pub claim_clients: bool,
}

impl CacheController {
    /// Delete every partition not in this version's known set, then become
    /// [`Phase::Active`].
    ///
    /// Never fails: storage errors are logged and reported in the outcome.
    pub async fn activate(&self) -> ActivateOutcome {
        let keep = self.names().known_set(self.config().preserve_legacy_cache);
        let mut outcome = ActivateOutcome { claim_clients: true, ..Default::default() };

        match self.storage.keys().await {
            Ok(existing) => {
                let (retained, stale): (Vec<String>, Vec<String>) =
                    existing.into_iter().partition(|name| keep.contains(&name.as_str()));
                outcome.retained = retained;

                let results = join_all(stale.iter().map(|name| self.storage.delete(name))).await;
                for (name, result) in stale.into_iter().zip(results) {
                    match result {
                        Ok(_) => {
                            tracing::debug!("deleted stale partition {}", name);
                            outcome.deleted.push(name);
                        }
                        Err(e) => {
                            tracing::warn!(partition = %name, error = %e, "failed to delete stale partition");
                            outcome.failed.push(name);
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to enumerate partitions; skipping cleanup");
                outcome.enumeration_failed = true;
            }
        }

        self.set_phase(Phase::Active).await;
        tracing::info!(
            version = %self.version(),
            deleted = outcome.deleted.len(),
            failed = outcome.failed.len(),
            "activated"
        );
        outcome
    }
}
