//! Concurrent agent listing across several verifiers.

use std::collections::BTreeSet;

use attest_core::AgentRecord;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::error::VerifierError;
use crate::VerifierClient;

/// A verifier that contributed no records.
#[derive(Debug, Serialize)]
pub struct VerifierFailure {
    /// The verifier as the caller named it.
    pub verifier_url: String,
    /// Why it failed.
    #[serde(serialize_with = "display_error")]
    pub error: VerifierError,
}

fn display_error<S: serde::Serializer>(e: &VerifierError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(e)
}

/// Outcome of a multi-verifier fetch.
///
/// `records` holds everything the responsive verifiers returned, unmerged.
/// Every verifier that did not contribute appears in `failures`.
#[derive(Debug, Default, Serialize)]
pub struct FleetFetch {
    /// Records from verifiers that answered.
    pub records: Vec<AgentRecord>,
    /// Verifiers that errored or missed the deadline.
    pub failures: Vec<VerifierFailure>,
}

impl FleetFetch {
    /// True when every verifier answered.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl VerifierClient {
    /// Fetch all agents from every verifier in `verifier_urls` concurrently.
    ///
    /// Duplicate URLs are queried once. The whole fetch is bounded by
    /// [`crate::VerifierConfig::fleet_deadline`]; verifiers still pending
    /// when it expires are reported as [`VerifierError::DeadlineExceeded`].
    /// One verifier failing never hides records from the others.
    pub async fn fetch_fleet(&self, verifier_urls: &[String]) -> FleetFetch {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("fleet_fetch", %request_id, verifiers = verifier_urls.len());
        self.fetch_fleet_inner(verifier_urls).instrument(span).await
    }

    async fn fetch_fleet_inner(&self, verifier_urls: &[String]) -> FleetFetch {
        let unique: BTreeSet<&str> = verifier_urls.iter().map(String::as_str).collect();
        let deadline = tokio::time::Instant::now() + self.config().fleet_deadline();

        let mut pending: BTreeSet<String> = BTreeSet::new();
        let mut set = JoinSet::new();
        for url in unique {
            let client = self.clone();
            let url = url.to_string();
            pending.insert(url.clone());
            set.spawn(
                async move {
                    let result = client.fetch_all_agents(&url).await;
                    (url, result)
                }
                .in_current_span(),
            );
        }

        let mut out = FleetFetch::default();
        loop {
            match tokio::time::timeout_at(deadline, set.join_next()).await {
                Ok(Some(Ok((url, result)))) => {
                    pending.remove(&url);
                    match result {
                        Ok(records) => out.records.extend(records),
                        Err(error) => {
                            tracing::warn!(verifier = %url, "verifier fetch failed: {error}");
                            out.failures.push(VerifierFailure {
                                verifier_url: url,
                                error,
                            });
                        }
                    }
                }
                // A panicked task cannot tell us its URL; it stays in
                // `pending` and is reported below.
                Ok(Some(Err(e))) => {
                    tracing::error!("verifier fetch task failed: {e}");
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(pending = pending.len(), "fleet deadline expired");
                    set.abort_all();
                    for verifier_url in std::mem::take(&mut pending) {
                        out.failures.push(VerifierFailure {
                            error: VerifierError::DeadlineExceeded {
                                verifier_url: verifier_url.clone(),
                            },
                            verifier_url,
                        });
                    }
                    break;
                }
            }
        }

        for verifier_url in pending {
            out.failures.push(VerifierFailure {
                error: VerifierError::TaskFailed {
                    verifier_url: verifier_url.clone(),
                    reason: "fetch task ended without a result".into(),
                },
                verifier_url,
            });
        }

        out.failures.sort_by(|a, b| a.verifier_url.cmp(&b.verifier_url));
        tracing::info!(
            records = out.records.len(),
            failed = out.failures.len(),
            "fleet fetch finished"
        );
        out
    }
}
