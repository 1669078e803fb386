//! Agent endpoints on a single verifier.
//!
//! ## Endpoints
//!
//! - `GET  {base}/{api}/agents/{id}`: one agent's status.
//! - `GET  {base}/{api}/agents`: all agents known to the verifier.
//! - `PUT  {base}/{api}/agents/{id}/reactivate`: restart attestation for a
//!   failed agent.

use std::collections::BTreeSet;

use attest_core::{AgentId, AgentRecord};
use serde_json::Value;
use tokio::task::JoinSet;
use url::Url;

use crate::error::{body_excerpt, VerifierError};
use crate::wire::{self, Listing};
use crate::{display_base, VerifierClient};

impl VerifierClient {
    /// Fetch one agent's status from `verifier_url`.
    ///
    /// Returns [`VerifierError::Http`] for any non-2xx answer, 404 included.
    pub async fn fetch_agent(
        &self,
        verifier_url: &str,
        agent_id: &AgentId,
    ) -> Result<AgentRecord, VerifierError> {
        let base = self.base_url(verifier_url)?;
        self.fetch_agent_at(&base, agent_id).await
    }

    async fn fetch_agent_at(
        &self,
        base: &Url,
        agent_id: &AgentId,
    ) -> Result<AgentRecord, VerifierError> {
        let url = self.endpoint(base, &["agents", agent_id.as_str()])?;
        let endpoint = format!("GET {}", url.path());
        let body = self.get_json(url, &endpoint).await?;
        wire::record_from_body(agent_id.clone(), &display_base(base), &body)
            .map_err(|reason| VerifierError::UnexpectedBody { endpoint, reason })
    }

    /// Fetch every agent known to `verifier_url`.
    ///
    /// When the listing carries identifiers only, details are fetched
    /// concurrently, bounded by
    /// [`VerifierConfig::max_concurrent_details`](crate::VerifierConfig). An agent whose detail fetch fails is kept as an
    /// `Unknown` record carrying the error under
    /// [`wire::FETCH_ERROR_FIELD`]. Output is sorted by agent identifier.
    pub async fn fetch_all_agents(
        &self,
        verifier_url: &str,
    ) -> Result<Vec<AgentRecord>, VerifierError> {
        let base = self.base_url(verifier_url)?;
        let source = display_base(&base);
        let url = self.endpoint(&base, &["agents"])?;
        let endpoint = format!("GET {}", url.path());
        let body = self.get_json(url, &endpoint).await?;

        let listing = wire::parse_listing(&body)
            .map_err(|reason| VerifierError::UnexpectedBody { endpoint, reason })?;

        let mut records = match listing {
            Listing::Payloads(payloads) => payloads
                .into_iter()
                .map(|(id, raw)| wire::record_from_payload(AgentId::new(id), &source, raw))
                .collect::<Vec<_>>(),
            Listing::Ids(ids) => self.fetch_details(&base, &source, ids).await,
        };
        records.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        tracing::debug!(verifier = %source, agents = records.len(), "fetched agent listing");
        Ok(records)
    }

    /// Fetch details for `ids`, at most `max_concurrent_details` at a time.
    async fn fetch_details(&self, base: &Url, source: &str, ids: Vec<String>) -> Vec<AgentRecord> {
        let limit = self.config.max_concurrent_details.max(1);
        let mut queue = ids.into_iter().collect::<BTreeSet<_>>().into_iter();
        let mut records = Vec::with_capacity(queue.len());
        // Ids spawned but not yet reported back by their task.
        let mut pending = BTreeSet::new();
        let mut set = JoinSet::new();

        loop {
            while set.len() < limit {
                let Some(id) = queue.next() else { break };
                pending.insert(id.clone());
                let client = self.clone();
                let base = base.clone();
                set.spawn(async move {
                    let agent_id = AgentId::new(id);
                    let result = client.fetch_agent_at(&base, &agent_id).await;
                    (agent_id, result)
                });
            }
            let Some(joined) = set.join_next().await else {
                break;
            };
            match joined {
                Ok((agent_id, result)) => {
                    pending.remove(agent_id.as_str());
                    match result {
                        Ok(record) => records.push(record),
                        Err(e) => {
                            tracing::warn!(verifier = %source, agent = %agent_id, "agent detail fetch failed: {e}");
                            records.push(wire::unreachable_record(agent_id, source, &e.to_string()));
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(verifier = %source, "agent detail task failed: {e}");
                }
            }
        }

        // A task that panicked or was cancelled never returned its id.
        for id in pending {
            records.push(wire::unreachable_record(
                AgentId::new(id),
                source,
                "agent detail task did not complete",
            ));
        }
        records
    }

    /// Ask `verifier_url` to resume attestation of `agent_id`.
    ///
    /// Returns the verifier's JSON answer, or `Value::Null` for an empty
    /// body.
    pub async fn reactivate_agent(
        &self,
        verifier_url: &str,
        agent_id: &AgentId,
    ) -> Result<Value, VerifierError> {
        let base = self.base_url(verifier_url)?;
        let url = self.endpoint(&base, &["agents", agent_id.as_str(), "reactivate"])?;
        let endpoint = format!("PUT {}", url.path());

        let resp = crate::retry::retry_send(self.retry_policy(), &endpoint, || {
            self.http.put(url.clone()).send()
        })
        .await
        .map_err(|e| VerifierError::Transport {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        let resp = check_status(resp, &endpoint).await?;

        let bytes = resp.bytes().await.map_err(|e| VerifierError::Transport {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| VerifierError::UnexpectedBody {
            endpoint,
            reason: e.to_string(),
        })
    }

    async fn get_json(&self, url: Url, endpoint: &str) -> Result<Value, VerifierError> {
        let resp = crate::retry::retry_send(self.retry_policy(), endpoint, || {
            self.http.get(url.clone()).send()
        })
        .await
        .map_err(|e| VerifierError::Transport {
            endpoint: endpoint.to_string(),
            source: e,
        })?;
        let resp = check_status(resp, endpoint).await?;
        resp.json().await.map_err(|e| VerifierError::Deserialization {
            endpoint: endpoint.to_string(),
            source: e,
        })
    }
}

async fn check_status(
    resp: reqwest::Response,
    endpoint: &str,
) -> Result<reqwest::Response, VerifierError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(VerifierError::Http {
        endpoint: endpoint.to_string(),
        status,
        body: body_excerpt(&body),
    })
}
