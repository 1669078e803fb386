//! Policy view of one agent.
//!
//! Verifiers return `tpm_policy`, `vtpm_policy` and `meta_data` as JSON
//! documents encoded inside strings. They are decoded here; an empty or
//! malformed string decodes to an empty object.

use attest_core::{AgentId, AgentRecord};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::detail::flag;

/// Policy fields for one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentPolicies {
    /// Agent identifier.
    pub agent_id: AgentId,
    /// PCR policy, decoded.
    pub tpm_policy: Value,
    /// Virtual TPM PCR policy, decoded.
    pub vtpm_policy: Value,
    /// Agent metadata, decoded.
    pub meta_data: Value,
    /// A measured-boot reference state is configured.
    pub has_measured_boot_policy: bool,
    /// A runtime (IMA) policy is configured.
    pub has_runtime_policy: bool,
    /// Hash algorithms the verifier accepts; empty when unset.
    pub accepted_tpm_hash_algs: Vec<String>,
    /// Encryption algorithms the verifier accepts.
    pub accepted_tpm_encryption_algs: Vec<String>,
    /// Signing algorithms the verifier accepts.
    pub accepted_tpm_signing_algs: Vec<String>,
}

impl AgentPolicies {
    /// Build the policy view of `record`.
    pub fn from_record(record: &AgentRecord) -> Self {
        let raw = &record.raw;
        Self {
            agent_id: record.agent_id.clone(),
            tpm_policy: embedded_json(&record.agent_id, raw, "tpm_policy"),
            vtpm_policy: embedded_json(&record.agent_id, raw, "vtpm_policy"),
            meta_data: embedded_json(&record.agent_id, raw, "meta_data"),
            has_measured_boot_policy: flag(raw, "has_mb_refstate"),
            has_runtime_policy: flag(raw, "has_runtime_policy"),
            accepted_tpm_hash_algs: string_list(raw, "accept_tpm_hash_algs"),
            accepted_tpm_encryption_algs: string_list(raw, "accept_tpm_encryption_algs"),
            accepted_tpm_signing_algs: string_list(raw, "accept_tpm_signing_algs"),
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn embedded_json(agent_id: &AgentId, raw: &Map<String, Value>, key: &str) -> Value {
    match raw.get(key) {
        Some(Value::String(s)) if s.trim().is_empty() => empty_object(),
        Some(Value::String(s)) => serde_json::from_str(s).unwrap_or_else(|e| {
            tracing::warn!(%agent_id, field = key, "cannot decode embedded policy: {e}");
            empty_object()
        }),
        // Already decoded by the verifier.
        Some(v @ Value::Object(_)) => v.clone(),
        _ => empty_object(),
    }
}

fn string_list(raw: &Map<String, Value>, key: &str) -> Vec<String> {
    raw.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
