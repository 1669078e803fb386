//! Attestation detail view of one agent.
//!
//! Reads the verifier payload kept in [`AgentRecord::raw`]. Every field is
//! optional on the wire; absent strings become empty, absent counters zero,
//! and absent optional values stay `None`.

use attest_core::{AgentId, AgentRecord, HealthTier, OperationalState};
use serde::Serialize;
use serde_json::{Map, Value};

/// Detail fields for one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentDetail {
    /// Agent identifier.
    pub agent_id: AgentId,
    /// Normalized operational state.
    pub state: OperationalState,
    /// Tier derived from `state`.
    pub health: HealthTier,
    /// Numeric `operational_state` as sent, when the verifier sent one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_code: Option<i64>,
    /// Verifier's name for the state, e.g. `"Get Quote"`.
    pub state_label: String,
    /// Successful attestations so far.
    pub attestation_count: u64,
    /// Unix time of the last quote received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_received_quote: Option<i64>,
    /// Unix time of the last attestation that passed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_successful_attestation: Option<i64>,
    /// Severity of the last failure event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_level: Option<i64>,
    /// Identifier of the last failure event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_event_id: Option<String>,
    /// TPM hash algorithm in use.
    pub hash_algorithm: String,
    /// TPM encryption algorithm in use.
    pub encryption_algorithm: String,
    /// TPM signing algorithm in use.
    pub signing_algorithm: String,
    /// Identifier of the verifier instance.
    pub verifier_id: String,
    /// `ip:port` of the verifier instance handling the agent, empty if the
    /// payload names none.
    pub verifier_address: String,
    /// Base URL the record was fetched from.
    pub verifier_url: String,
    /// A measured-boot reference state is configured.
    pub has_measured_boot: bool,
    /// A runtime (IMA) policy is configured.
    pub has_runtime_policy: bool,
    /// Set when the verifier listed the agent but its detail fetch failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

impl AgentDetail {
    /// Build the detail view of `record`.
    pub fn from_record(record: &AgentRecord) -> Self {
        let raw = &record.raw;
        Self {
            agent_id: record.agent_id.clone(),
            state: record.state,
            health: record.health(),
            state_code: record.state_code,
            state_label: record.state_label.clone(),
            attestation_count: raw
                .get("attestation_count")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            last_received_quote: int(raw, "last_received_quote"),
            last_successful_attestation: int(raw, "last_successful_attestation"),
            severity_level: int(raw, "severity_level"),
            last_event_id: string(raw, "last_event_id"),
            hash_algorithm: string(raw, "hash_alg").unwrap_or_default(),
            encryption_algorithm: string(raw, "enc_alg").unwrap_or_default(),
            signing_algorithm: string(raw, "sign_alg").unwrap_or_default(),
            verifier_id: string(raw, "verifier_id").unwrap_or_default(),
            verifier_address: verifier_address(raw),
            verifier_url: record.verifier_url.clone(),
            has_measured_boot: flag(raw, "has_mb_refstate"),
            has_runtime_policy: flag(raw, "has_runtime_policy"),
            fetch_error: string(raw, "fetch_error"),
        }
    }
}

pub(crate) fn int(raw: &Map<String, Value>, key: &str) -> Option<i64> {
    raw.get(key).and_then(Value::as_i64)
}

pub(crate) fn string(raw: &Map<String, Value>, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Verifiers send these flags as 0/1 integers; some send booleans.
pub(crate) fn flag(raw: &Map<String, Value>, key: &str) -> bool {
    match raw.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

fn verifier_address(raw: &Map<String, Value>) -> String {
    let ip = string(raw, "verifier_ip").unwrap_or_default();
    if ip.is_empty() {
        return String::new();
    }
    match raw.get("verifier_port") {
        Some(Value::Number(port)) => format!("{ip}:{port}"),
        Some(Value::String(port)) if !port.is_empty() => format!("{ip}:{port}"),
        _ => ip,
    }
}
