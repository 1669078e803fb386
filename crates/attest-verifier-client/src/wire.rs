//! Mapping from verifier JSON to [`AgentRecord`].
//!
//! Verifiers wrap payloads in an envelope:
//!
//! ```json
//! {"code": 200, "status": "Success", "results": { ... }}
//! ```
//!
//! Bodies without `results` are read as the payload itself. The state field
//! is `operational_state`, sent as an integer code or as a label; both go
//! through the one mapping table in [`attest_core::state`]. A payload
//! without a recognizable state yields [`OperationalState::Unknown`]; it is
//! never dropped.

use attest_core::{state_label, AgentId, AgentRecord, OperationalState};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Payload field carrying the operational state.
pub const STATE_FIELD: &str = "operational_state";

/// Payload field set on placeholder records for agents whose detail could
/// not be fetched.
pub const FETCH_ERROR_FIELD: &str = "fetch_error";

fn envelope_payload(body: &Value) -> &Value {
    match body.get("results") {
        Some(results) if results.is_object() => results,
        _ => body,
    }
}

/// Build a record from an agent-detail response body.
pub fn record_from_body(
    agent_id: AgentId,
    verifier_url: &str,
    body: &Value,
) -> Result<AgentRecord, String> {
    let payload = envelope_payload(body)
        .as_object()
        .ok_or_else(|| "agent response is not a JSON object".to_string())?;
    Ok(record_from_payload(agent_id, verifier_url, payload.clone()))
}

/// Build a record from an agent payload object.
pub fn record_from_payload(
    agent_id: AgentId,
    verifier_url: &str,
    raw: Map<String, Value>,
) -> AgentRecord {
    let (state, state_code, state_label) = read_state(raw.get(STATE_FIELD));
    AgentRecord {
        agent_id,
        state,
        state_code,
        state_label,
        verifier_url: verifier_url.to_string(),
        last_seen: read_last_seen(&raw),
        raw,
    }
}

/// Placeholder for an agent the verifier listed but whose detail fetch
/// failed.
pub fn unreachable_record(agent_id: AgentId, verifier_url: &str, error: &str) -> AgentRecord {
    let mut raw = Map::new();
    raw.insert(FETCH_ERROR_FIELD.to_string(), Value::String(error.to_string()));
    record_from_payload(agent_id, verifier_url, raw)
}

fn from_code(code: i64) -> (OperationalState, Option<i64>, String) {
    (
        OperationalState::from_code(code),
        Some(code),
        state_label(code).to_string(),
    )
}

fn read_state(value: Option<&Value>) -> (OperationalState, Option<i64>, String) {
    match value {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(code) => from_code(code),
            None => (OperationalState::Unknown, None, n.to_string()),
        },
        Some(Value::String(s)) => match s.trim().parse::<i64>() {
            Ok(code) => from_code(code),
            Err(_) => (OperationalState::from_label(s), None, s.clone()),
        },
        _ => (OperationalState::Unknown, None, "Unknown".to_string()),
    }
}

fn read_last_seen(raw: &Map<String, Value>) -> Option<DateTime<Utc>> {
    let from_quote = raw
        .get("last_received_quote")
        .and_then(Value::as_i64)
        .filter(|secs| *secs > 0)
        .and_then(|secs| DateTime::from_timestamp(secs, 0));
    from_quote.or_else(|| {
        raw.get("last_seen")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Shape of an agent-listing response.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    /// Identifiers only; details must be fetched per agent.
    Ids(Vec<String>),
    /// Identifier to payload, already carrying state.
    Payloads(Vec<(String, Map<String, Value>)>),
}

/// Parse an agent-listing response body.
///
/// Accepts `results.uuids` as a flat or nested list (verifiers group
/// identifiers per verifier instance), or `results` as an object keyed by
/// agent identifier whose values are payload objects.
pub fn parse_listing(body: &Value) -> Result<Listing, String> {
    let results = body.get("results").unwrap_or(body);

    if let Some(uuids) = results.get("uuids") {
        let mut ids = Vec::new();
        collect_ids(uuids, &mut ids);
        return Ok(Listing::Ids(ids));
    }

    let Some(entries) = results.as_object() else {
        return Err("agent listing is not a JSON object".to_string());
    };
    let mut payloads = Vec::with_capacity(entries.len());
    for (id, payload) in entries {
        match payload {
            Value::Object(map) => payloads.push((id.clone(), map.clone())),
            _ => return Err(format!("listing entry \"{id}\" is not an agent object")),
        }
    }
    Ok(Listing::Payloads(payloads))
}

fn collect_ids(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_ids(v, out)),
        _ => {}
    }
}
