//! # Agent Records
//!
//! [`AgentRecord`] is the normalized, verifier-independent view of one
//! agent as seen by one verifier at one point in time. It is a plain value:
//! no shared mutable state, freely cloned and sent between tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identity::AgentId;
use crate::state::{HealthTier, OperationalState};

/// One agent's status as reported by one verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Caller-supplied agent identifier.
    pub agent_id: AgentId,
    /// Normalized operational state.
    pub state: OperationalState,
    /// Numeric state code as reported, when the verifier sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_code: Option<i64>,
    /// Human label of the reported state.
    pub state_label: String,
    /// Base URL of the verifier that produced this record.
    pub verifier_url: String,
    /// When the verifier last heard from the agent. `None` sorts before
    /// every known timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    /// The verifier's payload for this agent, kept for detail views.
    #[serde(default)]
    pub raw: Map<String, Value>,
}

impl AgentRecord {
    /// Health tier derived from [`Self::state`].
    pub fn health(&self) -> HealthTier {
        HealthTier::classify(self.state)
    }

    /// Look up a field of the raw payload.
    pub fn raw_field(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(state: OperationalState) -> AgentRecord {
        AgentRecord {
            agent_id: AgentId::new("agent-123"),
            state,
            state_code: None,
            state_label: "Registered".into(),
            verifier_url: "http://localhost:8881".into(),
            last_seen: Some(Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()),
            raw: Map::new(),
        }
    }

    #[test]
    fn health_follows_state() {
        assert_eq!(record(OperationalState::Registered).health(), HealthTier::Green);
        assert_eq!(record(OperationalState::Failed).health(), HealthTier::Red);
        assert_eq!(record(OperationalState::Unknown).health(), HealthTier::Yellow);
    }

    #[test]
    fn serializes_without_absent_optionals() {
        let mut r = record(OperationalState::Registered);
        r.last_seen = None;
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["agent_id"], "agent-123");
        assert_eq!(v["state"], "registered");
        assert!(v.get("state_code").is_none());
        assert!(v.get("last_seen").is_none());
    }
}
