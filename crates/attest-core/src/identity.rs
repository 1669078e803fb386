//! # Agent Identifier
//!
//! The verifier addresses agents by an opaque identifier (a UUID in
//! practice). The core does not validate its format; it only keeps agent
//! identifiers from being mixed up with other strings.

use serde::{Deserialize, Serialize};

/// Opaque identifier of an attested agent.
///
/// Ordering is lexical on the underlying string, which is the order used
/// for aggregated output.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Wrap a caller-supplied identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AgentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_string_is_accepted() {
        assert_eq!(AgentId::new("agent-123").as_str(), "agent-123");
        assert_eq!(AgentId::new("").as_str(), "");
        assert_eq!(
            AgentId::from("d432fbb3-d2f1-4a97-9ef7-75bd81c00000").to_string(),
            "d432fbb3-d2f1-4a97-9ef7-75bd81c00000"
        );
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = AgentId::new("agent-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"agent-1\"");
        let back: AgentId = serde_json::from_str("\"agent-1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn orders_lexically() {
        let mut ids = vec![AgentId::new("b"), AgentId::new("a"), AgentId::new("c")];
        ids.sort();
        assert_eq!(
            ids.iter().map(AgentId::as_str).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }
}
