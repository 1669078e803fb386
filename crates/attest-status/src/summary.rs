//! Fleet-wide tier counts.

use attest_core::{AgentRecord, HealthTier};
use serde::Serialize;

/// Tier counts over a set of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FleetSummary {
    /// Agents in [`HealthTier::Green`].
    pub green: usize,
    /// Agents in [`HealthTier::Yellow`].
    pub yellow: usize,
    /// Agents in [`HealthTier::Red`].
    pub red: usize,
    /// All agents counted.
    pub total: usize,
}

impl FleetSummary {
    /// Count tiers over `records`. Pass aggregated records so agents seen
    /// by several verifiers are counted once.
    pub fn from_records(records: &[AgentRecord]) -> Self {
        records.iter().fold(Self::default(), |mut s, r| {
            match r.health() {
                HealthTier::Green => s.green += 1,
                HealthTier::Yellow => s.yellow += 1,
                HealthTier::Red => s.red += 1,
            }
            s.total += 1;
            s
        })
    }

    /// True when no agent is in [`HealthTier::Red`].
    pub fn is_healthy(&self) -> bool {
        self.red == 0
    }
}
