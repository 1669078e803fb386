//! Merge and classification of agent records.

use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use attest_core::{AgentId, AgentRecord, HealthTier};

/// Health tier of a record.
pub fn classify(record: &AgentRecord) -> HealthTier {
    record.health()
}

/// True when `candidate` should replace `current` for the same agent.
fn supersedes(candidate: &AgentRecord, current: &AgentRecord) -> bool {
    // Option<DateTime> orders None first, which is what we want.
    match candidate.last_seen.cmp(&current.last_seen) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => candidate.verifier_url < current.verifier_url,
    }
}

/// Merge records so each agent appears once, sorted by agent identifier.
///
/// The output does not depend on the order of `records`.
pub fn aggregate(records: impl IntoIterator<Item = AgentRecord>) -> Vec<AgentRecord> {
    let mut merged: BTreeMap<AgentId, AgentRecord> = BTreeMap::new();
    for record in records {
        match merged.entry(record.agent_id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                if supersedes(&record, slot.get()) {
                    tracing::debug!(
                        agent_id = %record.agent_id,
                        kept = %record.verifier_url,
                        dropped = %slot.get().verifier_url,
                        "duplicate agent across verifiers"
                    );
                    slot.insert(record);
                }
            }
        }
    }
    merged.into_values().collect()
}

/// Records classified [`HealthTier::Red`], in input order.
pub fn failed_agents(records: &[AgentRecord]) -> Vec<AgentRecord> {
    records
        .iter()
        .filter(|r| classify(r) == HealthTier::Red)
        .cloned()
        .collect()
}
