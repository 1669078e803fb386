//! # attest-status -- Agent Status Aggregation
//!
//! Pure, synchronous transformations over [`AgentRecord`] sequences. No
//! I/O happens here: records arrive from `attest-verifier-client` (or a
//! test) and leave as merged, classified, or summarized values.
//!
//! ## Merge Rule
//!
//! When several verifiers report the same agent, the record with the most
//! recent `last_seen` wins. A missing timestamp is older than any present
//! one. Ties go to the lexically smaller verifier URL, so the result never
//! depends on arrival order.
//!
//! ## Views
//!
//! - [`FleetSummary`]: tier counts over a listing.
//! - [`AgentDetail`]: the attestation detail fields of one agent.
//! - [`AgentPolicies`]: the policy fields of one agent, with the
//!   JSON-in-string fields decoded.

pub mod aggregate;
pub mod detail;
pub mod policies;
pub mod summary;

pub use aggregate::{aggregate, classify, failed_agents};
pub use detail::AgentDetail;
pub use policies::AgentPolicies;
pub use summary::FleetSummary;

#[doc(no_inline)]
pub use attest_core::{AgentRecord, HealthTier};
