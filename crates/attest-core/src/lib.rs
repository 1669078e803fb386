#![deny(missing_docs)]

//! # attest-core -- Foundational Types for the Attestation Toolkit
//!
//! Every other crate in the workspace depends on `attest-core`; it depends
//! on nothing internal. Only `serde`, `serde_json`, `thiserror`, and
//! `chrono` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype for agent identifiers.** An [`AgentId`] is an opaque,
//!    caller-supplied string. Its format is not checked here; it is never
//!    confused with a verifier URL or any other bare string.
//!
//! 2. **Single [`OperationalState`] enum.** One definition, four variants,
//!    and one exhaustive mapping table from the verifier's numeric codes and
//!    state labels. Unrecognised states map to [`OperationalState::Unknown`];
//!    they are never dropped.
//!
//! 3. **[`HealthTier`] is derived, never stored.** [`HealthTier::classify`]
//!    is the only way to obtain a tier for a record.
//!
//! 4. **[`UnknownVariantError`] at the boundary.** Unrecognised policy
//!    types and tool names are rejected with a typed, descriptive error that
//!    is fatal for one call only.

pub mod agent;
pub mod error;
pub mod identity;
pub mod state;

// Re-export primary types at crate root for ergonomic imports.
pub use agent::AgentRecord;
pub use error::UnknownVariantError;
pub use identity::AgentId;
pub use state::{state_label, HealthTier, OperationalState};

/// Default verifier base URL used when the caller supplies none.
pub const DEFAULT_VERIFIER_URL: &str = "http://localhost:8881";

/// Verifier REST API version used in request paths.
pub const DEFAULT_API_VERSION: &str = "v2.1";
