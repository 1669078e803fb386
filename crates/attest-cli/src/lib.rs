//! # attest-cli -- Command-Line Shell for the Attestation Toolkit
//!
//! Provides the `attest` binary and the [`service::AttestService`] call
//! surface it is built on.
//!
//! ## Subcommands
//!
//! - `attest validate-policy [PATH|-] [--strict]`
//! - `attest generate-policy <basic|strict|custom> [--allow GLOB]...`
//! - `attest agent-status|agent-info|agent-policies|reactivate <ID>`
//! - `attest list-agents`, `attest failed-agents`
//! - `attest call <TOOL> [--args JSON]` for name-based dispatch
//!
//! ```bash
//! attest validate-policy policy.json --strict
//! attest --verifier http://v1:8881 --verifier http://v2:8881 list-agents
//! attest call check_agent_status --args '{"agent_id": "agent-123"}'
//! ```

pub mod cli;
pub mod error;
pub mod output;
pub mod service;
pub mod tools;

pub use error::ToolError;
pub use service::AttestService;
pub use tools::{dispatch, ToolName, ToolOutput, Verdict};
