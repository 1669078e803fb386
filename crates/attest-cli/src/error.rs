//! Errors surfaced by the service and tool dispatch layers.

use attest_core::UnknownVariantError;
use attest_policy::PolicySchemaError;
use attest_verifier_client::VerifierError;

/// Failure of one service call or tool invocation. Fatal for that call
/// only.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Unrecognised policy type or tool name.
    #[error(transparent)]
    UnknownVariant(#[from] UnknownVariantError),
    /// The verifier could not be reached or rejected the request.
    #[error(transparent)]
    Verifier(#[from] VerifierError),
    /// The strict-mode policy schema failed to compile.
    #[error(transparent)]
    Schema(#[from] PolicySchemaError),
    /// Tool arguments were missing or malformed.
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },
}
