//! # Tool Dispatch
//!
//! Maps a tool name and a JSON argument object onto an [`AttestService`]
//! call. Unknown tool names are rejected with
//! [`attest_core::UnknownVariantError`]; one bad call never affects the
//! next.
//!
//! | Tool | Arguments |
//! |------|-----------|
//! | `check_agent_status` | `agent_id`, `verifier_url`? |
//! | `list_agents` | `verifier_url`? |
//! | `get_agent_info` | `agent_id`, `verifier_url`? |
//! | `validate_attestation_policy` | `policy`, `strict`? |
//! | `generate_ima_policy` | `policy_type`, `allowlist`? |
//! | `get_failed_agents` | `verifier_url`? |
//! | `get_agent_policies` | `agent_id`, `verifier_url`? |
//! | `reactivate_agent` | `agent_id`, `verifier_url`? |

use std::str::FromStr;

use attest_core::{HealthTier, UnknownVariantError};
use attest_policy::{Strictness, ValidationReport};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;
use crate::service::AttestService;

/// Tools exposed at the dispatch boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    /// One agent's state and health tier.
    CheckAgentStatus,
    /// All agents across verifiers, with a tier summary.
    ListAgents,
    /// One agent's attestation detail.
    GetAgentInfo,
    /// Validate policy text.
    ValidateAttestationPolicy,
    /// Generate a policy from a template.
    GenerateImaPolicy,
    /// Agents in the red tier.
    GetFailedAgents,
    /// One agent's decoded policies.
    GetAgentPolicies,
    /// Resume attestation of an agent.
    ReactivateAgent,
}

impl ToolName {
    /// Wire names, in declaration order.
    pub const NAMES: [&'static str; 8] = [
        "check_agent_status",
        "list_agents",
        "get_agent_info",
        "validate_attestation_policy",
        "generate_ima_policy",
        "get_failed_agents",
        "get_agent_policies",
        "reactivate_agent",
    ];

    /// All tools, in declaration order.
    pub fn all() -> &'static [ToolName] {
        &[
            Self::CheckAgentStatus,
            Self::ListAgents,
            Self::GetAgentInfo,
            Self::ValidateAttestationPolicy,
            Self::GenerateImaPolicy,
            Self::GetFailedAgents,
            Self::GetAgentPolicies,
            Self::ReactivateAgent,
        ]
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckAgentStatus => "check_agent_status",
            Self::ListAgents => "list_agents",
            Self::GetAgentInfo => "get_agent_info",
            Self::ValidateAttestationPolicy => "validate_attestation_policy",
            Self::GenerateImaPolicy => "generate_ima_policy",
            Self::GetFailedAgents => "get_failed_agents",
            Self::GetAgentPolicies => "get_agent_policies",
            Self::ReactivateAgent => "reactivate_agent",
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownVariantError::new("tool", s, &Self::NAMES))
    }
}

/// Arguments accepted by every tool. Each tool reads the fields it needs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolArgs {
    /// Agent to query or reactivate.
    pub agent_id: Option<String>,
    /// Verifier to ask. Fleet tools query every configured verifier when
    /// absent; single-agent tools use the first.
    pub verifier_url: Option<String>,
    /// Policy text to validate.
    pub policy: Option<String>,
    /// Template name: `basic`, `strict` or `custom`.
    pub policy_type: Option<String>,
    /// Extra allowlist globs for generation.
    pub allowlist: Vec<String>,
    /// Validate with [`Strictness::Strict`].
    pub strict: bool,
}

/// How a tool result reads at a glance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Nothing to act on.
    Pass,
    /// Degraded but not failed.
    Warn,
    /// Invalid policy or failed attestation.
    Fail,
}

impl Verdict {
    /// Upper-case tag used in text output.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
        }
    }

    /// Verdict for a validation report.
    pub fn of_report(report: &ValidationReport) -> Self {
        match report {
            ValidationReport::Valid { .. } => Self::Pass,
            ValidationReport::Warning { .. } => Self::Warn,
            ValidationReport::Invalid { .. } => Self::Fail,
        }
    }

    /// Verdict for a health tier.
    pub fn of_tier(tier: HealthTier) -> Self {
        match tier {
            HealthTier::Green => Self::Pass,
            HealthTier::Yellow => Self::Warn,
            HealthTier::Red => Self::Fail,
        }
    }
}

/// Result of one tool call.
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutput {
    /// Tool that ran.
    pub tool: ToolName,
    /// Summary of `result`.
    pub verdict: Verdict,
    /// The tool's serialized result.
    pub result: Value,
}

impl Serialize for ToolName {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

fn require<'a>(
    tool: ToolName,
    field: &'static str,
    value: &'a Option<String>,
) -> Result<&'a str, ToolError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| missing(tool, field))
}

fn missing(tool: ToolName, field: &'static str) -> ToolError {
    ToolError::InvalidArguments {
        tool: tool.as_str(),
        reason: format!("missing required argument \"{field}\""),
    }
}

fn to_value<T: Serialize>(tool: ToolName, value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::InvalidArguments {
        tool: tool.as_str(),
        reason: format!("result not serializable: {e}"),
    })
}

/// Run the tool `name` with JSON `args`.
pub async fn dispatch(
    service: &AttestService,
    name: &str,
    args: Value,
) -> Result<ToolOutput, ToolError> {
    let tool: ToolName = name.parse()?;
    let args: ToolArgs = match args {
        Value::Null => ToolArgs::default(),
        other => serde_json::from_value(other).map_err(|e| ToolError::InvalidArguments {
            tool: tool.as_str(),
            reason: e.to_string(),
        })?,
    };
    let url = args.verifier_url.as_deref();
    tracing::debug!(%tool, "dispatching tool call");

    let (verdict, result) = match tool {
        ToolName::CheckAgentStatus => {
            let id = require(tool, "agent_id", &args.agent_id)?;
            let record = service.check_agent_status(id, url).await?;
            (Verdict::of_tier(record.health()), to_value(tool, &record)?)
        }
        ToolName::GetAgentInfo => {
            let id = require(tool, "agent_id", &args.agent_id)?;
            let detail = service.get_agent_info(id, url).await?;
            (Verdict::of_tier(detail.health), to_value(tool, &detail)?)
        }
        ToolName::GetAgentPolicies => {
            let id = require(tool, "agent_id", &args.agent_id)?;
            let policies = service.get_agent_policies(id, url).await?;
            (Verdict::Pass, to_value(tool, &policies)?)
        }
        ToolName::ReactivateAgent => {
            let id = require(tool, "agent_id", &args.agent_id)?;
            (Verdict::Pass, service.reactivate_agent(id, url).await?)
        }
        ToolName::ListAgents => {
            let listing = service.list_agents(url).await;
            let verdict = if !listing.failures.is_empty() || listing.summary.red > 0 {
                Verdict::Fail
            } else if listing.summary.yellow > 0 {
                Verdict::Warn
            } else {
                Verdict::Pass
            };
            (verdict, to_value(tool, &listing)?)
        }
        ToolName::GetFailedAgents => {
            let failed = service.get_failed_agents(url).await;
            let verdict = if failed.failed_agents.is_empty() && failed.failures.is_empty() {
                Verdict::Pass
            } else {
                Verdict::Fail
            };
            (verdict, to_value(tool, &failed)?)
        }
        ToolName::ValidateAttestationPolicy => {
            // Any present text is validated, empty included; only an absent
            // argument is a caller error.
            let text = args
                .policy
                .as_deref()
                .ok_or_else(|| missing(tool, "policy"))?;
            let strictness = if args.strict {
                Strictness::Strict
            } else {
                Strictness::Lenient
            };
            let report = service.validate_policy(text, strictness)?;
            (Verdict::of_report(&report), to_value(tool, &report)?)
        }
        ToolName::GenerateImaPolicy => {
            let policy_type = args.policy_type.as_deref().unwrap_or("basic");
            let doc = service.generate_policy(policy_type, &args.allowlist)?;
            (Verdict::Pass, to_value(tool, &doc)?)
        }
    };

    Ok(ToolOutput {
        tool,
        verdict,
        result,
    })
}
