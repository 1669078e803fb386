//! # Attestation Service
//!
//! The call surface the CLI and tool dispatch sit on. Each method is one
//! independent request: nothing is cached and no state is shared between
//! calls beyond the HTTP connection pool.

use attest_core::{AgentId, AgentRecord, HealthTier};
use attest_policy::{
    generate_policy, PolicyDocument, PolicyType, PolicyValidator, Strictness, ValidationReport,
};
use attest_status::{aggregate, AgentDetail, AgentPolicies, FleetSummary};
use attest_verifier_client::{VerifierClient, VerifierConfig, VerifierFailure};
use serde::Serialize;
use serde_json::Value;

use crate::error::ToolError;

/// Merged agent listing across verifiers.
#[derive(Debug, Serialize)]
pub struct AgentListing {
    /// One record per agent, sorted by identifier.
    pub agents: Vec<AgentRecord>,
    /// Tier counts over `agents`.
    pub summary: FleetSummary,
    /// Verifiers that contributed nothing.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<VerifierFailure>,
}

/// Agents in the red tier, with their detail.
#[derive(Debug, Serialize)]
pub struct FailedAgents {
    pub failed_agents: Vec<AgentDetail>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<VerifierFailure>,
}

/// Entry point for every policy and agent operation.
#[derive(Debug, Clone)]
pub struct AttestService {
    client: VerifierClient,
}

impl AttestService {
    /// Build a service over a verifier configuration.
    pub fn new(config: VerifierConfig) -> Result<Self, ToolError> {
        Ok(Self {
            client: VerifierClient::new(config)?,
        })
    }

    /// The underlying verifier client.
    pub fn client(&self) -> &VerifierClient {
        &self.client
    }

    /// The verifiers a fleet call should query: the one named, or every
    /// configured verifier.
    pub fn verifier_urls(&self, verifier_url: Option<&str>) -> Vec<String> {
        match verifier_url {
            Some(url) => vec![url.to_string()],
            None => self.client.config().verifier_urls.clone(),
        }
    }

    fn single_url<'a>(&'a self, verifier_url: Option<&'a str>) -> &'a str {
        verifier_url.unwrap_or_else(|| self.client.config().primary_url())
    }

    /// Validate policy text.
    pub fn validate_policy(
        &self,
        text: &str,
        strictness: Strictness,
    ) -> Result<ValidationReport, ToolError> {
        let validator = PolicyValidator::new(strictness)?;
        Ok(validator.validate(text))
    }

    /// Generate a policy from a type name such as `"basic"`.
    pub fn generate_policy(
        &self,
        policy_type: &str,
        allowlist: &[String],
    ) -> Result<PolicyDocument, ToolError> {
        let policy_type: PolicyType = policy_type.trim().to_ascii_lowercase().parse()?;
        Ok(generate_policy(policy_type, allowlist))
    }

    /// Current status of one agent.
    pub async fn check_agent_status(
        &self,
        agent_id: &str,
        verifier_url: Option<&str>,
    ) -> Result<AgentRecord, ToolError> {
        let url = self.single_url(verifier_url);
        let record = self.client.fetch_agent(url, &AgentId::new(agent_id)).await?;
        tracing::info!(
            agent_id,
            verifier_url = url,
            state = %record.state,
            health = %record.health(),
            "agent status"
        );
        Ok(record)
    }

    /// Detail view of one agent.
    pub async fn get_agent_info(
        &self,
        agent_id: &str,
        verifier_url: Option<&str>,
    ) -> Result<AgentDetail, ToolError> {
        let record = self.check_agent_status(agent_id, verifier_url).await?;
        Ok(AgentDetail::from_record(&record))
    }

    /// Policy view of one agent.
    pub async fn get_agent_policies(
        &self,
        agent_id: &str,
        verifier_url: Option<&str>,
    ) -> Result<AgentPolicies, ToolError> {
        let record = self.check_agent_status(agent_id, verifier_url).await?;
        Ok(AgentPolicies::from_record(&record))
    }

    /// Agents across the selected verifiers, merged. Never fails as a
    /// whole; unreachable verifiers are listed in `failures`.
    pub async fn list_agents(&self, verifier_url: Option<&str>) -> AgentListing {
        let urls = self.verifier_urls(verifier_url);
        let fetch = self.client.fetch_fleet(&urls).await;
        let agents = aggregate(fetch.records);
        AgentListing {
            summary: FleetSummary::from_records(&agents),
            agents,
            failures: fetch.failures,
        }
    }

    /// Agents in the red tier across the selected verifiers.
    pub async fn get_failed_agents(&self, verifier_url: Option<&str>) -> FailedAgents {
        let listing = self.list_agents(verifier_url).await;
        FailedAgents {
            failed_agents: listing
                .agents
                .iter()
                .filter(|r| r.health() == HealthTier::Red)
                .map(AgentDetail::from_record)
                .collect(),
            failures: listing.failures,
        }
    }

    /// Ask the verifier to resume attesting an agent.
    pub async fn reactivate_agent(
        &self,
        agent_id: &str,
        verifier_url: Option<&str>,
    ) -> Result<Value, ToolError> {
        let url = self.single_url(verifier_url);
        let answer = self
            .client
            .reactivate_agent(url, &AgentId::new(agent_id))
            .await?;
        tracing::info!(agent_id, verifier_url = url, "agent reactivated");
        Ok(answer)
    }
}
