//! Rendering of command results for the terminal.
//!
//! `text` is for people; `json` and `yaml` print the serialized result and
//! are stable for scripts.

use std::fmt::Write as _;

use anyhow::Result;
use attest_core::AgentRecord;
use attest_policy::ValidationReport;
use attest_status::{AgentDetail, AgentPolicies};
use serde::Serialize;

use crate::service::{AgentListing, FailedAgents};
use crate::tools::Verdict;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Human-readable summary lines.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// YAML.
    Yaml,
}

/// Render `value` as JSON or YAML, or with `text` for [`Format::Text`].
pub fn render<T: Serialize>(
    format: Format,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<String> {
    Ok(match format {
        Format::Text => text(value),
        Format::Json => {
            let mut s = serde_json::to_string_pretty(value)?;
            s.push('\n');
            s
        }
        Format::Yaml => serde_yaml::to_string(value)?,
    })
}

/// One-paragraph validation summary.
pub fn report_text(report: &ValidationReport) -> String {
    let tag = Verdict::of_report(report).tag();
    let mut out = String::new();
    match report {
        ValidationReport::Valid { detected } => {
            let _ = writeln!(out, "{tag}: policy is valid");
            let _ = writeln!(out, "  sections: {}", detected.join(", "));
        }
        ValidationReport::Warning {
            detected,
            missing,
            violations,
        } => {
            let _ = writeln!(out, "{tag}: policy has problems");
            if !detected.is_empty() {
                let _ = writeln!(out, "  found:    {}", detected.join(", "));
            }
            if !missing.is_empty() {
                let _ = writeln!(out, "  missing:  {}", missing.join(", "));
            }
            for v in violations {
                let _ = writeln!(out, "  - {v}");
            }
        }
        ValidationReport::Invalid { error } => {
            let _ = writeln!(out, "{tag}: policy is not valid JSON: {error}");
        }
    }
    out
}

fn record_line(out: &mut String, record: &AgentRecord) {
    let _ = writeln!(
        out,
        "{:<4} {}  {} ({})  {}",
        Verdict::of_tier(record.health()).tag(),
        record.agent_id,
        record.state_label,
        record.health(),
        record.verifier_url,
    );
}

/// Single agent status line.
pub fn record_text(record: &AgentRecord) -> String {
    let mut out = String::new();
    record_line(&mut out, record);
    out
}

/// Detail block for one agent.
pub fn detail_text(d: &AgentDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Agent {}", d.agent_id);
    let _ = writeln!(out, "  state:              {} ({})", d.state_label, d.health);
    let _ = writeln!(out, "  attestations:       {}", d.attestation_count);
    if let Some(q) = d.last_received_quote {
        let _ = writeln!(out, "  last quote:         {q}");
    }
    if let Some(a) = d.last_successful_attestation {
        let _ = writeln!(out, "  last success:       {a}");
    }
    if let Some(s) = d.severity_level {
        let _ = writeln!(out, "  severity:           {s}");
    }
    if let Some(e) = &d.last_event_id {
        let _ = writeln!(out, "  last event:         {e}");
    }
    let _ = writeln!(
        out,
        "  algorithms:         hash={} enc={} sign={}",
        d.hash_algorithm, d.encryption_algorithm, d.signing_algorithm
    );
    let _ = writeln!(out, "  verifier:           {} {}", d.verifier_id, d.verifier_address);
    let _ = writeln!(out, "  measured boot:      {}", d.has_measured_boot);
    let _ = writeln!(out, "  runtime policy:     {}", d.has_runtime_policy);
    if let Some(e) = &d.fetch_error {
        let _ = writeln!(out, "  fetch error:        {e}");
    }
    out
}

/// Policy block for one agent.
pub fn policies_text(p: &AgentPolicies) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Agent {}", p.agent_id);
    let _ = writeln!(out, "  tpm_policy:   {}", p.tpm_policy);
    let _ = writeln!(out, "  vtpm_policy:  {}", p.vtpm_policy);
    let _ = writeln!(out, "  meta_data:    {}", p.meta_data);
    let _ = writeln!(out, "  measured boot policy: {}", p.has_measured_boot_policy);
    let _ = writeln!(out, "  runtime policy:       {}", p.has_runtime_policy);
    let _ = writeln!(out, "  hash algs:    {}", p.accepted_tpm_hash_algs.join(", "));
    let _ = writeln!(out, "  enc algs:     {}", p.accepted_tpm_encryption_algs.join(", "));
    let _ = writeln!(out, "  sign algs:    {}", p.accepted_tpm_signing_algs.join(", "));
    out
}

fn failures_text(out: &mut String, failures: &[attest_verifier_client::VerifierFailure]) {
    for f in failures {
        let _ = writeln!(out, "FAIL verifier {}: {}", f.verifier_url, f.error);
    }
}

/// Fleet listing with summary.
pub fn listing_text(listing: &AgentListing) -> String {
    let mut out = String::new();
    for record in &listing.agents {
        record_line(&mut out, record);
    }
    let s = &listing.summary;
    let _ = writeln!(
        out,
        "\nAgents: {} total, {} green, {} yellow, {} red",
        s.total, s.green, s.yellow, s.red
    );
    failures_text(&mut out, &listing.failures);
    out
}

/// Red-tier agents.
pub fn failed_text(failed: &FailedAgents) -> String {
    let mut out = String::new();
    if failed.failed_agents.is_empty() {
        let _ = writeln!(out, "No failed agents.");
    }
    for d in &failed.failed_agents {
        let _ = writeln!(
            out,
            "FAIL {}  {}  {}",
            d.agent_id, d.state_label, d.verifier_url
        );
    }
    failures_text(&mut out, &failed.failures);
    out
}
