//! # Command Line
//!
//! Argument definitions and the command runner. `main.rs` only parses,
//! sets up logging, and maps the runner's result to a process exit code.
//!
//! Exit codes: 0 success, 1 validation or attestation failure, 2
//! operational error (bad arguments, unreachable verifier, unreadable
//! file).

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use attest_policy::Strictness;
use attest_verifier_client::VerifierConfig;

use crate::output::{self, render, Format};
use crate::service::AttestService;
use crate::tools::{dispatch, Verdict};

/// Keylime attestation toolkit.
///
/// Validates and generates integrity policies and reports agent
/// attestation status from one or more verifiers.
#[derive(Parser, Debug)]
#[command(name = "attest", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// YAML configuration file. Environment variables apply when absent.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verifier base URL. Repeat to query several verifiers.
    #[arg(long = "verifier", global = true, value_name = "URL")]
    pub verifiers: Vec<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a policy document (file path, or `-` for stdin).
    ValidatePolicy(ValidateArgs),
    /// Generate a policy from a template.
    GeneratePolicy(GenerateArgs),
    /// Show one agent's attestation status.
    AgentStatus(AgentArgs),
    /// Show one agent's attestation detail.
    AgentInfo(AgentArgs),
    /// Show one agent's policies.
    AgentPolicies(AgentArgs),
    /// List agents across all configured verifiers.
    ListAgents,
    /// List agents whose attestation failed.
    FailedAgents,
    /// Resume attestation of an agent.
    Reactivate(AgentArgs),
    /// Invoke a tool by name with JSON arguments.
    Call(CallArgs),
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Policy file, `-` for stdin.
    #[arg(value_name = "PATH", default_value = "-")]
    pub path: PathBuf,

    /// Also check field types, list overlap and completeness.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Template: basic, strict or custom.
    #[arg(value_name = "TYPE")]
    pub policy_type: String,

    /// Extra allowlist glob. Repeatable.
    #[arg(long = "allow", value_name = "GLOB")]
    pub allow: Vec<String>,
}

#[derive(Args, Debug)]
pub struct AgentArgs {
    /// Agent identifier.
    #[arg(value_name = "ID")]
    pub agent_id: String,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Tool name, e.g. check_agent_status.
    #[arg(value_name = "TOOL")]
    pub tool: String,

    /// JSON object of tool arguments.
    #[arg(long, value_name = "JSON")]
    pub args: Option<String>,
}

/// Resolve configuration: file if given, else environment; `--verifier`
/// flags replace the URL list.
pub fn load_config(cli: &Cli) -> Result<VerifierConfig> {
    let mut config = match &cli.config {
        Some(path) => VerifierConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => VerifierConfig::from_env().context("reading configuration from environment")?,
    };
    if !cli.verifiers.is_empty() {
        config.verifier_urls = cli.verifiers.clone();
    }
    Ok(config)
}

fn read_policy(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading policy from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn code(verdict: Verdict, fail_on_warn: bool) -> u8 {
    match verdict {
        Verdict::Pass => 0,
        Verdict::Warn if !fail_on_warn => 0,
        Verdict::Warn | Verdict::Fail => 1,
    }
}

/// Run a parsed command, writing results to `out`. Returns the exit code
/// for completed commands; errors are operational failures.
pub async fn run(cli: Cli, out: &mut impl Write) -> Result<u8> {
    let config = load_config(&cli)?;
    let service = AttestService::new(config).context("building verifier client")?;
    let format = cli.format;
    // One verifier named on the command line selects it for single-agent
    // calls; otherwise the first configured verifier is used.
    let single = match cli.verifiers.as_slice() {
        [one] => Some(one.as_str()),
        _ => None,
    };

    let exit = match cli.command {
        Commands::ValidatePolicy(args) => {
            let text = read_policy(&args.path)?;
            let strictness = if args.strict {
                Strictness::Strict
            } else {
                Strictness::Lenient
            };
            let report = service.validate_policy(&text, strictness)?;
            tracing::info!(outcome = report.outcome(), "policy validated");
            out.write_all(render(format, &report, output::report_text)?.as_bytes())?;
            code(Verdict::of_report(&report), args.strict)
        }
        Commands::GeneratePolicy(args) => {
            let doc = service.generate_policy(&args.policy_type, &args.allow)?;
            let rendered = match format {
                Format::Text => format!("{}\n", doc.to_pretty_json()?),
                other => render(other, &doc, |_| String::new())?,
            };
            out.write_all(rendered.as_bytes())?;
            0
        }
        Commands::AgentStatus(args) => {
            let record = service.check_agent_status(&args.agent_id, single).await?;
            out.write_all(render(format, &record, output::record_text)?.as_bytes())?;
            code(Verdict::of_tier(record.health()), false)
        }
        Commands::AgentInfo(args) => {
            let detail = service.get_agent_info(&args.agent_id, single).await?;
            out.write_all(render(format, &detail, output::detail_text)?.as_bytes())?;
            code(Verdict::of_tier(detail.health), false)
        }
        Commands::AgentPolicies(args) => {
            let policies = service.get_agent_policies(&args.agent_id, single).await?;
            out.write_all(render(format, &policies, output::policies_text)?.as_bytes())?;
            0
        }
        Commands::ListAgents => {
            let listing = service.list_agents(None).await;
            out.write_all(render(format, &listing, output::listing_text)?.as_bytes())?;
            u8::from(!listing.failures.is_empty() || listing.summary.red > 0)
        }
        Commands::FailedAgents => {
            let failed = service.get_failed_agents(None).await;
            out.write_all(render(format, &failed, output::failed_text)?.as_bytes())?;
            u8::from(!failed.failed_agents.is_empty() || !failed.failures.is_empty())
        }
        Commands::Reactivate(args) => {
            let answer = service.reactivate_agent(&args.agent_id, single).await?;
            let rendered = render(format, &answer, |_| {
                format!("Agent {} reactivated.\n", args.agent_id)
            })?;
            out.write_all(rendered.as_bytes())?;
            0
        }
        Commands::Call(args) => {
            let json: Value = match &args.args {
                Some(raw) => serde_json::from_str(raw).context("parsing --args as JSON")?,
                None => Value::Null,
            };
            let result = dispatch(&service, &args.tool, json).await?;
            let rendered = match format {
                Format::Yaml => serde_yaml::to_string(&result)?,
                _ => format!("{}\n", serde_json::to_string_pretty(&result)?),
            };
            out.write_all(rendered.as_bytes())?;
            code(result.verdict, false)
        }
    };
    Ok(exit)
}
