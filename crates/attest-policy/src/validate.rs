//! # Policy Validation
//!
//! Turns raw policy text into a [`ValidationReport`] in a single pass.
//!
//! ## Outcomes
//!
//! - Text that is not JSON produces [`ValidationReport::Invalid`] carrying
//!   the parser's message. This is the only way `Invalid` is produced.
//! - JSON with at least one recognized top-level key produces
//!   [`ValidationReport::Valid`] listing exactly those keys.
//! - JSON without any recognized key produces [`ValidationReport::Warning`]
//!   listing every key found and every recognized key as missing.
//!
//! Validation never returns an error and never panics on input: every
//! problem with the document is a report variant.
//!
//! ## Strictness
//!
//! [`Strictness::Lenient`] is the behaviour above. [`Strictness::Strict`]
//! additionally checks recognized sections against the embedded JSON Schema
//! from [`crate::schema::policy_json_schema`] and checks completeness (an
//! allowlist is present and no excludelist entry repeats an allowlist
//! entry). Strict findings downgrade `Valid` to `Warning` with a non-empty
//! `violations` list or a non-empty `missing` list.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::schema::{is_recognized, policy_json_schema, PolicySection};

/// How much beyond key recognition the validator checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Recognized-key check only.
    #[default]
    Lenient,
    /// Recognized-key check, per-section type checks, and completeness.
    Strict,
}

/// A single strict-mode finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyViolation {
    /// JSON Pointer to the offending value (empty for the root).
    pub instance_path: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Result of one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ValidationReport {
    /// The document has recognizable policy structure.
    Valid {
        /// Recognized keys present in the document.
        detected: Vec<String>,
    },
    /// The document parsed but is missing expected structure.
    Warning {
        /// Keys found in the document.
        detected: Vec<String>,
        /// Expected sections that are absent.
        missing: Vec<String>,
        /// Strict-mode findings. Always empty in lenient mode.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        violations: Vec<PolicyViolation>,
    },
    /// The text could not be parsed.
    Invalid {
        /// The parser's error message.
        error: String,
    },
}

impl ValidationReport {
    /// `true` only for [`ValidationReport::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Keys reported as detected (empty for `Invalid`).
    pub fn detected(&self) -> &[String] {
        match self {
            Self::Valid { detected } | Self::Warning { detected, .. } => detected,
            Self::Invalid { .. } => &[],
        }
    }

    /// Lowercase outcome name.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Valid { .. } => "valid",
            Self::Warning { .. } => "warning",
            Self::Invalid { .. } => "invalid",
        }
    }
}

/// The embedded policy schema failed to compile.
#[derive(Error, Debug)]
#[error("policy schema failed to compile: {reason}")]
pub struct PolicySchemaError {
    /// Compiler message.
    pub reason: String,
}

/// Validates candidate policy documents.
///
/// `PolicyValidator` is `Send + Sync`; one instance can serve concurrent
/// callers. The strict schema is compiled once at construction.
pub struct PolicyValidator {
    strictness: Strictness,
    schema: Option<jsonschema::Validator>,
}

impl std::fmt::Debug for PolicyValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyValidator")
            .field("strictness", &self.strictness)
            .field("schema_compiled", &self.schema.is_some())
            .finish()
    }
}

impl Default for PolicyValidator {
    fn default() -> Self {
        Self::lenient()
    }
}

impl PolicyValidator {
    /// A validator with lenient checks only. Never fails.
    pub fn lenient() -> Self {
        Self {
            strictness: Strictness::Lenient,
            schema: None,
        }
    }

    /// A validator with the requested strictness.
    ///
    /// # Errors
    ///
    /// Returns [`PolicySchemaError`] if the embedded schema does not
    /// compile (strict mode only).
    pub fn new(strictness: Strictness) -> Result<Self, PolicySchemaError> {
        let schema = match strictness {
            Strictness::Lenient => None,
            Strictness::Strict => Some(
                jsonschema::options()
                    .with_draft(jsonschema::Draft::Draft202012)
                    .build(&policy_json_schema())
                    .map_err(|e| PolicySchemaError {
                        reason: e.to_string(),
                    })?,
            ),
        };
        Ok(Self { strictness, schema })
    }

    /// The configured strictness.
    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// Validate raw policy text.
    pub fn validate(&self, raw_text: &str) -> ValidationReport {
        let document: Value = match serde_json::from_str(raw_text) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "policy text did not parse");
                return ValidationReport::Invalid {
                    error: e.to_string(),
                };
            }
        };

        // Non-object JSON (arrays, scalars) has no keys.
        let mut keys: Vec<String> = document
            .as_object()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();

        let detected: Vec<String> = keys.iter().filter(|k| is_recognized(k)).cloned().collect();

        if detected.is_empty() {
            tracing::debug!(key_count = keys.len(), "policy has no recognized sections");
            return ValidationReport::Warning {
                detected: keys,
                missing: PolicySection::all()
                    .iter()
                    .map(|s| s.key().to_string())
                    .collect(),
                violations: Vec::new(),
            };
        }

        let Some(schema) = &self.schema else {
            return ValidationReport::Valid { detected };
        };

        let mut violations: Vec<PolicyViolation> = schema
            .iter_errors(&document)
            .map(|err| PolicyViolation {
                instance_path: err.instance_path.to_string(),
                message: err.to_string(),
            })
            .collect();
        violations.extend(overlap_violations(&document));

        let missing: Vec<String> = if document.get(PolicySection::Allowlist.key()).is_some() {
            Vec::new()
        } else {
            vec![PolicySection::Allowlist.key().to_string()]
        };

        if violations.is_empty() && missing.is_empty() {
            ValidationReport::Valid { detected }
        } else {
            tracing::debug!(
                violations = violations.len(),
                missing = missing.len(),
                "strict policy checks found problems"
            );
            ValidationReport::Warning {
                detected,
                missing,
                violations,
            }
        }
    }
}

/// Validate with lenient checks.
pub fn validate_policy(raw_text: &str) -> ValidationReport {
    PolicyValidator::lenient().validate(raw_text)
}

fn string_entries<'a>(document: &'a Value, section: PolicySection) -> Vec<&'a str> {
    document
        .get(section.key())
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn overlap_violations(document: &Value) -> Vec<PolicyViolation> {
    let allow = string_entries(document, PolicySection::Allowlist);
    string_entries(document, PolicySection::Excludelist)
        .into_iter()
        .enumerate()
        .filter(|(_, entry)| allow.contains(entry))
        .map(|(i, entry)| PolicyViolation {
            instance_path: format!("/excludelist/{i}"),
            message: format!("\"{entry}\" is also in the allowlist"),
        })
        .collect()
}
