//! # Policy Schema
//!
//! The single definition of which top-level keys make a JSON document an
//! attestation policy. [`PolicySection`] is exhaustive: adding a section
//! forces every `match` in the workspace to handle it.

use std::collections::BTreeSet;

use serde_json::{json, Value};

/// A recognized top-level section of a policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PolicySection {
    /// Version and generator metadata.
    Meta,
    /// Path globs expected to be measured.
    Allowlist,
    /// Path globs ignored during measurement.
    Excludelist,
    /// IMA runtime-measurement settings.
    Ima,
    /// Measured-boot reference state.
    MeasuredBoot,
}

impl PolicySection {
    /// All sections in canonical order.
    pub fn all() -> &'static [PolicySection] {
        &[
            Self::Meta,
            Self::Allowlist,
            Self::Excludelist,
            Self::Ima,
            Self::MeasuredBoot,
        ]
    }

    /// The JSON key of this section.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::Allowlist => "allowlist",
            Self::Excludelist => "excludelist",
            Self::Ima => "ima",
            Self::MeasuredBoot => "measured_boot",
        }
    }

    /// Look up a section by its JSON key. Matching is exact.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.key() == key)
    }
}

impl std::fmt::Display for PolicySection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// The five recognized section names.
pub fn recognized_sections() -> BTreeSet<&'static str> {
    PolicySection::all().iter().map(PolicySection::key).collect()
}

/// Whether `key` names a recognized section.
pub fn is_recognized(key: &str) -> bool {
    PolicySection::from_key(key).is_some()
}

/// JSON Schema (draft 2020-12) used by strict validation.
///
/// Only the shape of recognized sections is constrained. Unknown top-level
/// keys stay allowed, matching lenient validation.
pub fn policy_json_schema() -> Value {
    let glob_list = json!({
        "type": "array",
        "items": { "type": "string" }
    });
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Attestation policy document",
        "type": "object",
        "properties": {
            "meta": {
                "type": "object",
                "properties": {
                    "version": { "type": "string" },
                    "generator": { "type": "string" }
                }
            },
            "allowlist": glob_list,
            "excludelist": glob_list,
            "ima": {
                "type": "object",
                "properties": {
                    "ignored_keyrings": { "type": "array", "items": { "type": "string" } },
                    "log_hash_alg": { "type": "string" }
                }
            },
            "measured_boot": { "type": "object" }
        }
    })
}
