//! # Policy Documents
//!
//! Typed form of a policy. Generated documents are built as
//! [`PolicyDocument`] values; validation works on raw JSON instead, since a
//! candidate document may not fit this type at all.

use serde::{Deserialize, Serialize};

/// Version and generator identification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyMeta {
    /// Policy format version.
    pub version: String,
    /// Tool that produced the document.
    pub generator: String,
}

/// IMA measurement settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImaSettings {
    /// Kernel keyrings whose measurements are ignored.
    #[serde(default)]
    pub ignored_keyrings: Vec<String>,
    /// Hash algorithm of the IMA log.
    pub log_hash_alg: String,
}

/// An attestation policy document.
///
/// Sections are optional. `allowlist` and `excludelist` keep caller order;
/// duplicates are allowed and order carries no meaning beyond display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Version and generator metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PolicyMeta>,
    /// Path globs expected to be measured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowlist: Option<Vec<String>>,
    /// Path globs excluded from measurement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excludelist: Option<Vec<String>>,
    /// IMA settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ima: Option<ImaSettings>,
    /// Measured-boot reference state, kept opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured_boot: Option<serde_json::Value>,
}

impl PolicyDocument {
    /// At least one recognized section is present.
    pub fn is_structurally_valid(&self) -> bool {
        self.meta.is_some()
            || self.allowlist.is_some()
            || self.excludelist.is_some()
            || self.ima.is_some()
            || self.measured_boot.is_some()
    }

    /// An allowlist is present and no excludelist entry equals an allowlist
    /// entry.
    pub fn is_complete(&self) -> bool {
        self.allowlist.is_some() && self.overlapping_entries().is_empty()
    }

    /// Excludelist entries that also appear verbatim in the allowlist, in
    /// excludelist order.
    pub fn overlapping_entries(&self) -> Vec<&str> {
        let (Some(allow), Some(exclude)) = (&self.allowlist, &self.excludelist) else {
            return Vec::new();
        };
        exclude
            .iter()
            .filter(|e| allow.contains(e))
            .map(String::as_str)
            .collect()
    }

    /// Pretty JSON, the format policies are handed to operators in.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
