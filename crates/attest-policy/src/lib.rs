//! # attest-policy -- Policy Schema, Validation & Generation
//!
//! Works on the JSON policy documents that govern runtime (IMA) and
//! measured-boot attestation. Nothing here performs attestation itself.
//!
//! ## Components
//!
//! - [`schema`]: the fixed set of recognized top-level sections and, for
//!   strict validation, an embedded JSON Schema.
//! - [`document`]: the typed [`PolicyDocument`] and its structural and
//!   completeness invariants.
//! - [`validate`]: [`PolicyValidator`], which turns raw text into a
//!   [`ValidationReport`] in one pass and never returns an error.
//! - [`generate`]: [`generate_policy`], deterministic synthesis of a
//!   document from a [`PolicyType`] template plus caller entries.
//!
//! ## Crate Policy
//!
//! - Depends only on `attest-core` internally.
//! - Every function here is pure: no I/O, no shared state.

pub mod document;
pub mod generate;
pub mod schema;
pub mod validate;

pub use document::{ImaSettings, PolicyDocument, PolicyMeta};
pub use generate::{generate_policy, PolicyType};
pub use schema::{is_recognized, recognized_sections, PolicySection};
pub use validate::{
    validate_policy, PolicySchemaError, PolicyValidator, PolicyViolation, Strictness,
    ValidationReport,
};
