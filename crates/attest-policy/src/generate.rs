//! # Policy Generation
//!
//! Builds a [`PolicyDocument`] from a fixed per-type template plus caller
//! allowlist entries. Template defaults always come first and caller
//! entries follow in caller order, so the baseline coverage of a template
//! is established before any customization. `Custom` has no template: its
//! allowlist is exactly the caller's entries and its excludelist is empty.
//!
//! Generation is deterministic and pure.

use std::str::FromStr;

use attest_core::UnknownVariantError;
use serde::{Deserialize, Serialize};

use crate::document::{ImaSettings, PolicyDocument, PolicyMeta};

/// Policy format version written into `meta.version`.
pub const POLICY_VERSION: &str = "1.0";

/// Generator identifier written into `meta.generator`.
pub const GENERATOR_ID: &str = "attest-tools";

const BASIC_ALLOWLIST: [&str; 6] = [
    "/lib/**",
    "/usr/lib/**",
    "/bin/**",
    "/usr/bin/**",
    "/sbin/**",
    "/usr/sbin/**",
];
const BASIC_EXCLUDELIST: [&str; 2] = ["/var/log/**", "/tmp/**"];

const STRICT_ALLOWLIST: [&str; 2] = ["/usr/bin/python3", "/usr/lib/python3/**"];
const STRICT_EXCLUDELIST: [&str; 3] = ["/var/**", "/tmp/**", "/home/**"];
const STRICT_LOG_HASH_ALG: &str = "sha256";

/// Class of policy to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyType {
    /// System library and binary directories; logs and temp excluded.
    Basic,
    /// Narrow interpreter allowlist, broad exclusions, sha256 IMA log.
    Strict,
    /// Caller entries only.
    Custom,
}

impl PolicyType {
    /// Accepted spellings, in declaration order.
    pub const NAMES: [&'static str; 3] = ["basic", "strict", "custom"];

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Strict => "strict",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for PolicyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyType {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "strict" => Ok(Self::Strict),
            "custom" => Ok(Self::Custom),
            other => Err(UnknownVariantError::new("policy type", other, &Self::NAMES)),
        }
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Generate a policy of `policy_type` with `extra_allowlist` appended to
/// the template allowlist.
pub fn generate_policy(policy_type: PolicyType, extra_allowlist: &[String]) -> PolicyDocument {
    let meta = Some(PolicyMeta {
        version: POLICY_VERSION.to_string(),
        generator: GENERATOR_ID.to_string(),
    });

    let (mut allowlist, excludelist, ima) = match policy_type {
        PolicyType::Basic => (owned(&BASIC_ALLOWLIST), owned(&BASIC_EXCLUDELIST), None),
        PolicyType::Strict => (
            owned(&STRICT_ALLOWLIST),
            owned(&STRICT_EXCLUDELIST),
            Some(ImaSettings {
                ignored_keyrings: Vec::new(),
                log_hash_alg: STRICT_LOG_HASH_ALG.to_string(),
            }),
        ),
        PolicyType::Custom => (Vec::new(), Vec::new(), None),
    };
    allowlist.extend(extra_allowlist.iter().cloned());

    tracing::debug!(
        policy_type = %policy_type,
        allowlist_len = allowlist.len(),
        "generated policy"
    );

    PolicyDocument {
        meta,
        allowlist: Some(allowlist),
        excludelist: Some(excludelist),
        ima,
        measured_boot: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn basic_without_extras_is_exactly_the_six_defaults() {
        let doc = generate_policy(PolicyType::Basic, &[]);
        assert_eq!(
            doc.allowlist.unwrap(),
            vec!["/lib/**", "/usr/lib/**", "/bin/**", "/usr/bin/**", "/sbin/**", "/usr/sbin/**"]
        );
        assert_eq!(doc.excludelist.unwrap(), vec!["/var/log/**", "/tmp/**"]);
        assert!(doc.ima.is_none());
    }

    #[test]
    fn caller_entries_follow_defaults_in_order() {
        let extra = vec!["/opt/b/**".to_string(), "/opt/a/**".to_string()];
        let doc = generate_policy(PolicyType::Strict, &extra);
        assert_eq!(
            doc.allowlist.unwrap(),
            vec!["/usr/bin/python3", "/usr/lib/python3/**", "/opt/b/**", "/opt/a/**"]
        );
        assert_eq!(doc.excludelist.unwrap(), vec!["/var/**", "/tmp/**", "/home/**"]);
        let ima = doc.ima.unwrap();
        assert!(ima.ignored_keyrings.is_empty());
        assert_eq!(ima.log_hash_alg, "sha256");
    }

    #[test]
    fn custom_uses_only_caller_entries() {
        let doc = generate_policy(PolicyType::Custom, &["/opt/app/**".to_string()]);
        assert_eq!(doc.allowlist.unwrap(), vec!["/opt/app/**"]);
        assert_eq!(doc.excludelist.unwrap(), Vec::<String>::new());
        assert!(doc.ima.is_none());
    }

    #[test]
    fn duplicates_are_kept() {
        let doc = generate_policy(PolicyType::Basic, &["/bin/**".to_string()]);
        let allow = doc.allowlist.unwrap();
        assert_eq!(allow.len(), 7);
        assert_eq!(allow.iter().filter(|e| *e == "/bin/**").count(), 2);
    }

    #[test]
    fn meta_is_always_set() {
        for ty in [PolicyType::Basic, PolicyType::Strict, PolicyType::Custom] {
            let meta = generate_policy(ty, &[]).meta.unwrap();
            assert_eq!(meta.version, "1.0");
            assert_eq!(meta.generator, GENERATOR_ID);
        }
    }

    #[test]
    fn parses_known_names_and_rejects_others() {
        assert_eq!("basic".parse::<PolicyType>().unwrap(), PolicyType::Basic);
        assert_eq!("strict".parse::<PolicyType>().unwrap(), PolicyType::Strict);
        assert_eq!("custom".parse::<PolicyType>().unwrap(), PolicyType::Custom);

        let err = "Basic".parse::<PolicyType>().unwrap_err();
        assert_eq!(err.kind, "policy type");
        assert_eq!(err.value, "Basic");
        assert_eq!(err.expected, vec!["basic", "strict", "custom"]);
    }

    #[test]
    fn generated_policies_validate() {
        for ty in [PolicyType::Basic, PolicyType::Strict, PolicyType::Custom] {
            let text = generate_policy(ty, &["/srv/**".to_string()])
                .to_pretty_json()
                .unwrap();
            assert!(crate::validate_policy(&text).is_valid(), "{ty}");
        }
    }

    proptest! {
        #[test]
        fn generation_is_deterministic(
            ty in prop_oneof![Just(PolicyType::Basic), Just(PolicyType::Strict), Just(PolicyType::Custom)],
            extra in proptest::collection::vec("/[a-z]{1,8}/\\*\\*", 0..6),
        ) {
            let a = generate_policy(ty, &extra);
            let b = generate_policy(ty, &extra);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(
                serde_json::to_value(&a).unwrap(),
                serde_json::to_value(&b).unwrap()
            );
        }

        #[test]
        fn caller_entries_are_a_suffix(
            ty in prop_oneof![Just(PolicyType::Basic), Just(PolicyType::Strict), Just(PolicyType::Custom)],
            extra in proptest::collection::vec("[ -~]{0,12}", 0..6),
        ) {
            let allow = generate_policy(ty, &extra).allowlist.unwrap();
            prop_assert!(allow.ends_with(&extra));
        }
    }
}
