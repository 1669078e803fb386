//! # Operational States and Health Tiers
//!
//! Defines the [`OperationalState`] enum and the single mapping table from
//! verifier-reported states onto it. The Rust compiler enforces exhaustive
//! `match` on the enum, so a new state forces every consumer (notably
//! [`HealthTier::classify`]) to handle it.
//!
//! ## Verifier state codes
//!
//! | Code | Label | Maps to |
//! |------|-------|---------|
//! | 0 | Registered | `Registered` |
//! | 1 | Start | `Unknown` |
//! | 2 | Saved | `Unknown` |
//! | 3 | Get Quote | `Unknown` |
//! | 4 | Get Quote (retry) | `Unknown` |
//! | 5 | Provide V | `Unknown` |
//! | 6 | Provide V (retry) | `Unknown` |
//! | 7 | Failed | `Failed` |
//! | 8 | Terminated | `Unknown` |
//! | 9 | Invalid Quote | `InvalidQuote` |
//! | 10 | Tenant Quote Failed | `Failed` |
//! | other | Unknown | `Unknown` |

use serde::{Deserialize, Serialize};

/// Operational state of an agent as reported by a verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationalState {
    /// The agent is registered and attesting normally.
    Registered,
    /// Attestation failed.
    Failed,
    /// The verifier rejected the agent's TPM quote.
    InvalidQuote,
    /// Any state not covered above, including states this crate does not
    /// know about yet.
    Unknown,
}

const STATE_LABELS: [&str; 11] = [
    "Registered",
    "Start",
    "Saved",
    "Get Quote",
    "Get Quote (retry)",
    "Provide V",
    "Provide V (retry)",
    "Failed",
    "Terminated",
    "Invalid Quote",
    "Tenant Quote Failed",
];

/// Human label for a numeric verifier state code. Unlisted codes are
/// labelled `"Unknown"`.
pub fn state_label(code: i64) -> &'static str {
    usize::try_from(code)
        .ok()
        .and_then(|i| STATE_LABELS.get(i).copied())
        .unwrap_or("Unknown")
}

impl OperationalState {
    /// Map a numeric verifier state code.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Registered,
            7 | 10 => Self::Failed,
            9 => Self::InvalidQuote,
            _ => Self::Unknown,
        }
    }

    /// Map a textual verifier state.
    ///
    /// Case, spaces, hyphens and underscores are ignored, so `"Invalid Quote"`,
    /// `"InvalidQuote"` and `"invalid_quote"` are the same state.
    pub fn from_label(label: &str) -> Self {
        let normalized: String = label
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "registered" => Self::Registered,
            "failed" | "tenantquotefailed" => Self::Failed,
            "invalidquote" => Self::InvalidQuote,
            _ => Self::Unknown,
        }
    }

    /// All variants, in declaration order.
    pub fn all() -> &'static [OperationalState] {
        &[
            Self::Registered,
            Self::Failed,
            Self::InvalidQuote,
            Self::Unknown,
        ]
    }

    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Failed => "failed",
            Self::InvalidQuote => "invalid_quote",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for OperationalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse health classification used for fleet views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthTier {
    /// Attesting normally.
    Green,
    /// State could not be determined.
    Yellow,
    /// Attestation failed or the quote was rejected.
    Red,
}

impl HealthTier {
    /// Derive the tier for an operational state.
    pub fn classify(state: OperationalState) -> Self {
        match state {
            OperationalState::Registered => Self::Green,
            OperationalState::InvalidQuote | OperationalState::Failed => Self::Red,
            OperationalState::Unknown => Self::Yellow,
        }
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

impl std::fmt::Display for HealthTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn code_table_maps_known_states() {
        assert_eq!(OperationalState::from_code(0), OperationalState::Registered);
        assert_eq!(OperationalState::from_code(7), OperationalState::Failed);
        assert_eq!(OperationalState::from_code(9), OperationalState::InvalidQuote);
        assert_eq!(OperationalState::from_code(10), OperationalState::Failed);
        for code in [1, 2, 3, 4, 5, 6, 8, 11, -1, 999] {
            assert_eq!(OperationalState::from_code(code), OperationalState::Unknown);
        }
    }

    #[test]
    fn labels_follow_code_table() {
        assert_eq!(state_label(0), "Registered");
        assert_eq!(state_label(3), "Get Quote");
        assert_eq!(state_label(9), "Invalid Quote");
        assert_eq!(state_label(10), "Tenant Quote Failed");
        assert_eq!(state_label(11), "Unknown");
        assert_eq!(state_label(-3), "Unknown");
    }

    #[test]
    fn textual_states_are_normalized() {
        assert_eq!(OperationalState::from_label("Registered"), OperationalState::Registered);
        assert_eq!(OperationalState::from_label("REGISTERED"), OperationalState::Registered);
        assert_eq!(OperationalState::from_label("Invalid Quote"), OperationalState::InvalidQuote);
        assert_eq!(OperationalState::from_label("InvalidQuote"), OperationalState::InvalidQuote);
        assert_eq!(OperationalState::from_label("invalid_quote"), OperationalState::InvalidQuote);
        assert_eq!(OperationalState::from_label("failed"), OperationalState::Failed);
        assert_eq!(
            OperationalState::from_label("Tenant Quote Failed"),
            OperationalState::Failed
        );
        assert_eq!(OperationalState::from_label("Get Quote"), OperationalState::Unknown);
        assert_eq!(OperationalState::from_label(""), OperationalState::Unknown);
    }

    #[test]
    fn tiers() {
        assert_eq!(HealthTier::classify(OperationalState::Registered), HealthTier::Green);
        assert_eq!(HealthTier::classify(OperationalState::Failed), HealthTier::Red);
        assert_eq!(HealthTier::classify(OperationalState::InvalidQuote), HealthTier::Red);
        assert_eq!(HealthTier::classify(OperationalState::Unknown), HealthTier::Yellow);
    }

    #[test]
    fn label_of_code_round_trips_through_from_label() {
        for code in 0..=10 {
            assert_eq!(
                OperationalState::from_label(state_label(code)),
                OperationalState::from_code(code),
                "code {code}"
            );
        }
    }

    proptest! {
        #[test]
        fn any_code_maps_without_panicking(code in any::<i64>()) {
            let state = OperationalState::from_code(code);
            prop_assert!(OperationalState::all().contains(&state));
            prop_assert!(!state_label(code).is_empty());
        }

        #[test]
        fn any_label_maps_without_panicking(label in ".*") {
            let state = OperationalState::from_label(&label);
            prop_assert!(OperationalState::all().contains(&state));
        }
    }
}
