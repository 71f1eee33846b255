//! Marketplace selector.
//!
//! The selector is the runtime value used to pick a concrete variant of a
//! capability at job construction time. It is carried by `JobConfiguration`
//! and threaded into every variant lookup during activation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marketplace a job execution is parameterized with.
///
/// `Invalid` is the zero value: it exists so that an unconfigured selector is
/// representable and rejectable, but no variant is ever bound for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    /// Unconfigured selector; never has bound variants.
    #[default]
    Invalid,
    Amazon,
    Jet,
}

impl Marketplace {
    /// All selectors a variant can meaningfully be bound for.
    pub const BINDABLE: [Marketplace; 2] = [Marketplace::Amazon, Marketplace::Jet];

    /// Whether this selector identifies a real marketplace.
    pub fn is_valid(&self) -> bool {
        !matches!(self, Marketplace::Invalid)
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Marketplace::Invalid => "invalid",
            Marketplace::Amazon => "amazon",
            Marketplace::Jet => "jet",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing an unknown marketplace name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown marketplace: {0}")]
pub struct ParseMarketplaceError(String);

impl FromStr for Marketplace {
    type Err = ParseMarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "invalid" => Ok(Marketplace::Invalid),
            "amazon" => Ok(Marketplace::Amazon),
            "jet" => Ok(Marketplace::Jet),
            other => Err(ParseMarketplaceError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_invalid() {
        assert_eq!(Marketplace::default(), Marketplace::Invalid);
        assert!(!Marketplace::default().is_valid());
    }

    #[test]
    fn test_bindable_selectors_are_valid() {
        for selector in Marketplace::BINDABLE {
            assert!(selector.is_valid());
        }
    }

    #[test]
    fn test_display_and_parse_roundtrip() {
        for selector in [Marketplace::Invalid, Marketplace::Amazon, Marketplace::Jet] {
            let parsed: Marketplace = selector.to_string().parse().unwrap();
            assert_eq!(parsed, selector);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Jet".parse::<Marketplace>().unwrap(), Marketplace::Jet);
        assert_eq!("AMAZON".parse::<Marketplace>().unwrap(), Marketplace::Amazon);
    }

    #[test]
    fn test_parse_unknown_fails() {
        let err = "walmart".parse::<Marketplace>().unwrap_err();
        assert!(err.to_string().contains("walmart"));
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Marketplace::Jet).unwrap();
        assert_eq!(json, "\"jet\"");

        let back: Marketplace = serde_json::from_str("\"amazon\"").unwrap();
        assert_eq!(back, Marketplace::Amazon);
    }
}
