use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Applicability level of a fee configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Tenant,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Tenant => write!(f, "tenant"),
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "global" => Ok(Scope::Global),
            "tenant" => Ok(Scope::Tenant),
            other => Err(format!("unknown scope: {other}")),
        }
    }
}

/// Fee structure of a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeType {
    Percentage,
    Fixed,
    Tiered,
}

impl std::fmt::Display for FeeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeType::Percentage => write!(f, "percentage"),
            FeeType::Fixed => write!(f, "fixed"),
            FeeType::Tiered => write!(f, "tiered"),
        }
    }
}

impl FromStr for FeeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "percentage" => Ok(FeeType::Percentage),
            "fixed" => Ok(FeeType::Fixed),
            "tiered" => Ok(FeeType::Tiered),
            other => Err(format!("unknown fee type: {other}")),
        }
    }
}

/// How the rate of a single tier is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierType {
    Percentage,
    Fixed,
}

impl std::fmt::Display for TierType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TierType::Percentage => write!(f, "percentage"),
            TierType::Fixed => write!(f, "fixed"),
        }
    }
}

/// Lifecycle status of a configuration record.
///
/// `Expired` and `Superseded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigStatus {
    Draft,
    Active,
    Expired,
    Superseded,
}

impl std::fmt::Display for ConfigStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigStatus::Draft => write!(f, "draft"),
            ConfigStatus::Active => write!(f, "active"),
            ConfigStatus::Expired => write!(f, "expired"),
            ConfigStatus::Superseded => write!(f, "superseded"),
        }
    }
}

impl FromStr for ConfigStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(ConfigStatus::Draft),
            "active" => Ok(ConfigStatus::Active),
            "expired" => Ok(ConfigStatus::Expired),
            "superseded" => Ok(ConfigStatus::Superseded),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Settlement currency recorded on a configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Inr,
    Usd,
    Eur,
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Currency::Inr => write!(f, "INR"),
            Currency::Usd => write!(f, "USD"),
            Currency::Eur => write!(f, "EUR"),
        }
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INR" => Ok(Currency::Inr),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(format!("unknown currency: {other}")),
        }
    }
}

/// Fee type reported on a calculation; `None` when no configuration applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppliedFeeType {
    None,
    Percentage,
    Fixed,
    Tiered,
}

impl From<FeeType> for AppliedFeeType {
    fn from(t: FeeType) -> Self {
        match t {
            FeeType::Percentage => AppliedFeeType::Percentage,
            FeeType::Fixed => AppliedFeeType::Fixed,
            FeeType::Tiered => AppliedFeeType::Tiered,
        }
    }
}

impl std::fmt::Display for AppliedFeeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppliedFeeType::None => write!(f, "none"),
            AppliedFeeType::Percentage => write!(f, "percentage"),
            AppliedFeeType::Fixed => write!(f, "fixed"),
            AppliedFeeType::Tiered => write!(f, "tiered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&Scope::Tenant).unwrap(), "\"tenant\"");
        assert_eq!(serde_json::to_string(&Currency::Usd).unwrap(), "\"USD\"");
        assert_eq!(
            serde_json::to_string(&ConfigStatus::Superseded).unwrap(),
            "\"superseded\""
        );
        assert_eq!(serde_json::to_string(&AppliedFeeType::None).unwrap(), "\"none\"");
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("GLOBAL".parse::<Scope>().unwrap(), Scope::Global);
        assert_eq!("Tiered".parse::<FeeType>().unwrap(), FeeType::Tiered);
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::Eur);
        assert!("weekly".parse::<ConfigStatus>().is_err());
    }
}
