//! Principal identity model.
//!
//! # Responsibility
//! - Define the opaque identity used as key for registry, ledger and
//!   executive state.
//! - Parse and render the canonical `ADDRESS[.contract-name]` form.
//!
//! # Invariants
//! - A `Principal` is immutable once constructed.
//! - Equality is structural over address and optional contract name.
//! - `Display` output always parses back to an equal `Principal`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Maximum accepted contract name length.
pub const MAX_CONTRACT_NAME_CHARS: usize = 40;

static ADDRESS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Z]{1,64}$").expect("address pattern must compile"));
static CONTRACT_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").expect("contract name pattern must compile")
});

/// Globally unique callable identity.
///
/// Standard principals carry only an address; contract principals add a
/// contract name deployed under that address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Principal {
    address: String,
    name: Option<String>,
}

impl Principal {
    /// Creates a standard (address-only) principal.
    pub fn standard(address: &str) -> Result<Self, PrincipalParseError> {
        validate_address(address)?;
        Ok(Self {
            address: address.to_string(),
            name: None,
        })
    }

    /// Creates a contract principal under `address`.
    pub fn contract(address: &str, name: &str) -> Result<Self, PrincipalParseError> {
        validate_address(address)?;
        validate_contract_name(name)?;
        Ok(Self {
            address: address.to_string(),
            name: Some(name.to_string()),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn contract_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_contract(&self) -> bool {
        self.name.is_some()
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}.{}", self.address, name),
            None => write!(f, "{}", self.address),
        }
    }
}

impl FromStr for Principal {
    type Err = PrincipalParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PrincipalParseError::Empty);
        }
        match trimmed.split_once('.') {
            Some((address, name)) => Self::contract(address, name),
            None => Self::standard(trimmed),
        }
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn validate_address(address: &str) -> Result<(), PrincipalParseError> {
    if address.is_empty() {
        return Err(PrincipalParseError::Empty);
    }
    if !ADDRESS_PATTERN.is_match(address) {
        return Err(PrincipalParseError::InvalidAddress(address.to_string()));
    }
    Ok(())
}

fn validate_contract_name(name: &str) -> Result<(), PrincipalParseError> {
    if name.chars().count() > MAX_CONTRACT_NAME_CHARS {
        return Err(PrincipalParseError::ContractNameTooLong(name.to_string()));
    }
    if !CONTRACT_NAME_PATTERN.is_match(name) {
        return Err(PrincipalParseError::InvalidContractName(name.to_string()));
    }
    Ok(())
}

/// Principal parse/validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalParseError {
    Empty,
    InvalidAddress(String),
    InvalidContractName(String),
    ContractNameTooLong(String),
}

impl Display for PrincipalParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "principal must not be empty"),
            Self::InvalidAddress(value) => write!(f, "principal address is invalid: {value}"),
            Self::InvalidContractName(value) => {
                write!(f, "principal contract name is invalid: {value}")
            }
            Self::ContractNameTooLong(value) => write!(
                f,
                "principal contract name exceeds {MAX_CONTRACT_NAME_CHARS} chars: {value}"
            ),
        }
    }
}

impl Error for PrincipalParseError {}

#[cfg(test)]
mod tests {
    use super::{Principal, PrincipalParseError};

    #[test]
    fn parses_standard_and_contract_principals() {
        let standard: Principal = "ST1DEPLOYER".parse().expect("standard parse");
        assert_eq!(standard.address(), "ST1DEPLOYER");
        assert!(!standard.is_contract());

        let contract: Principal = "ST1DEPLOYER.executor-dao".parse().expect("contract parse");
        assert_eq!(contract.address(), "ST1DEPLOYER");
        assert_eq!(contract.contract_name(), Some("executor-dao"));
    }

    #[test]
    fn display_matches_parsed_input() {
        let contract = Principal::contract("ST1DEPLOYER", "edp000-bootstrap").unwrap();
        assert_eq!(contract.to_string(), "ST1DEPLOYER.edp000-bootstrap");
        let reparsed: Principal = contract.to_string().parse().unwrap();
        assert_eq!(reparsed, contract);
    }

    #[test]
    fn rejects_empty_and_malformed_values() {
        assert_eq!(
            "  ".parse::<Principal>().unwrap_err(),
            PrincipalParseError::Empty
        );
        assert!(matches!(
            "st1lower".parse::<Principal>().unwrap_err(),
            PrincipalParseError::InvalidAddress(_)
        ));
        assert!(matches!(
            "ST1DEPLOYER.9starts-with-digit".parse::<Principal>().unwrap_err(),
            PrincipalParseError::InvalidContractName(_)
        ));
        assert!(matches!(
            "ST1DEPLOYER.a.b".parse::<Principal>().unwrap_err(),
            PrincipalParseError::InvalidContractName(_)
        ));
    }

    #[test]
    fn rejects_overlong_contract_name() {
        let name = "a".repeat(41);
        let err = Principal::contract("ST1DEPLOYER", &name).unwrap_err();
        assert!(matches!(err, PrincipalParseError::ContractNameTooLong(_)));
    }

    #[test]
    fn serializes_as_plain_string() {
        let contract = Principal::contract("ST1DEPLOYER", "executor-dao").unwrap();
        let json = serde_json::to_string(&contract).unwrap();
        assert_eq!(json, "\"ST1DEPLOYER.executor-dao\"");
        let decoded: Principal = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, contract);
    }
}
