//! BIP32 derivation paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{BIP44_PURPOSE, HARDENED};

/// A BIP32 derivation path, serialized as the `address_n` integer array
/// hardware signers expect (hardened elements have bit 31 set).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivationPath(Vec<u32>);

impl DerivationPath {
    pub fn new(elements: Vec<u32>) -> Self {
        Self(elements)
    }

    /// `m/44'/coin'/account'`: the account-level path used for extended
    /// public keys.
    pub fn account(coin_type: u32, account: u32) -> Self {
        Self(vec![
            BIP44_PURPOSE | HARDENED,
            coin_type | HARDENED,
            account | HARDENED,
        ])
    }

    /// `m/44'/coin'/account'/branch/index`: the path of a single address.
    pub fn address(coin_type: u32, account: u32, branch: u32, index: u32) -> Self {
        let mut path = Self::account(coin_type, account);
        path.0.push(branch);
        path.0.push(index);
        path
    }

    pub fn elements(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for element in &self.0 {
            if element & HARDENED != 0 {
                write!(f, "/{}'", element & !HARDENED)?;
            } else {
                write!(f, "/{element}")?;
            }
        }
        Ok(())
    }
}

/// Error returned when a path definition string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid derivation path element {element:?} in {path:?}")]
pub struct PathParseError {
    pub path: String,
    pub element: String,
}

impl FromStr for DerivationPath {
    type Err = PathParseError;

    /// Accepts `"m/44'/1'/0'/0/3"` as well as the bare `"44'/1'/0'/0/3"`.
    /// Both `'` and `h` mark hardened elements.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("m/")
            .or_else(|| trimmed.strip_prefix('m'))
            .unwrap_or(trimmed);
        if body.is_empty() {
            return Ok(Self::default());
        }

        let mut elements = Vec::new();
        for part in body.split('/') {
            let err = || PathParseError {
                path: s.to_string(),
                element: part.to_string(),
            };
            let (digits, hardened) = match part.strip_suffix('\'').or_else(|| part.strip_suffix('h')) {
                Some(d) => (d, true),
                None => (part, false),
            };
            let value: u32 = digits.parse().map_err(|_| err())?;
            if value & HARDENED != 0 {
                return Err(err());
            }
            elements.push(if hardened { value | HARDENED } else { value });
        }
        Ok(Self(elements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_path_layout() {
        let p = DerivationPath::address(1, 0, 1, 7);
        assert_eq!(
            p.elements(),
            &[44 | HARDENED, 1 | HARDENED, HARDENED, 1, 7]
        );
        assert_eq!(p.to_string(), "m/44'/1'/0'/1/7");
    }

    #[test]
    fn account_path_is_fully_hardened() {
        let p = DerivationPath::account(42, 3);
        assert_eq!(p.len(), 3);
        assert!(p.elements().iter().all(|e| e & HARDENED != 0));
    }

    #[test]
    fn parses_definitions() {
        let expected = DerivationPath::address(1, 0, 0, 3);
        assert_eq!("44'/1'/0'/0/3".parse::<DerivationPath>().unwrap(), expected);
        assert_eq!("m/44h/1h/0h/0/3".parse::<DerivationPath>().unwrap(), expected);
        assert!("m".parse::<DerivationPath>().unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_elements() {
        assert!("44'/x/0".parse::<DerivationPath>().is_err());
        assert!("44'//0".parse::<DerivationPath>().is_err());
        assert!("2147483648".parse::<DerivationPath>().is_err());
    }

    #[test]
    fn serializes_as_address_n() {
        let json = serde_json::to_string(&DerivationPath::new(vec![HARDENED | 44, 0])).unwrap();
        assert_eq!(json, "[2147483692,0]");
    }
}
