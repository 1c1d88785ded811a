//! Type-safe Solana account address.
//!
//! [`AccountAddress`] is a validated newtype around the base-58 string form
//! of an account key, so that watched addresses cannot be confused with
//! signatures or arbitrary text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WatchError;

/// Shortest accepted base-58 account string.
pub const MIN_ADDRESS_LEN: usize = 32;

/// Longest accepted base-58 account string.
pub const MAX_ADDRESS_LEN: usize = 44;

/// Account identifier used as the natural key of a watch.
///
/// Only the textual shape is validated (length and base-58 alphabet); the
/// address is otherwise opaque. Used as the dictionary key in
/// [`super::WatchRegistry`] and as the `mentions` filter of a feed
/// subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountAddress(String);

impl AccountAddress {
    /// Validates and wraps an address string.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::InvalidAddress`] if the string is not 32–44
    /// characters of the base-58 alphabet.
    pub fn parse(raw: &str) -> Result<Self, WatchError> {
        let len = raw.len();
        if !(MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&len) {
            return Err(WatchError::InvalidAddress(format!(
                "{raw}: expected {MIN_ADDRESS_LEN}-{MAX_ADDRESS_LEN} characters, got {len}"
            )));
        }
        bs58::decode(raw)
            .into_vec()
            .map_err(|e| WatchError::InvalidAddress(format!("{raw}: {e}")))?;
        Ok(Self(raw.to_string()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountAddress {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountAddress {
    type Error = WatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccountAddress> for String {
    fn from(address: AccountAddress) -> Self {
        address.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const VALID: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    #[test]
    fn parses_real_account_key() {
        let Ok(addr) = AccountAddress::parse(VALID) else {
            panic!("valid address rejected");
        };
        assert_eq!(addr.as_str(), VALID);
        assert_eq!(addr.to_string(), VALID);
    }

    #[test]
    fn rejects_short_and_long() {
        assert!(AccountAddress::parse("abc").is_err());
        let long = "1".repeat(MAX_ADDRESS_LEN + 1);
        assert!(AccountAddress::parse(&long).is_err());
    }

    #[test]
    fn rejects_non_base58_characters() {
        // '0', 'O', 'I' and 'l' are outside the alphabet.
        let bad = "0OIl".repeat(10);
        assert!(AccountAddress::parse(&bad).is_err());
    }

    #[test]
    fn serde_validates_on_deserialize() {
        let ok: Result<AccountAddress, _> = serde_json::from_str(&format!("\"{VALID}\""));
        assert!(ok.is_ok());
        let bad: Result<AccountAddress, _> = serde_json::from_str("\"short\"");
        assert!(bad.is_err());
    }

    #[test]
    fn orders_lexically() {
        let Ok(a) = AccountAddress::parse(&"A".repeat(40)) else {
            panic!("valid address rejected");
        };
        let Ok(b) = AccountAddress::parse(&"B".repeat(40)) else {
            panic!("valid address rejected");
        };
        assert!(a < b);
    }
}
