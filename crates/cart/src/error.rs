//! Cart error type and the policy deciding which failures reach the caller.

use std::fmt;
use std::str::FromStr;

use arwa_shop_core::QuantityError;
use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The storage backend failed to read or write.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The persisted value is not a valid cart. Only raised under
    /// [`ErrorPolicy::Strict`].
    #[error("Stored cart is malformed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The cart could not be serialized.
    #[error("Failed to encode cart: {0}")]
    Encode(#[source] serde_json::Error),

    /// A quantity below 1 was requested. Only raised under
    /// [`ErrorPolicy::Strict`].
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(#[from] QuantityError),
}

/// How the cart store treats malformed stored data and invalid quantities.
///
/// Removing or updating an ID that is not in the cart is a successful no-op
/// under both policies. Storage backend failures are always returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorPolicy {
    /// Malformed stored data reads as an empty cart and invalid quantities are
    /// ignored. The storefront never shows a broken cart.
    #[default]
    Lenient,
    /// Malformed stored data and invalid quantities are returned as errors.
    Strict,
}

impl ErrorPolicy {
    /// Configuration string for this policy.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("expected `lenient` or `strict`, got `{other}`")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_str() {
        assert_eq!("lenient".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::Lenient);
        assert_eq!(" STRICT ".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::Strict);
        assert!("loose".parse::<ErrorPolicy>().is_err());
    }

    #[test]
    fn test_default_is_lenient() {
        assert_eq!(ErrorPolicy::default(), ErrorPolicy::Lenient);
    }

    #[test]
    fn test_error_display() {
        let err = CartError::InvalidQuantity(QuantityError::NotPositive(0));
        assert_eq!(err.to_string(), "Invalid quantity: quantity must be at least 1, got 0");
    }
}
