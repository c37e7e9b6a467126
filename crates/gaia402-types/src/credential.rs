//! The private signing credential.

use std::fmt;
use std::str::FromStr;

/// An opaque private signing key, supplied by the application at client
/// construction time.
///
/// The key is held in memory for the lifetime of the client and handed to
/// scheme implementations via [`PrivateKey::expose`]. It is never serialized,
/// and its `Debug` output is redacted.
#[derive(Clone)]
pub struct PrivateKey(String);

impl PrivateKey {
    /// Grants access to the raw secret. Scheme implementations call this once
    /// when constructing their signer; do not log the returned value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl FromStr for PrivateKey {
    type Err = InvalidPrivateKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidPrivateKey);
        }
        Ok(PrivateKey(trimmed.to_string()))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// The credential string was empty.
#[derive(Debug, thiserror::Error)]
#[error("Private key must be a non-empty string")]
pub struct InvalidPrivateKey;
