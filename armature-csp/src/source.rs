//! Source expressions
//!
//! Tokens are stored exactly as they appear on the wire, keywords included
//! with their single quotes (`'self'`, not `self`).

use crate::error::{CspError, CspResult};
use base64::{engine::general_purpose::STANDARD, Engine};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;

/// `'none'`: the directive allows nothing
pub const NONE: &str = "'none'";
/// `'self'`: same origin
pub const SELF: &str = "'self'";
/// `'unsafe-inline'`: inline `<script>`, `<style>` and `javascript:` URLs
pub const UNSAFE_INLINE: &str = "'unsafe-inline'";
/// `'unsafe-eval'`: `eval()` and friends
pub const UNSAFE_EVAL: &str = "'unsafe-eval'";
/// `'unsafe-hashes'`: hashed inline event handlers (CSP Level 3)
pub const UNSAFE_HASHES: &str = "'unsafe-hashes'";
/// `'strict-dynamic'`: trust propagates from nonce/hash-marked scripts (CSP Level 3)
pub const STRICT_DYNAMIC: &str = "'strict-dynamic'";

static SCHEME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9]+:$").unwrap());

/// Validate a scheme source such as `https:` or `data:`.
pub fn validate_scheme(scheme: &str) -> CspResult<&str> {
    if SCHEME_PATTERN.is_match(scheme) {
        Ok(scheme)
    } else {
        Err(CspError::invalid_argument(format!(
            "Provided scheme value is not valid scheme: `{}`",
            scheme
        )))
    }
}

/// Build a nonce source: `'nonce-<value>'`.
pub fn nonce_source(nonce: &str) -> String {
    format!("'nonce-{}'", nonce)
}

/// Hash algorithms accepted in hash sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Algorithm prefix used in the source expression
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Raw digest of the given bytes
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            other => Err(CspError::invalid_argument(format!(
                "Unsupported hash algorithm: `{}`",
                other
            ))),
        }
    }
}

/// Build a hash source: `'<algorithm>-<base64 digest>'`.
///
/// The digest covers the exact bytes given, whitespace included, so the
/// text must match the element content byte for byte.
pub fn hash_source(source_code: impl AsRef<[u8]>, algorithm: HashAlgorithm) -> String {
    let digest = algorithm.digest(source_code.as_ref());
    format!("'{}-{}'", algorithm, STANDARD.encode(digest))
}
