//! Webhook verification error types.
//!
//! Every variant is terminal: on any error the webhook must be treated as
//! unverified and rejected, without exception. Display messages are
//! intentionally generic to avoid leaking verification internals to a
//! caller that echoes them; actual causes are logged server-side.

use thiserror::Error;

/// Webhook signature verification error.
///
/// Maps one-to-one onto the ways a verification call can fail:
/// - Malformed input: `MalformedSignature`, `MalformedHeader`
/// - Key discovery: `KeySetUnavailable`, `KeyNotFound`
/// - Cryptographic check: `UnsupportedAlgorithm`, `SignatureInvalid`
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The compact JWS does not have the detached three-segment shape.
    #[error("invalid JWS compact serialization")]
    MalformedSignature,

    /// The protected-header segment failed base64url decoding or JSON
    /// parsing, or required fields are missing.
    #[error("invalid JWS protected header")]
    MalformedHeader,

    /// The JWKS fetch failed (network error, non-success status, invalid
    /// document). Not retried internally.
    #[error("key set unavailable: {0}")]
    KeySetUnavailable(String),

    /// No key in the fetched set matches the header's key ID.
    #[error("no key in the key set matches the requested key ID")]
    KeyNotFound,

    /// The header's algorithm identifier is not one the verifier implements.
    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The cryptographic check failed. This variant carries no detail about
    /// the cause (wrong key, tampered data, corrupt signature encoding).
    #[error("signature verification failed")]
    SignatureInvalid,
}

impl VerifyError {
    /// Whether the failure is a retry candidate.
    ///
    /// Only a key-set fetch failure can be transient. Retrying a failed
    /// cryptographic verification is never appropriate, so callers wrapping
    /// verification in a retry layer should gate on this.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, VerifyError::KeySetUnavailable(_))
    }
}
