//! JWS protected-header decoding.
//!
//! The first dot-separated segment of a compact JWS is an unpadded
//! base64url encoding of a JSON object. Verification needs exactly two of
//! its fields: the signing algorithm (`alg`) and the key ID (`kid`).

use crate::errors::VerifyError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

/// Decoded JWS protected header.
///
/// Immutable once decoded; scoped to a single verification call.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtectedHeader {
    /// Signing algorithm identifier (e.g. "PS256").
    pub alg: String,

    /// Key ID selecting the public key in the issuer's key set.
    pub kid: String,
}

/// Decode the protected-header segment of a compact JWS.
///
/// Pure transformation, no side effects beyond debug logging.
///
/// # Errors
///
/// Returns `VerifyError::MalformedHeader` if the segment is not valid
/// unpadded base64url, the decoded bytes are not a JSON object, or `alg` /
/// `kid` are missing, non-string, or empty.
pub fn decode_header(segment: &str) -> Result<ProtectedHeader, VerifyError> {
    let header_bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "wv.header", error = %e, "Failed to decode protected header base64url");
        VerifyError::MalformedHeader
    })?;

    let header: ProtectedHeader = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "wv.header", error = %e, "Failed to parse protected header JSON");
        VerifyError::MalformedHeader
    })?;

    // An empty alg or kid cannot select a verification scheme or key.
    if header.alg.is_empty() || header.kid.is_empty() {
        tracing::debug!(target: "wv.header", "Protected header has empty alg or kid");
        return Err(VerifyError::MalformedHeader);
    }

    Ok(header)
}
