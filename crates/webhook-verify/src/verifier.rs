//! Webhook signature verification entry point.
//!
//! Wires header decoding, key discovery, and the cryptographic check into
//! one call per inbound webhook.
//!
//! # Security
//!
//! - Signatures are size-checked BEFORE parsing (DoS prevention)
//! - Strict detached mode: an embedded payload segment is rejected, never
//!   trusted over the caller-supplied body
//! - The signed byte string is reconstructed from the received header
//!   segment and the caller-supplied payload, per RFC 7515
//! - Generic error variants prevent information leakage

use crate::config::{CachePolicy, VerifierConfig};
use crate::errors::VerifyError;
use crate::header;
use crate::jwks::{HttpKeySource, KeyResolver, KeySource};
use crate::signature;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::sync::Arc;
use tracing::instrument;

/// Maximum accepted compact JWS size in bytes (8KB).
///
/// Oversized signature headers are rejected before any decoding or
/// cryptographic work. A detached PS256 signature with a 4096-bit key stays
/// under 1KB, so the limit leaves generous headroom.
pub const MAX_JWS_SIZE_BYTES: usize = 8192;

/// Verifies detached-payload webhook signatures against the issuer's JWKS.
///
/// Each verification call is independent and idempotent: same inputs plus
/// same remote key-set state give the same result. The verifier holds no
/// mutable state beyond the optional key-set cache.
pub struct WebhookVerifier {
    resolver: KeyResolver,
}

impl WebhookVerifier {
    /// Create a verifier that fetches keys over HTTP per the given config.
    #[must_use]
    pub fn new(config: &VerifierConfig) -> Self {
        let source = Arc::new(HttpKeySource::new(
            config.jwks_url.clone(),
            config.fetch_timeout,
        ));
        Self::with_key_source(source, config.cache)
    }

    /// Create a verifier over a custom key source.
    ///
    /// Used to swap the network-backed source for a test double or a
    /// cached/signed variant.
    #[must_use]
    pub fn with_key_source(source: Arc<dyn KeySource>, cache: CachePolicy) -> Self {
        Self {
            resolver: KeyResolver::new(source, cache),
        }
    }

    /// Verify a detached-payload compact JWS over the webhook body.
    ///
    /// `jws_compact` is the signature header value of the form
    /// `<base64url-header>..<base64url-signature>` (empty middle segment);
    /// `payload` is the raw webhook body exactly as received.
    ///
    /// # Errors
    ///
    /// - `MalformedSignature` - not a three-segment compact JWS, oversized,
    ///   or the payload segment is not empty
    /// - `MalformedHeader` - the protected header cannot be decoded or
    ///   lacks `alg`/`kid`
    /// - `KeySetUnavailable` - the JWKS fetch failed
    /// - `KeyNotFound` - no key in the set matches the header's `kid`
    /// - `UnsupportedAlgorithm` - the header's `alg` is not implemented
    /// - `SignatureInvalid` - the cryptographic check failed
    ///
    /// On any error the webhook must be treated as unverified and rejected.
    #[instrument(skip_all)]
    pub async fn verify(&self, jws_compact: &str, payload: &[u8]) -> Result<(), VerifyError> {
        // Size check before any parsing
        if jws_compact.len() > MAX_JWS_SIZE_BYTES {
            tracing::debug!(
                target: "wv.verify",
                size = jws_compact.len(),
                max_size = MAX_JWS_SIZE_BYTES,
                "Signature rejected: size exceeds maximum allowed"
            );
            return Err(VerifyError::MalformedSignature);
        }

        let parts: Vec<&str> = jws_compact.split('.').collect();
        if parts.len() != 3 {
            tracing::debug!(
                target: "wv.verify",
                segments = parts.len(),
                "Signature rejected: not a three-segment compact JWS"
            );
            return Err(VerifyError::MalformedSignature);
        }

        let header_segment = parts.first().ok_or(VerifyError::MalformedSignature)?;
        let payload_segment = parts.get(1).ok_or(VerifyError::MalformedSignature)?;
        let signature_segment = parts.get(2).ok_or(VerifyError::MalformedSignature)?;

        // The payload travels outside the JWS; an embedded one is rejected
        // rather than silently ignored.
        if !payload_segment.is_empty() {
            tracing::debug!(
                target: "wv.verify",
                "Signature rejected: non-empty payload segment in detached JWS"
            );
            return Err(VerifyError::MalformedSignature);
        }

        let protected = header::decode_header(header_segment)?;

        let jwk = self.resolver.resolve(&protected.kid).await?;

        // RFC 7515 signing input: base64url(header) || '.' || base64url(payload)
        let encoded_payload = URL_SAFE_NO_PAD.encode(payload);
        let signing_input = format!("{header_segment}.{encoded_payload}");

        signature::verify_detached(
            signing_input.as_bytes(),
            signature_segment,
            &jwk,
            &protected.alg,
        )?;

        tracing::debug!(
            target: "wv.verify",
            kid = %protected.kid,
            payload_bytes = payload.len(),
            "Webhook signature verified"
        );
        Ok(())
    }
}
