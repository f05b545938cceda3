//! Cryptographic verification of the detached JWS signature.
//!
//! # Security
//!
//! - Only PS256 (RSA-PSS with SHA-256) is accepted.
//! - Every cryptographic failure cause collapses into the single opaque
//!   `SignatureInvalid` variant so callers cannot distinguish wrong-key from
//!   tampered-payload. Actual causes are logged at debug level only.

use crate::errors::VerifyError;
use crate::jwks::Jwk;
use jsonwebtoken::{crypto, Algorithm, DecodingKey};

/// Map a JWS `alg` identifier to a supported signature scheme.
///
/// # Errors
///
/// Returns `VerifyError::UnsupportedAlgorithm` carrying the offending
/// identifier for anything other than "PS256".
pub(crate) fn supported_algorithm(alg: &str) -> Result<Algorithm, VerifyError> {
    match alg {
        "PS256" => Ok(Algorithm::PS256),
        other => {
            tracing::warn!(target: "wv.verify", alg = %other, "Unsupported signature algorithm");
            Err(VerifyError::UnsupportedAlgorithm(other.to_string()))
        }
    }
}

/// Build a verification key from an RSA JWK.
fn decoding_key(jwk: &Jwk, header_alg: &str) -> Result<DecodingKey, VerifyError> {
    if jwk.kty != "RSA" {
        tracing::warn!(target: "wv.verify", kty = %jwk.kty, "Unexpected JWK key type");
        return Err(VerifyError::SignatureInvalid);
    }

    if let Some(alg) = &jwk.alg {
        if alg != header_alg {
            tracing::warn!(
                target: "wv.verify",
                jwk_alg = %alg,
                header_alg = %header_alg,
                "JWK algorithm does not match protected header"
            );
            return Err(VerifyError::SignatureInvalid);
        }
    }

    let (Some(n), Some(e)) = (&jwk.n, &jwk.e) else {
        tracing::error!(target: "wv.verify", kid = %jwk.kid, "RSA JWK missing modulus or exponent");
        return Err(VerifyError::SignatureInvalid);
    };

    DecodingKey::from_rsa_components(n, e).map_err(|err| {
        tracing::error!(target: "wv.verify", error = %err, "Invalid RSA key components");
        VerifyError::SignatureInvalid
    })
}

/// Verify a detached-payload signature over the reconstructed signing input.
///
/// `signing_input` must be the bit-exact RFC 7515 value the issuer signed;
/// `signature_segment` is the third compact segment, still base64url.
///
/// # Errors
///
/// Returns `VerifyError::UnsupportedAlgorithm` for an unrecognized `alg`
/// and `VerifyError::SignatureInvalid` for every cryptographic failure
/// (wrong key, tampered data, corrupt signature encoding, unusable key
/// material).
pub(crate) fn verify_detached(
    signing_input: &[u8],
    signature_segment: &str,
    jwk: &Jwk,
    header_alg: &str,
) -> Result<(), VerifyError> {
    let algorithm = supported_algorithm(header_alg)?;
    let key = decoding_key(jwk, header_alg)?;

    let verified =
        crypto::verify(signature_segment, signing_input, &key, algorithm).map_err(|err| {
            tracing::debug!(target: "wv.verify", error = %err, "Signature verification errored");
            VerifyError::SignatureInvalid
        })?;

    if !verified {
        tracing::debug!(target: "wv.verify", "Signature does not match signing input");
        return Err(VerifyError::SignatureInvalid);
    }

    Ok(())
}
