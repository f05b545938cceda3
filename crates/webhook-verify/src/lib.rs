//! Webhook JWS signature verification.
//!
//! Verifies that an inbound webhook payload was genuinely signed by a
//! trusted issuer, using the detached-payload compact JWS form and public
//! keys discovered from the issuer's JWKS endpoint:
//!
//! - Decode the protected header (algorithm + key ID)
//! - Fetch the key set and select the key by ID
//! - Reconstruct the signed byte string from the header segment and the
//!   caller-supplied payload
//! - Verify the PS256 signature
//!
//! Every failure is terminal: on any [`VerifyError`] the webhook must be
//! rejected, not processed.
//!
//! # Example
//!
//! ```rust,no_run
//! use webhook_verify::{VerifierConfig, VerifyError, WebhookVerifier};
//!
//! # async fn handle(signature_header: &str, body: &[u8]) -> Result<(), VerifyError> {
//! let config = VerifierConfig::new("https://issuer.example.com/webhooks/jwks.json");
//! let verifier = WebhookVerifier::new(&config);
//! verifier.verify(signature_header, body).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - `config` - Verifier configuration from environment
//! - `errors` - Error taxonomy (all terminal)
//! - `header` - Protected-header decoding
//! - `jwks` - Key discovery from the JWKS endpoint
//! - `verifier` - The verification entry point

#![warn(clippy::pedantic)]

/// Module for verifier configuration
pub mod config;

/// Module for the verification error taxonomy
pub mod errors;

/// Module for JWS protected-header decoding
pub mod header;

/// Module for JWKS key discovery
pub mod jwks;

/// Module for the cryptographic signature check
mod signature;

/// Module for the verification entry point
pub mod verifier;

pub use config::{CachePolicy, ConfigError, VerifierConfig};
pub use errors::VerifyError;
pub use header::ProtectedHeader;
pub use jwks::{HttpKeySource, Jwk, JwkSet, KeyResolver, KeySource};
pub use verifier::{WebhookVerifier, MAX_JWS_SIZE_BYTES};
