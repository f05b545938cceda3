//! Test utilities for webhook-verify.
//!
//! Provides fixed RSA keypairs for signing detached-payload JWS values and
//! a wiremock-backed JWKS endpoint harness, so verification tests are
//! reproducible and never touch a real issuer.

/// Module for deterministic signing fixtures
pub mod crypto_fixtures;

/// Module for the mock JWKS endpoint
pub mod jwks_harness;

pub use crypto_fixtures::TestKeypair;
pub use jwks_harness::{MockJwksServer, JWKS_PATH};
