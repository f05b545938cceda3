//! Wiremock-backed JWKS endpoint harness.
//!
//! Stands in for the issuer's JWKS endpoint in tests: serve a key set,
//! an error status, a non-JWKS body, or a delayed response, and assert
//! fetch counts via wiremock expectations.

use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// JWKS endpoint path used by the harness.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// A mock issuer JWKS endpoint.
///
/// Mounted expectations (from [`MockJwksServer::serve_keys_expecting`]) are
/// verified when the server is dropped at the end of the test.
pub struct MockJwksServer {
    server: MockServer,
}

impl MockJwksServer {
    /// Start a mock server with no mounted responses.
    ///
    /// An unmounted endpoint answers 404, which verification code must
    /// treat as an unavailable key set.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// URL of the JWKS endpoint.
    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    /// Serve the given JWK documents as the key set.
    pub async fn serve_keys(&self, keys: &[serde_json::Value]) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(Self::key_set(keys)))
            .mount(&self.server)
            .await;
    }

    /// Serve the key set and require exactly `hits` fetches over the
    /// server's lifetime.
    pub async fn serve_keys_expecting(&self, keys: &[serde_json::Value], hits: u64) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(Self::key_set(keys)))
            .expect(hits)
            .mount(&self.server)
            .await;
    }

    /// Respond with the given HTTP status and an empty body.
    pub async fn serve_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Respond 200 with a body that is not a JWKS document.
    pub async fn serve_garbage(&self) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not a key set"))
            .mount(&self.server)
            .await;
    }

    /// Serve the key set after the given delay on every fetch.
    pub async fn serve_delayed(&self, keys: &[serde_json::Value], delay: Duration) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(Self::key_set(keys))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Drop mounted responses so a different shape can be served.
    pub async fn reset(&self) {
        self.server.reset().await;
    }

    fn key_set(keys: &[serde_json::Value]) -> serde_json::Value {
        serde_json::json!({ "keys": keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_jwks_url_points_at_well_known_path() {
        let server = MockJwksServer::start().await;
        assert!(server.jwks_url().ends_with("/.well-known/jwks.json"));
    }

    #[tokio::test]
    async fn test_serve_keys_round_trip() {
        let server = MockJwksServer::start().await;
        server
            .serve_keys(&[serde_json::json!({"kty": "RSA", "kid": "k1"})])
            .await;

        let body: serde_json::Value = reqwest::get(server.jwks_url())
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["keys"][0]["kid"], "k1");
    }

    #[tokio::test]
    async fn test_serve_status() {
        let server = MockJwksServer::start().await;
        server.serve_status(503).await;

        let response = reqwest::get(server.jwks_url()).await.unwrap();
        assert_eq!(response.status(), 503);
    }
}
