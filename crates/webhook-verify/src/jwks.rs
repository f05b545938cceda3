//! Key discovery from the issuer's JWKS endpoint.
//!
//! The resolver fetches the issuer's published key set and selects the key
//! matching a JWS header's key ID.
//!
//! # Security
//!
//! - The resolver trusts whatever key set the configured endpoint currently
//!   serves; the endpoint URL must be HTTPS in production (TLS via rustls).
//! - Every fetch carries a bounded timeout so a stalled endpoint cannot
//!   block the caller indefinitely.
//! - Fetch failures are never retried here; retry policy belongs to the
//!   caller, wrapped around the whole verification call.

use crate::config::CachePolicy;
use crate::errors::VerifyError;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::instrument;

/// JSON Web Key published by the issuer.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type (always "RSA" for PS256 keys).
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// Algorithm (should be "PS256").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,
}

/// JWK set document served by the issuer.
///
/// Keys are kept in document order; duplicate key IDs resolve to the first
/// match.
#[derive(Debug, Clone, Deserialize)]
pub struct JwkSet {
    /// Published keys.
    pub keys: Vec<Jwk>,
}

/// Source of the issuer's current key set.
///
/// A single-operation trait so the network-backed source can be swapped for
/// a test double or a cached/signed variant without touching verification
/// logic.
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Fetch the current key set.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::KeySetUnavailable` if no usable key set could
    /// be produced.
    async fn fetch(&self) -> Result<JwkSet, VerifyError>;
}

/// HTTP-backed key source fetching the JWKS document from the issuer.
pub struct HttpKeySource {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client carrying the fetch timeout.
    http_client: reqwest::Client,
}

impl HttpKeySource {
    /// Create a new HTTP key source.
    ///
    /// # Arguments
    ///
    /// * `jwks_url` - URL to the issuer's JWKS endpoint
    /// * `fetch_timeout` - Bound on each fetch, connection setup included
    #[must_use]
    pub fn new(jwks_url: String, fetch_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "wv.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
        }
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    async fn fetch(&self) -> Result<JwkSet, VerifyError> {
        tracing::debug!(target: "wv.jwks", url = %self.jwks_url, "Fetching JWKS from issuer");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "wv.jwks", error = %e, "Failed to fetch JWKS");
                VerifyError::KeySetUnavailable("key set endpoint unreachable".to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "wv.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(VerifyError::KeySetUnavailable(
                "key set endpoint returned an error status".to_string(),
            ));
        }

        let jwks: JwkSet = response.json().await.map_err(|e| {
            tracing::error!(target: "wv.jwks", error = %e, "Failed to parse JWKS response");
            VerifyError::KeySetUnavailable("key set document is not a valid JWKS".to_string())
        })?;

        tracing::debug!(target: "wv.jwks", key_count = jwks.keys.len(), "Fetched JWKS");
        Ok(jwks)
    }
}

/// Fetched key set with expiry time.
struct CachedKeys {
    keys: JwkSet,
    expires_at: Instant,
}

/// Resolves key IDs against the issuer's key set.
///
/// With `CachePolicy::AlwaysFetch` every resolution performs one fetch and
/// discards the set afterwards. With `CachePolicy::Ttl` the fetched set is
/// kept behind an `RwLock` until expiry; a valid cached set that lacks the
/// requested key ID resolves to `KeyNotFound` without a refetch.
pub struct KeyResolver {
    source: Arc<dyn KeySource>,
    policy: CachePolicy,
    cache: RwLock<Option<CachedKeys>>,
}

impl KeyResolver {
    /// Create a resolver over the given key source.
    #[must_use]
    pub fn new(source: Arc<dyn KeySource>, policy: CachePolicy) -> Self {
        Self {
            source,
            policy,
            cache: RwLock::new(None),
        }
    }

    /// Look up the public key with the given key ID.
    ///
    /// Duplicate key IDs within one fetched set resolve to the first match
    /// in document order.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::KeySetUnavailable` if the key set cannot be
    /// fetched and `VerifyError::KeyNotFound` if no key matches.
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn resolve(&self, kid: &str) -> Result<Jwk, VerifyError> {
        let ttl = match self.policy {
            CachePolicy::AlwaysFetch => {
                let set = self.source.fetch().await?;
                return find_key(&set, kid);
            }
            CachePolicy::Ttl(ttl) => ttl,
        };

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() {
                    if let Ok(key) = find_key(&cached.keys, kid) {
                        tracing::debug!(target: "wv.jwks", kid = %kid, "JWKS cache hit");
                        return Ok(key);
                    }
                    // Key not found in valid cache
                    tracing::debug!(target: "wv.jwks", kid = %kid, "Key not found in JWKS cache");
                    return Err(VerifyError::KeyNotFound);
                }
            }
        }

        // Cache miss or expired - fetch fresh JWKS
        let set = self.source.fetch().await?;
        let result = find_key(&set, kid);

        let mut cache = self.cache.write().await;
        *cache = Some(CachedKeys {
            keys: set,
            expires_at: Instant::now() + ttl,
        });

        result
    }
}

/// Exact string match on key ID; first match wins.
fn find_key(set: &JwkSet, kid: &str) -> Result<Jwk, VerifyError> {
    set.keys
        .iter()
        .find(|key| key.kid == kid)
        .cloned()
        .ok_or_else(|| {
            tracing::warn!(target: "wv.jwks", kid = %kid, "Key not found in JWKS");
            VerifyError::KeyNotFound
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Key source double serving a fixed set and counting fetches.
    struct StaticKeySource {
        set: JwkSet,
        fetches: AtomicUsize,
    }

    impl StaticKeySource {
        fn new(set: JwkSet) -> Self {
            Self {
                set,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl KeySource for StaticKeySource {
        async fn fetch(&self) -> Result<JwkSet, VerifyError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.set.clone())
        }
    }

    /// Key source double that always fails.
    struct FailingKeySource;

    #[async_trait]
    impl KeySource for FailingKeySource {
        async fn fetch(&self) -> Result<JwkSet, VerifyError> {
            Err(VerifyError::KeySetUnavailable(
                "key set endpoint unreachable".to_string(),
            ))
        }
    }

    fn rsa_jwk(kid: &str, n: &str) -> Jwk {
        Jwk {
            kty: "RSA".to_string(),
            kid: kid.to_string(),
            alg: Some("PS256".to_string()),
            key_use: Some("sig".to_string()),
            n: Some(n.to_string()),
            e: Some("AQAB".to_string()),
        }
    }

    // -------------------------------------------------------------------------
    // Deserialization
    // -------------------------------------------------------------------------

    #[test]
    fn test_jwk_deserialization() {
        let json = r#"{
            "kty": "RSA",
            "kid": "wh-key-01",
            "alg": "PS256",
            "use": "sig",
            "n": "xjlCQvcYyrj0yLRzcJKB",
            "e": "AQAB"
        }"#;

        let jwk: Jwk = serde_json::from_str(json).unwrap();

        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.kid, "wh-key-01");
        assert_eq!(jwk.alg, Some("PS256".to_string()));
        assert_eq!(jwk.key_use, Some("sig".to_string()));
        assert_eq!(jwk.n, Some("xjlCQvcYyrj0yLRzcJKB".to_string()));
        assert_eq!(jwk.e, Some("AQAB".to_string()));
    }

    #[test]
    fn test_jwk_deserialization_minimal() {
        // Only required fields
        let json = r#"{
            "kty": "RSA",
            "kid": "wh-key-02"
        }"#;

        let jwk: Jwk = serde_json::from_str(json).unwrap();

        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.kid, "wh-key-02");
        assert!(jwk.alg.is_none());
        assert!(jwk.key_use.is_none());
        assert!(jwk.n.is_none());
        assert!(jwk.e.is_none());
    }

    #[test]
    fn test_jwk_deserialization_ignores_unknown_fields() {
        let json = r#"{
            "kty": "RSA",
            "kid": "wh-key-01",
            "x5c": ["abc"],
            "key_ops": ["verify"]
        }"#;

        let jwk: Jwk = serde_json::from_str(json).unwrap();
        assert_eq!(jwk.kid, "wh-key-01");
    }

    #[test]
    fn test_jwk_set_deserialization() {
        let json = r#"{
            "keys": [
                {"kty": "RSA", "kid": "key-1"},
                {"kty": "RSA", "kid": "key-2"}
            ]
        }"#;

        let set: JwkSet = serde_json::from_str(json).unwrap();

        assert_eq!(set.keys.len(), 2);
        assert_eq!(set.keys.first().unwrap().kid, "key-1");
        assert_eq!(set.keys.get(1).unwrap().kid, "key-2");
    }

    #[test]
    fn test_jwk_set_missing_keys_field_fails() {
        let result: Result<JwkSet, _> = serde_json::from_str(r#"{"kids": []}"#);
        assert!(result.is_err());
    }

    // -------------------------------------------------------------------------
    // Key matching
    // -------------------------------------------------------------------------

    #[test]
    fn test_find_key_exact_match() {
        let set = JwkSet {
            keys: vec![rsa_jwk("key-1", "n1"), rsa_jwk("key-2", "n2")],
        };

        let key = find_key(&set, "key-2").unwrap();
        assert_eq!(key.kid, "key-2");
    }

    #[test]
    fn test_find_key_no_match() {
        let set = JwkSet {
            keys: vec![rsa_jwk("key-1", "n1")],
        };

        let result = find_key(&set, "key-9");
        assert!(matches!(result, Err(VerifyError::KeyNotFound)));
    }

    #[test]
    fn test_find_key_no_partial_match() {
        let set = JwkSet {
            keys: vec![rsa_jwk("key-10", "n1")],
        };

        let result = find_key(&set, "key-1");
        assert!(matches!(result, Err(VerifyError::KeyNotFound)));
    }

    #[test]
    fn test_find_key_duplicate_kid_first_match_wins() {
        let set = JwkSet {
            keys: vec![rsa_jwk("key-1", "first"), rsa_jwk("key-1", "second")],
        };

        let key = find_key(&set, "key-1").unwrap();
        assert_eq!(key.n, Some("first".to_string()));
    }

    // -------------------------------------------------------------------------
    // Resolver cache policies
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_always_fetch_fetches_per_resolution() {
        let source = Arc::new(StaticKeySource::new(JwkSet {
            keys: vec![rsa_jwk("key-1", "n1")],
        }));
        let resolver = KeyResolver::new(source.clone(), CachePolicy::AlwaysFetch);

        resolver.resolve("key-1").await.unwrap();
        resolver.resolve("key-1").await.unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ttl_cache_fetches_once_within_ttl() {
        let source = Arc::new(StaticKeySource::new(JwkSet {
            keys: vec![rsa_jwk("key-1", "n1")],
        }));
        let resolver = KeyResolver::new(
            source.clone(),
            CachePolicy::Ttl(Duration::from_secs(60)),
        );

        resolver.resolve("key-1").await.unwrap();
        resolver.resolve("key-1").await.unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ttl_cache_miss_within_ttl_is_key_not_found_without_refetch() {
        let source = Arc::new(StaticKeySource::new(JwkSet {
            keys: vec![rsa_jwk("key-1", "n1")],
        }));
        let resolver = KeyResolver::new(
            source.clone(),
            CachePolicy::Ttl(Duration::from_secs(60)),
        );

        resolver.resolve("key-1").await.unwrap();
        let result = resolver.resolve("key-9").await;

        assert!(matches!(result, Err(VerifyError::KeyNotFound)));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ttl_cache_expiry_triggers_refetch() {
        let source = Arc::new(StaticKeySource::new(JwkSet {
            keys: vec![rsa_jwk("key-1", "n1")],
        }));
        let resolver = KeyResolver::new(
            source.clone(),
            CachePolicy::Ttl(Duration::from_millis(10)),
        );

        resolver.resolve("key-1").await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        resolver.resolve("key-1").await.unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let resolver = KeyResolver::new(Arc::new(FailingKeySource), CachePolicy::AlwaysFetch);

        let result = resolver.resolve("key-1").await;
        assert!(matches!(result, Err(VerifyError::KeySetUnavailable(_))));
    }
}
