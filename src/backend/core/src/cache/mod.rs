//! Short-lived GraphQL response cache.
//!
//! Successful query responses are kept in memory for a few seconds, keyed by
//! the principal, its effective grants and the full request (document,
//! operation name, variables). Any successful mutation flushes everything.
//!
//! # Usage
//!
//! ```rust,ignore
//! let cache = ResponseCache::new(ResponseCacheConfig::default());
//! let key = cache::cache_key(Some(1), &authz, &request);
//!
//! if let Some(body) = cache.get(&key) {
//!     return body;
//! }
//! let body = execute(request).await;
//! cache.insert(key, body.clone());
//! ```

use async_graphql::parser::{parse_query, types::OperationType};
use dashmap::DashMap;
use metrics::counter;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::rbac::AuthorizationContext;

// ═══════════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════════

/// `[cache]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResponseCacheConfig {
    pub enabled: bool,
    /// Entry lifetime in milliseconds
    pub ttl_ms: u64,
    pub max_entries: usize,
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_ms: 2000,
            max_entries: 1024,
        }
    }
}

impl ResponseCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Operation Classification
// ═══════════════════════════════════════════════════════════════════════════════

/// What a GraphQL document would do if executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
    /// Unparseable, or the operation name does not select anything
    Unknown,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
            Self::Unknown => "unknown",
        }
    }

    /// Classify the operation selected by `operation_name`.
    pub fn classify(query: &str, operation_name: Option<&str>) -> Self {
        let Ok(doc) = parse_query(query) else {
            return Self::Unknown;
        };

        let ty = match operation_name {
            Some(name) => doc
                .operations
                .iter()
                .find(|(op_name, _)| op_name.map(|n| n.as_str() == name).unwrap_or(false))
                .map(|(_, op)| op.node.ty),
            None => {
                let mut ops = doc.operations.iter();
                match (ops.next(), ops.next()) {
                    (Some((_, op)), None) => Some(op.node.ty),
                    _ => None,
                }
            }
        };

        match ty {
            Some(OperationType::Query) => Self::Query,
            Some(OperationType::Mutation) => Self::Mutation,
            Some(OperationType::Subscription) => Self::Subscription,
            None => Self::Unknown,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Keys
// ═══════════════════════════════════════════════════════════════════════════════

/// SHA-256 over everything that can change a query's result for a caller.
pub fn cache_key(
    user_id: Option<i32>,
    authz: &AuthorizationContext,
    request: &async_graphql::Request,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.map(|id| id.to_string()).unwrap_or_default().as_bytes());
    hasher.update([0u8]);
    hasher.update(authz.fingerprint().as_bytes());
    hasher.update([0u8]);
    hasher.update(request.query.as_bytes());
    hasher.update([0u8]);
    hasher.update(request.operation_name.as_deref().unwrap_or("").as_bytes());
    hasher.update([0u8]);
    hasher.update(
        serde_json::to_string(&request.variables)
            .unwrap_or_default()
            .as_bytes(),
    );
    hex::encode(hasher.finalize())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Cache
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
struct CachedResponse {
    body: Arc<str>,
    expires_at: Instant,
}

/// In-process response cache. Cheap to clone; clones share storage.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    entries: Arc<DashMap<String, CachedResponse>>,
    config: ResponseCacheConfig,
}

impl ResponseCache {
    pub fn new(config: ResponseCacheConfig) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled && self.config.ttl_ms > 0
    }

    /// Serialized response for `key`, if present and fresh.
    pub fn get(&self, key: &str) -> Option<Arc<str>> {
        if !self.is_enabled() {
            return None;
        }

        let now = Instant::now();
        let hit = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.body.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        };

        match hit {
            Some(body) => {
                counter!("kinetic_response_cache_hits_total").increment(1);
                Some(body)
            }
            None => {
                counter!("kinetic_response_cache_misses_total").increment(1);
                None
            }
        }
    }

    /// Store a serialized response. Skipped when the cache is full of live entries.
    pub fn insert(&self, key: String, body: Arc<str>) {
        if !self.is_enabled() {
            return;
        }

        if self.entries.len() >= self.config.max_entries {
            self.evict_expired();
            if self.entries.len() >= self.config.max_entries {
                debug!(entries = self.entries.len(), "Response cache full, not caching");
                return;
            }
        }

        self.entries.insert(
            key,
            CachedResponse {
                body,
                expires_at: Instant::now() + self.config.ttl(),
            },
        );
    }

    /// Drop every entry (after a mutation).
    pub fn flush(&self) {
        let count = self.entries.len();
        self.entries.clear();
        if count > 0 {
            debug!(count, "Flushed response cache");
        }
    }

    pub fn evict_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::{PermissionAction, PermissionGrant};

    fn cache_with(ttl_ms: u64, max_entries: usize) -> ResponseCache {
        ResponseCache::new(ResponseCacheConfig {
            enabled: true,
            ttl_ms,
            max_entries,
        })
    }

    #[test]
    fn test_classify() {
        assert_eq!(OperationKind::classify("{ users { id } }", None), OperationKind::Query);
        assert_eq!(
            OperationKind::classify("mutation { deleteUser(id: 1) }", None),
            OperationKind::Mutation
        );
        assert_eq!(OperationKind::classify("{ users ", None), OperationKind::Unknown);
    }

    #[test]
    fn test_classify_by_operation_name() {
        let doc = "query A { users { id } } mutation B { deleteUser(id: 1) }";
        assert_eq!(OperationKind::classify(doc, Some("A")), OperationKind::Query);
        assert_eq!(OperationKind::classify(doc, Some("B")), OperationKind::Mutation);
        assert_eq!(OperationKind::classify(doc, Some("C")), OperationKind::Unknown);
        assert_eq!(OperationKind::classify(doc, None), OperationKind::Unknown);
    }

    #[test]
    fn test_hit_and_miss() {
        let cache = cache_with(60_000, 16);
        assert!(cache.get("k").is_none());

        cache.insert("k".to_string(), Arc::from("{\"data\":{}}"));
        assert_eq!(cache.get("k").as_deref(), Some("{\"data\":{}}"));
    }

    #[test]
    fn test_entries_expire() {
        let cache = cache_with(10, 16);
        cache.insert("k".to_string(), Arc::from("body"));
        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_flush() {
        let cache = cache_with(60_000, 16);
        cache.insert("a".to_string(), Arc::from("1"));
        cache.insert("b".to_string(), Arc::from("2"));
        cache.flush();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_limit() {
        let cache = cache_with(60_000, 2);
        cache.insert("a".to_string(), Arc::from("1"));
        cache.insert("b".to_string(), Arc::from("2"));
        cache.insert("c".to_string(), Arc::from("3"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("c").is_none());
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let cache = ResponseCache::new(ResponseCacheConfig {
            enabled: false,
            ..Default::default()
        });
        cache.insert("a".to_string(), Arc::from("1"));
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_key_depends_on_principal_and_grants() {
        let request = async_graphql::Request::new("{ users { id } }");
        let viewer = AuthorizationContext::build(&[PermissionGrant::new("USER", PermissionAction::View)]);
        let none = AuthorizationContext::empty();

        let a = cache_key(Some(1), &viewer, &request);
        assert_eq!(a, cache_key(Some(1), &viewer, &request));
        assert_ne!(a, cache_key(Some(2), &viewer, &request));
        assert_ne!(a, cache_key(Some(1), &none, &request));

        let other = async_graphql::Request::new("{ users { id email } }");
        assert_ne!(a, cache_key(Some(1), &viewer, &other));
        assert_eq!(a.len(), 64);
    }
}
