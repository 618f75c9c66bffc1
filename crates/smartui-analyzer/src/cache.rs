//! TTL cache for synthesized insights
//!
//! Entries are keyed by a blake3 fingerprint of the user id and the
//! analysis context. Expired entries are never returned; they are dropped
//! lazily on lookup or by [`AnalysisCache::sweep_at`].

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use smartui_common::{BehaviorInsight, JsonMap};
use std::sync::Arc;
use tracing::debug;

/// Deterministic cache key for (user, context).
///
/// `serde_json::Map` is key-ordered, so the serialized context is canonical.
/// A missing context fingerprints the same as an empty one.
pub fn context_fingerprint(user_id: &str, context: Option<&JsonMap>) -> String {
    let context_json = match context {
        Some(ctx) => serde_json::Value::Object(ctx.clone()).to_string(),
        None => "{}".to_string(),
    };

    let mut hasher = blake3::Hasher::new();
    hasher.update(user_id.as_bytes());
    hasher.update(&[0]);
    hasher.update(context_json.as_bytes());
    format!("analysis:{}", hasher.finalize().to_hex())
}

#[derive(Debug, Clone)]
struct CacheEntry {
    user_id: String,
    insight: Arc<BehaviorInsight>,
    cached_at: DateTime<Utc>,
}

/// In-memory insight cache with a fixed TTL
pub struct AnalysisCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl AnalysisCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `key` at `now`; stale entries are removed
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<Arc<BehaviorInsight>> {
        let fresh = self.entries.get(key).map(|entry| {
            if now - entry.cached_at < self.ttl {
                Some(Arc::clone(&entry.insight))
            } else {
                None
            }
        })?;

        if fresh.is_none() {
            self.entries
                .remove_if(key, |_, entry| now - entry.cached_at >= self.ttl);
            debug!(key, "Cache entry expired");
        }
        fresh
    }

    pub fn insert_at(
        &self,
        key: String,
        user_id: &str,
        insight: Arc<BehaviorInsight>,
        now: DateTime<Utc>,
    ) {
        self.entries.insert(
            key,
            CacheEntry {
                user_id: user_id.to_string(),
                insight,
                cached_at: now,
            },
        );
    }

    /// Drop every expired entry, returning how many were removed
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now - entry.cached_at < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Drop every entry belonging to a user
    pub fn remove_user(&self, user_id: &str) {
        self.entries.retain(|_, entry| entry.user_id != user_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fingerprint_is_order_independent() {
        let mut a = JsonMap::new();
        a.insert("page".into(), json!("checkout"));
        a.insert("device".into(), json!("phone"));
        let mut b = JsonMap::new();
        b.insert("device".into(), json!("phone"));
        b.insert("page".into(), json!("checkout"));

        assert_eq!(
            context_fingerprint("alice", Some(&a)),
            context_fingerprint("alice", Some(&b))
        );
        assert_ne!(
            context_fingerprint("alice", Some(&a)),
            context_fingerprint("bob", Some(&a))
        );
        assert_eq!(
            context_fingerprint("alice", None),
            context_fingerprint("alice", Some(&JsonMap::new()))
        );
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let cache = AnalysisCache::new(Duration::minutes(15));
        let now = Utc::now();
        let insight = Arc::new(BehaviorInsight::new_user("alice", now));
        cache.insert_at("k".into(), "alice", insight, now);

        assert!(cache.get_at("k", now + Duration::minutes(14)).is_some());
        assert!(cache.get_at("k", now + Duration::minutes(15)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_sweep_and_remove_user() {
        let cache = AnalysisCache::new(Duration::minutes(1));
        let now = Utc::now();
        cache.insert_at(
            "old".into(),
            "alice",
            Arc::new(BehaviorInsight::new_user("alice", now)),
            now - Duration::minutes(5),
        );
        cache.insert_at(
            "new".into(),
            "bob",
            Arc::new(BehaviorInsight::new_user("bob", now)),
            now,
        );

        assert_eq!(cache.sweep_at(now), 1);
        assert_eq!(cache.len(), 1);
        cache.remove_user("bob");
        assert!(cache.is_empty());
    }
}
