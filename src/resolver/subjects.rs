//! 科目名称查询
//!
//! 每个不同的科目并发查询一次，结果缓存在 moka 中。

use futures_util::future::join_all;
use moka::future::Cache;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tracing::debug;

use super::lookup::RetryingStore;
use crate::config::CacheConfig;
use crate::models::subjects::entities::Subject;
use crate::resilience::RemoteError;
use crate::storage::collections;

#[derive(Clone)]
pub struct SubjectNameCache {
    // 科目不存在或没有名称时缓存 None，避免反复查询
    inner: Cache<String, Option<String>>,
}

impl SubjectNameCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_capacity, Duration::from_secs(config.subject_ttl))
    }

    pub async fn invalidate_all(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
    }

    async fn lookup(
        &self,
        store: RetryingStore<'_>,
        subject_id: &str,
    ) -> Result<Option<String>, RemoteError> {
        if let Some(name) = self.inner.get(subject_id).await {
            return Ok(name);
        }

        let name = store
            .fetch_one(collections::SUBJECTS, subject_id)
            .await?
            .and_then(|doc| Subject::from(&doc).name);

        self.inner.insert(subject_id.to_string(), name.clone()).await;
        Ok(name)
    }

    /// 并发查询一组科目名称，任意一个失败则整体失败
    pub(crate) async fn resolve_names<'a, I>(
        &self,
        store: RetryingStore<'_>,
        subject_ids: I,
    ) -> Result<HashMap<String, Option<String>>, RemoteError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = subject_ids.into_iter().collect();
        if distinct.is_empty() {
            return Ok(HashMap::new());
        }

        debug!("Resolving {} subject name(s)", distinct.len());

        let lookups = distinct.iter().map(|id| async move {
            self.lookup(store, id).await.map(|name| (id.to_string(), name))
        });

        join_all(lookups).await.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::RetryPolicy;
    use crate::storage::memory_storage::MemoryStorage;
    use crate::storage::{Document, DocumentStore, Filter, StoreResult};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tokio::time::Instant;

    const LOOKUP_DELAY: Duration = Duration::from_millis(200);

    /// 每次单文档读取固定耗时；`broken` 科目读取失败
    struct SlowStore {
        inner: MemoryStorage,
    }

    #[async_trait]
    impl DocumentStore for SlowStore {
        async fn fetch_one(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
            tokio::time::sleep(LOOKUP_DELAY).await;
            if id == "broken" {
                return Err(RemoteError::new("permission-denied", "rules rejected read"));
            }
            self.inner.fetch_one(collection, id).await
        }

        async fn fetch_many(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Document>> {
            self.inner.fetch_many(collection, filters).await
        }

        async fn insert(
            &self,
            collection: &str,
            id: Option<&str>,
            data: Value,
        ) -> StoreResult<Document> {
            self.inner.insert(collection, id, data).await
        }
    }

    fn slow_store() -> SlowStore {
        let inner = MemoryStorage::new();
        for (id, name) in [("math", "Mathematics"), ("physics", "Physics"), ("art", "Art")] {
            inner.put("subjects", id, json!({ "name": name }));
        }
        SlowStore { inner }
    }

    #[tokio::test]
    async fn test_resolve_names_and_cache() {
        let storage = MemoryStorage::new();
        storage.put("subjects", "math", json!({"name": "Mathematics"}));
        storage.put("subjects", "blank", json!({"name": "  "}));

        let policy = RetryPolicy::default();
        let store = RetryingStore {
            store: &storage,
            policy: &policy,
            cancel: None,
        };
        let cache = SubjectNameCache::new(100, Duration::from_secs(60));

        let names = cache
            .resolve_names(store, ["math", "math", "blank", "missing"])
            .await
            .unwrap();
        assert_eq!(names.len(), 3);
        assert_eq!(names["math"].as_deref(), Some("Mathematics"));
        assert_eq!(names["blank"], None);
        assert_eq!(names["missing"], None);

        // 缓存命中后不再读取存储
        storage.put("subjects", "math", json!({"name": "Renamed"}));
        let names = cache.resolve_names(store, ["math"]).await.unwrap();
        assert_eq!(names["math"].as_deref(), Some("Mathematics"));

        cache.invalidate_all().await;
        let names = cache.resolve_names(store, ["math"]).await.unwrap();
        assert_eq!(names["math"].as_deref(), Some("Renamed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookups_run_concurrently() {
        let storage = slow_store();
        let policy = RetryPolicy::new(1, Duration::from_millis(1));
        let store = RetryingStore {
            store: &storage,
            policy: &policy,
            cancel: None,
        };
        let cache = SubjectNameCache::new(100, Duration::from_secs(60));

        let started = Instant::now();
        let names = cache
            .resolve_names(store, ["math", "physics", "art", "missing"])
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(names.len(), 4);
        assert_eq!(names["art"].as_deref(), Some("Art"));
        // 四次读取重叠执行，总耗时约等于一次读取
        assert!(elapsed >= LOOKUP_DELAY);
        assert!(elapsed < LOOKUP_DELAY * 2, "lookups ran serially: {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failed_lookup_fails_all() {
        let storage = slow_store();
        let policy = RetryPolicy::new(1, Duration::from_millis(1));
        let store = RetryingStore {
            store: &storage,
            policy: &policy,
            cancel: None,
        };
        let cache = SubjectNameCache::new(100, Duration::from_secs(60));

        let err = cache
            .resolve_names(store, ["math", "broken", "physics"])
            .await
            .unwrap_err();
        assert_eq!(err.code, "permission-denied");
    }
}
