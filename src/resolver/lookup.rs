//! 带重试的远程读取与查询形状链
//!
//! 历史数据中同一字段可能以引用对象或字符串 ID 保存，
//! [`LookupChain`] 依次尝试每种查询形状。

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::resilience::{RetryPolicy, with_retry};
use crate::storage::{Document, DocumentStore, Filter, StoreResult};

/// 所有调用都经过 [`with_retry`] 的存储视图
#[derive(Clone, Copy)]
pub(crate) struct RetryingStore<'a> {
    pub store: &'a dyn DocumentStore,
    pub policy: &'a RetryPolicy,
    pub cancel: Option<&'a CancellationToken>,
}

impl<'a> RetryingStore<'a> {
    pub async fn fetch_one(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let store = self.store;
        with_retry(self.policy, self.cancel, || store.fetch_one(collection, id)).await
    }

    pub async fn fetch_many(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Document>> {
        let store = self.store;
        with_retry(self.policy, self.cancel, || store.fetch_many(collection, filters)).await
    }

    /// 以固定 ID 写入
    ///
    /// 某次调用结果未知（非 already-exists 的失败）后，后续调用遇到 already-exists
    /// 时读取已有文档：内容与本次写入一致视为上一次写入已成功，否则是别人的写入。
    pub async fn insert(&self, collection: &str, id: &str, data: &Value) -> StoreResult<Document> {
        let store = self.store;
        let outcome_unknown = AtomicBool::new(false);
        let outcome_unknown = &outcome_unknown;
        with_retry(self.policy, self.cancel, || async move {
            match store.insert(collection, Some(id), data.clone()).await {
                Err(e) if e.is_already_exists() && outcome_unknown.load(Ordering::SeqCst) => {
                    match store.fetch_one(collection, id).await? {
                        Some(existing) if existing.data == *data => {
                            debug!("Insert of {}/{} had already landed", collection, id);
                            Ok(existing)
                        }
                        _ => Err(e),
                    }
                }
                Err(e) => {
                    if !e.is_already_exists() {
                        outcome_unknown.store(true, Ordering::SeqCst);
                    }
                    Err(e)
                }
                ok => ok,
            }
        })
        .await
    }
}

/// 查询形状链
#[derive(Debug, Clone)]
pub struct LookupChain {
    collection: String,
    shapes: Vec<Vec<Filter>>,
}

impl LookupChain {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            shapes: Vec::new(),
        }
    }

    /// 追加一种查询形状（多个条件取交集）
    pub fn shape(mut self, filters: Vec<Filter>) -> Self {
        self.shapes.push(filters);
        self
    }

    /// 同一字段的两种形状：引用对象和字符串 ID
    pub fn reference_or_id(self, field: &str, reference: Value, id: Value, extra: &[Filter]) -> Self {
        let with_extra = |filter: Filter| {
            let mut filters = vec![filter];
            filters.extend_from_slice(extra);
            filters
        };
        self.shape(with_extra(Filter::eq(field, reference)))
            .shape(with_extra(Filter::eq(field, id)))
    }

    /// 依次尝试，返回第一个非空结果
    pub(crate) async fn first_non_empty(&self, store: RetryingStore<'_>) -> StoreResult<Vec<Document>> {
        for (index, filters) in self.shapes.iter().enumerate() {
            let documents = store.fetch_many(&self.collection, filters).await?;
            if !documents.is_empty() {
                debug!(
                    "Lookup in {} matched with shape #{} ({} document(s))",
                    self.collection,
                    index,
                    documents.len()
                );
                return Ok(documents);
            }
        }
        Ok(Vec::new())
    }

    /// 查询所有形状，按文档 ID 去重合并
    pub(crate) async fn union(&self, store: RetryingStore<'_>) -> StoreResult<Vec<Document>> {
        let mut merged = BTreeMap::new();
        for filters in &self.shapes {
            for document in store.fetch_many(&self.collection, filters).await? {
                merged.entry(document.id.clone()).or_insert(document);
            }
        }
        Ok(merged.into_values().collect())
    }
}
