//! 内存文档存储
//!
//! 用于开发环境和测试，进程退出后数据丢失。

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use super::{Document, DocumentStore, Filter, StoreResult, matches_all};
use crate::resilience::RemoteError;

/// 按集合分组保存文档，集合内按 ID 排序
#[derive(Debug, Default)]
pub struct MemoryStorage {
    collections: DashMap<String, BTreeMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入或覆盖文档
    pub fn put(&self, collection: &str, id: &str, data: Value) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
    }

    /// 集合中的文档数量
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStorage {
    async fn fetch_one(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        Ok(self.collections.get(collection).and_then(|docs| {
            docs.get(id)
                .map(|data| Document::new(collection, id, data.clone()))
        }))
    }

    async fn fetch_many(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Document>> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let result: Vec<Document> = docs
            .iter()
            .map(|(id, data)| Document::new(collection, id.clone(), data.clone()))
            .filter(|doc| matches_all(filters, doc))
            .collect();

        debug!(
            "Memory storage matched {} document(s) in {}",
            result.len(),
            collection
        );
        Ok(result)
    }

    async fn insert(
        &self,
        collection: &str,
        id: Option<&str>,
        data: Value,
    ) -> StoreResult<Document> {
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut docs = self.collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(RemoteError::already_exists(format!(
                "Document {collection}/{id} already exists"
            )));
        }
        docs.insert(id.clone(), data.clone());

        Ok(Document::new(collection, id, data))
    }
}
