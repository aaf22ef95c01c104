//! 文档存储层
//!
//! 解析器只通过 [`DocumentStore`] 访问远程文档，所有方法都可能失败、
//! 都被视为可重试的不透明操作。

use serde_json::Value;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::{ExamPortalError, Result};
use crate::resilience::RemoteError;

pub mod document;
pub mod memory_storage;
pub mod sea_orm_storage;
pub mod seed;

pub use document::{Document, Filter, collections, matches_all};

/// 存储操作的结果，错误保持远程存储的原始形态
pub type StoreResult<T> = std::result::Result<T, RemoteError>;

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    // 按 ID 获取单个文档
    async fn fetch_one(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;
    // 按条件获取文档列表
    async fn fetch_many(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Document>>;
    // 写入新文档，未指定 ID 时自动生成；ID 已存在时返回 already-exists
    async fn insert(&self, collection: &str, id: Option<&str>, data: Value)
    -> StoreResult<Document>;
}

pub async fn create_storage(config: &AppConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.storage.backend.as_str() {
        "sea_orm" => {
            let storage = sea_orm_storage::SeaOrmStorage::new_async(&config.database).await?;
            Ok(Arc::new(storage))
        }
        "memory" => Ok(Arc::new(memory_storage::MemoryStorage::new())),
        other => Err(ExamPortalError::storage_plugin_not_found(format!(
            "未知的存储后端: {other}. 支持: sea_orm, memory"
        ))),
    }
}
