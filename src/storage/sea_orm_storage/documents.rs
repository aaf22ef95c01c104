//! 文档存储操作

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::{SeaOrmStorage, remote_error};
use crate::entity::documents::Column;
use crate::entity::prelude::{DocumentActiveModel, Documents};
use crate::resilience::RemoteError;
use crate::storage::{Document, DocumentStore, Filter, StoreResult, matches_all};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

#[async_trait]
impl DocumentStore for SeaOrmStorage {
    async fn fetch_one(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let result = Documents::find()
            .filter(Column::Collection.eq(collection))
            .filter(Column::DocId.eq(id))
            .one(&self.db)
            .await
            .map_err(|e| remote_error(e, "查询文档失败"))?;

        match result {
            Some(model) => model
                .into_document()
                .map(Some)
                .map_err(|e| RemoteError::new("data-loss", format!("文档内容损坏: {e}"))),
            None => Ok(None),
        }
    }

    async fn fetch_many(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Document>> {
        let mut query = Documents::find().filter(Column::Collection.eq(collection));
        for pattern in filters.iter().filter_map(like_pattern) {
            query = query.filter(Column::Data.like(pattern));
        }

        let models = query
            .order_by_asc(Column::DocId)
            .all(&self.db)
            .await
            .map_err(|e| remote_error(e, "查询文档列表失败"))?;

        // LIKE 只是预过滤，最终以内存中的精确比较为准；损坏的文档跳过
        let documents = models
            .into_iter()
            .filter_map(|model| {
                let key = format!("{}/{}", model.collection, model.doc_id);
                match model.into_document() {
                    Ok(doc) => Some(doc),
                    Err(e) => {
                        warn!("Skipping corrupted document {}: {}", key, e);
                        None
                    }
                }
            })
            .filter(|doc| matches_all(filters, doc))
            .collect();

        Ok(documents)
    }

    async fn insert(
        &self,
        collection: &str,
        id: Option<&str>,
        data: Value,
    ) -> StoreResult<Document> {
        let doc_id = id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let now = chrono::Utc::now().timestamp();
        let serialized = serde_json::to_string(&data)
            .map_err(|e| RemoteError::new("invalid-argument", format!("文档序列化失败: {e}")))?;

        let model = DocumentActiveModel {
            collection: Set(collection.to_string()),
            doc_id: Set(doc_id.clone()),
            data: Set(serialized),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        // (collection, doc_id) 唯一索引保证同一 ID 只有一次写入成功
        model
            .insert(&self.db)
            .await
            .map_err(|e| remote_error(e, &format!("写入文档 {collection}/{doc_id} 失败")))?;

        Ok(Document::new(collection, doc_id, data))
    }
}

/// 顶层字段的等值条件转换为 `data LIKE '%"field":value%'`
///
/// 文档以紧凑 JSON 保存，匹配结果是精确结果的超集。嵌套路径、数组、
/// 多键对象和含反斜杠的值不下推，只在内存中比较。
fn like_pattern(filter: &Filter) -> Option<String> {
    let Filter::Eq(field, value) = filter else {
        return None;
    };
    if field.contains('.') {
        return None;
    }
    let pushable = match value {
        Value::Array(_) => false,
        Value::Object(map) => map.len() == 1 && map.values().all(|v| !v.is_array() && !v.is_object()),
        _ => true,
    };
    if !pushable {
        return None;
    }

    let needle = format!(
        "{}:{}",
        serde_json::to_string(field).ok()?,
        serde_json::to_string(value).ok()?
    );
    if needle.contains('\\') {
        return None;
    }
    Some(format!("%{needle}%"))
}
