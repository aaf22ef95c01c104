//! 种子数据导入
//!
//! 种子文件是一个 JSON 对象：键为集合名，值为文档数组，每个文档必须带 `id` 字段。
//!
//! ```json
//! { "students": [{ "id": "s1", "classId": "c1" }] }
//! ```

use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

use super::DocumentStore;
use crate::errors::{ExamPortalError, Result};
use crate::resilience::RetryPolicy;
use crate::resolver::lookup::RetryingStore;

const SEED_ACTION: &str = "导入种子数据";

/// 从文件读取并导入种子数据
pub async fn import_seed_file(
    store: &dyn DocumentStore,
    path: impl AsRef<Path>,
    policy: &RetryPolicy,
) -> Result<usize> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await?;
    let seed: Value = serde_json::from_str(&content)?;
    info!("Importing seed data from {}", path.display());
    import_seed(store, &seed, policy).await
}

/// 导入种子数据，返回新写入的文档数
///
/// 已存在的文档保持不变；每次读写都按 `policy` 重试。
pub async fn import_seed(store: &dyn DocumentStore, seed: &Value, policy: &RetryPolicy) -> Result<usize> {
    let remote = RetryingStore {
        store,
        policy,
        cancel: None,
    };

    let collections = seed
        .as_object()
        .ok_or_else(|| ExamPortalError::validation("种子数据必须是以集合名为键的 JSON 对象"))?;

    let mut imported = 0;
    for (collection, documents) in collections {
        let documents = documents.as_array().ok_or_else(|| {
            ExamPortalError::validation(format!("集合 {collection} 的种子数据必须是数组"))
        })?;

        for document in documents {
            let mut data = document.clone();
            let id = match data.as_object_mut().and_then(|obj| obj.remove("id")) {
                Some(Value::String(id)) if !id.is_empty() => id,
                Some(Value::Number(n)) => n.to_string(),
                _ => {
                    warn!("Skipping seed document without id in {}", collection);
                    continue;
                }
            };

            let existing = remote
                .fetch_one(collection, &id)
                .await
                .map_err(|e| ExamPortalError::from_remote(&e, SEED_ACTION))?;
            if existing.is_some() {
                debug!("Seed document {}/{} already exists, skipping", collection, id);
                continue;
            }

            match remote.insert(collection, &id, &data).await {
                Ok(_) => {}
                Err(e) if e.is_already_exists() => {
                    debug!("Seed document {}/{} was written concurrently, skipping", collection, id);
                    continue;
                }
                Err(e) => return Err(ExamPortalError::from_remote(&e, SEED_ACTION)),
            }
            imported += 1;
        }
    }

    info!("Imported {} seed document(s)", imported);
    Ok(imported)
}
