//! 文档引用
//!
//! 同一份远程文档可能以多种形式被引用：`{"$ref": "students/abc"}`、
//! 路径字符串 `"students/abc"` 或裸 ID `"abc"`。比较引用时只看路径/ID，
//! 从不依赖对象身份。

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use ts_rs::TS;

/// 引用对象中保存路径的键
pub const REF_KEY: &str = "$ref";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "reference.ts")]
pub struct DocRef {
    /// 所属集合路径，裸 ID 引用时为空
    pub collection: Option<String>,
    pub id: String,
}

impl DocRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: Some(collection.into()),
            id: id.into(),
        }
    }

    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            collection: None,
            id: id.into(),
        }
    }

    /// 解析路径字符串，最后一段为 ID，其余为集合路径
    pub fn parse_path(path: &str) -> Option<Self> {
        let path = path.trim().trim_matches('/');
        if path.is_empty() {
            return None;
        }

        match path.rsplit_once('/') {
            Some((collection, id)) if !id.is_empty() && !collection.is_empty() => {
                Some(Self::new(collection, id))
            }
            Some(_) => None,
            None => Some(Self::bare(path)),
        }
    }

    /// 从 JSON 值解析引用，无法识别的形状返回 `None`
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::parse_path(s),
            Value::Number(n) => Some(Self::bare(n.to_string())),
            Value::Object(map) => map
                .get(REF_KEY)
                .or_else(|| map.get("path"))
                .and_then(Value::as_str)
                .and_then(Self::parse_path),
            _ => None,
        }
    }

    /// 完整路径；裸 ID 时只返回 ID
    pub fn path(&self) -> String {
        match &self.collection {
            Some(collection) => format!("{collection}/{}", self.id),
            None => self.id.clone(),
        }
    }

    /// 是否指向同一份文档
    ///
    /// ID 必须相同；双方都带集合时集合也必须相同。
    pub fn refers_to(&self, other: &DocRef) -> bool {
        if self.id != other.id {
            return false;
        }
        match (&self.collection, &other.collection) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    /// 引用形式的查询值
    pub fn to_reference_value(&self) -> Value {
        json!({ REF_KEY: self.path() })
    }

    /// 字符串 ID 形式的查询值
    pub fn to_id_value(&self) -> Value {
        Value::String(self.id.clone())
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
