//! 文档与查询条件

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::DocRef;

/// 集合名称
pub mod collections {
    pub const STUDENTS: &str = "students";
    pub const TESTS: &str = "tests";
    pub const ATTEMPTS: &str = "attempts";
    pub const SUBJECTS: &str = "subjects";
    pub const CLASSES: &str = "classes";
}

/// 远程存储中的一份文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub collection: String,
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(collection: impl Into<String>, id: impl Into<String>, data: Value) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
            data,
        }
    }

    /// 指向本文档的引用
    pub fn reference(&self) -> DocRef {
        DocRef::new(self.collection.clone(), self.id.clone())
    }

    /// 读取字段；支持 `a.b` 形式的嵌套路径
    pub fn get(&self, field: &str) -> Option<&Value> {
        field
            .split('.')
            .try_fold(&self.data, |value, segment| value.get(segment))
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    pub fn get_ref(&self, field: &str) -> Option<DocRef> {
        self.get(field).and_then(DocRef::from_value)
    }
}

/// 查询条件，多个条件之间为"与"关系
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// 字段值等于给定值
    Eq(String, Value),
    /// 数组字段包含给定值
    ArrayContains(String, Value),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn array_contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::ArrayContains(field.into(), value.into())
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Eq(field, expected) => doc.get(field) == Some(expected),
            Filter::ArrayContains(field, expected) => doc
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(expected)),
        }
    }
}

/// 文档是否满足全部条件
pub fn matches_all(filters: &[Filter], doc: &Document) -> bool {
    filters.iter().all(|filter| filter.matches(doc))
}
