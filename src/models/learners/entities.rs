use crate::models::DocRef;
use crate::storage::Document;

/// 学生（解析对象）
#[derive(Debug, Clone, PartialEq)]
pub struct Learner {
    pub id: String,
    // 所属班级
    pub cohort: Option<DocRef>,
    pub active: bool,
    // 认证系统中的 uid，部分历史数据以此关联
    pub uid: Option<String>,
}

impl Learner {
    /// 指向该学生文档的引用
    pub fn reference(&self) -> DocRef {
        DocRef::new(crate::storage::collections::STUDENTS, self.id.clone())
    }
}

impl From<&Document> for Learner {
    fn from(doc: &Document) -> Self {
        Learner {
            id: doc.id.clone(),
            cohort: doc.get_ref("classId"),
            active: doc.get_bool("active").unwrap_or(true),
            uid: doc.get_str("uid").map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_learner() {
        let doc = Document::new(
            "students",
            "s1",
            json!({"classId": "c1", "uid": "auth-1"}),
        );
        let learner = Learner::from(&doc);
        assert_eq!(learner.cohort, Some(DocRef::bare("c1")));
        assert!(learner.active);
        assert_eq!(learner.uid.as_deref(), Some("auth-1"));
        assert_eq!(learner.reference(), DocRef::new("students", "s1"));
    }

    #[test]
    fn test_inactive_learner() {
        let doc = Document::new("students", "s2", json!({"active": false}));
        let learner = Learner::from(&doc);
        assert!(!learner.active);
        assert_eq!(learner.cohort, None);
    }
}
