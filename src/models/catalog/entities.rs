use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::errors::{ExamPortalError, Result};
use crate::models::DocRef;
use crate::models::common::timestamp::parse_timestamp;
use crate::storage::Document;

// 测验报名方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "assessment.ts")]
pub enum EnrollmentMode {
    #[default]
    WholeCohort, // 班级全体
    Selective, // 指定学生
}

impl std::str::FromStr for EnrollmentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "whole-cohort" => Ok(EnrollmentMode::WholeCohort),
            "selective" => Ok(EnrollmentMode::Selective),
            _ => Err(format!(
                "无效的报名方式: '{s}'. 支持: whole-cohort, selective"
            )),
        }
    }
}

impl std::fmt::Display for EnrollmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrollmentMode::WholeCohort => write!(f, "whole-cohort"),
            EnrollmentMode::Selective => write!(f, "selective"),
        }
    }
}

// 测验的时间状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "assessment.ts")]
pub enum TestStatus {
    Upcoming,  // 未开放
    Ongoing,   // 进行中
    Finished,  // 已结束
    Published, // 已发布，未设置时间窗口
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestStatus::Upcoming => write!(f, "upcoming"),
            TestStatus::Ongoing => write!(f, "ongoing"),
            TestStatus::Finished => write!(f, "finished"),
            TestStatus::Published => write!(f, "published"),
        }
    }
}

/// 已排期的测验
#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    // 唯一 ID
    pub id: String,
    // 测验名称
    pub name: String,
    // 所属班级
    pub class_id: Option<DocRef>,
    // 科目
    pub subject_id: Option<DocRef>,
    // 开放时间，为空表示已开放
    pub opens_at: Option<DateTime<Utc>>,
    // 截止时间，为空表示永不截止
    pub closes_at: Option<DateTime<Utc>>,
    pub enrollment: EnrollmentMode,
    // 指定学生模式下的名单
    pub eligible_learners: Vec<DocRef>,
    pub question_count: u32,
    // 草稿为 false，只有已发布的测验会被解析
    pub published: bool,
}

impl TryFrom<&Document> for Test {
    type Error = ExamPortalError;

    fn try_from(doc: &Document) -> Result<Self> {
        let opens_at = parse_timestamp(doc.get("opensAt"))?;
        let closes_at = parse_timestamp(doc.get("closesAt"))?;

        if let (Some(opens), Some(closes)) = (opens_at, closes_at)
            && opens > closes
        {
            return Err(ExamPortalError::validation(format!(
                "测验 {} 的开放时间晚于截止时间",
                doc.id
            )));
        }

        let enrollment = match doc.get_str("enrollment") {
            Some(mode) => mode.parse().map_err(ExamPortalError::validation)?,
            None => EnrollmentMode::default(),
        };

        let eligible_learners = doc
            .get("eligibleLearners")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(DocRef::from_value).collect())
            .unwrap_or_default();

        let question_count = doc
            .get("questionCount")
            .and_then(Value::as_u64)
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(0);

        Ok(Test {
            id: doc.id.clone(),
            name: doc.get_str("name").unwrap_or_default().to_string(),
            class_id: doc.get_ref("classId"),
            subject_id: doc.get_ref("subjectId"),
            opens_at,
            closes_at,
            enrollment,
            eligible_learners,
            question_count,
            published: doc.get_bool("published").unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_full_document() {
        let doc = Document::new(
            "tests",
            "t1",
            json!({
                "name": "Algebra quiz",
                "classId": {"$ref": "classes/c1"},
                "subjectId": "subjects/math",
                "opensAt": "2025-03-01T08:00:00Z",
                "closesAt": "2025-03-01T09:00:00Z",
                "enrollment": "selective",
                "eligibleLearners": [{"$ref": "students/s1"}, "s2", 42, null],
                "questionCount": 20,
                "published": true
            }),
        );

        let test = Test::try_from(&doc).unwrap();
        assert_eq!(test.name, "Algebra quiz");
        assert_eq!(test.class_id, Some(DocRef::new("classes", "c1")));
        assert_eq!(test.subject_id, Some(DocRef::new("subjects", "math")));
        assert_eq!(test.enrollment, EnrollmentMode::Selective);
        assert_eq!(test.eligible_learners.len(), 3);
        assert_eq!(test.question_count, 20);
        assert!(test.published);
    }

    #[test]
    fn test_decode_defaults() {
        let doc = Document::new("tests", "t2", json!({}));
        let test = Test::try_from(&doc).unwrap();
        assert_eq!(test.enrollment, EnrollmentMode::WholeCohort);
        assert!(!test.published);
        assert_eq!(test.opens_at, None);
        assert_eq!(test.closes_at, None);
        assert!(test.eligible_learners.is_empty());
    }

    #[test]
    fn test_reject_inverted_window() {
        let doc = Document::new(
            "tests",
            "t3",
            json!({
                "opensAt": "2025-03-02T00:00:00Z",
                "closesAt": "2025-03-01T00:00:00Z"
            }),
        );
        assert!(matches!(
            Test::try_from(&doc),
            Err(ExamPortalError::Validation(_))
        ));
    }

    #[test]
    fn test_reject_unknown_enrollment() {
        let doc = Document::new("tests", "t4", json!({"enrollment": "lottery"}));
        assert!(Test::try_from(&doc).is_err());

        let doc = Document::new("tests", "t5", json!({"enrollment": "WHOLE_COHORT"}));
        assert_eq!(
            Test::try_from(&doc).unwrap().enrollment,
            EnrollmentMode::WholeCohort
        );
    }
}
