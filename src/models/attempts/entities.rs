use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use ts_rs::TS;

use crate::errors::{ExamPortalError, Result};
use crate::models::DocRef;
use crate::models::common::timestamp::parse_timestamp;
use crate::storage::Document;

// 等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "attempt.ts")]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    F,
}

impl LetterGrade {
    /// 按百分比计算等级：A ≥ 90，B ≥ 80，C ≥ 70，D ≥ 60，其余为 F
    pub fn from_percentage(percentage: f64) -> Self {
        match percentage {
            p if p >= 90.0 => LetterGrade::A,
            p if p >= 80.0 => LetterGrade::B,
            p if p >= 70.0 => LetterGrade::C,
            p if p >= 60.0 => LetterGrade::D,
            _ => LetterGrade::F,
        }
    }
}

impl std::str::FromStr for LetterGrade {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(LetterGrade::A),
            "B" => Ok(LetterGrade::B),
            "C" => Ok(LetterGrade::C),
            "D" => Ok(LetterGrade::D),
            "F" => Ok(LetterGrade::F),
            _ => Err(format!("Invalid letter grade: {s}")),
        }
    }
}

impl std::fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        };
        write!(f, "{letter}")
    }
}

/// 作答记录：学生已经用掉了某次测验的唯一机会
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "attempt.ts")]
pub struct AttemptRecord {
    pub id: String,
    pub test_id: DocRef,
    pub learner_id: DocRef,
    // 百分制得分
    pub percentage: f64,
    pub grade: LetterGrade,
    pub created_at: Option<DateTime<Utc>>,
}

impl AttemptRecord {
    /// 写入存储时使用的文档内容
    pub fn to_document_data(&self) -> Value {
        json!({
            "testId": self.test_id.to_id_value(),
            "studentId": self.learner_id.to_id_value(),
            "percentage": self.percentage,
            "grade": self.grade.to_string(),
            "createdAt": self.created_at.map(|t| t.to_rfc3339()),
        })
    }
}

impl TryFrom<&Document> for AttemptRecord {
    type Error = ExamPortalError;

    fn try_from(doc: &Document) -> Result<Self> {
        let test_id = doc
            .get_ref("testId")
            .ok_or_else(|| ExamPortalError::validation(format!("作答记录 {} 缺少 testId", doc.id)))?;
        let learner_id = doc.get_ref("studentId").ok_or_else(|| {
            ExamPortalError::validation(format!("作答记录 {} 缺少 studentId", doc.id))
        })?;

        let percentage = doc
            .get("percentage")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        // 历史数据里等级可能缺失或不规范，按分数重新计算
        let grade = doc
            .get_str("grade")
            .and_then(|g| g.parse().ok())
            .unwrap_or_else(|| LetterGrade::from_percentage(percentage));

        Ok(AttemptRecord {
            id: doc.id.clone(),
            test_id,
            learner_id,
            percentage,
            grade,
            created_at: parse_timestamp(doc.get("createdAt")).unwrap_or(None),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_grade_thresholds() {
        assert_eq!(LetterGrade::from_percentage(100.0), LetterGrade::A);
        assert_eq!(LetterGrade::from_percentage(90.0), LetterGrade::A);
        assert_eq!(LetterGrade::from_percentage(89.99), LetterGrade::B);
        assert_eq!(LetterGrade::from_percentage(70.0), LetterGrade::C);
        assert_eq!(LetterGrade::from_percentage(60.0), LetterGrade::D);
        assert_eq!(LetterGrade::from_percentage(59.9), LetterGrade::F);
        assert_eq!(LetterGrade::from_percentage(0.0), LetterGrade::F);
    }

    #[test]
    fn test_decode_attempt() {
        let doc = Document::new(
            "attempts",
            "a1",
            json!({
                "testId": "t1",
                "studentId": {"$ref": "students/s1"},
                "percentage": 85.0,
                "grade": "b",
                "createdAt": "2025-03-01T08:30:00Z"
            }),
        );
        let attempt = AttemptRecord::try_from(&doc).unwrap();
        assert_eq!(attempt.test_id, DocRef::bare("t1"));
        assert_eq!(attempt.learner_id, DocRef::new("students", "s1"));
        assert_eq!(attempt.grade, LetterGrade::B);
        assert!(attempt.created_at.is_some());
    }

    #[test]
    fn test_missing_grade_is_recomputed() {
        let doc = Document::new(
            "attempts",
            "a2",
            json!({"testId": "t1", "studentId": "s1", "percentage": 93}),
        );
        assert_eq!(
            AttemptRecord::try_from(&doc).unwrap().grade,
            LetterGrade::A
        );
    }

    #[test]
    fn test_missing_test_id_is_rejected() {
        let doc = Document::new("attempts", "a3", json!({"studentId": "s1"}));
        assert!(AttemptRecord::try_from(&doc).is_err());
    }
}
