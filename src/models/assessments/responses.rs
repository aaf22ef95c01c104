use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::attempts::entities::LetterGrade;
use crate::models::catalog::entities::{EnrollmentMode, TestStatus};

/// 已有作答的摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "assessment.ts")]
pub struct AttemptSummary {
    pub attempt_id: String,
    pub percentage: f64,
    pub grade: LetterGrade,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// 面向某个学生的单个测验视图，每次解析重新计算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "assessment.ts")]
pub struct ResolvedTestView {
    pub test_id: String,
    pub name: String,
    pub class_id: Option<String>,
    pub subject_id: Option<String>,
    // 科目名称，查不到时为空
    pub subject_name: Option<String>,
    pub opens_at: Option<DateTime<Utc>>,
    pub closes_at: Option<DateTime<Utc>>,
    pub question_count: u32,
    pub enrollment: EnrollmentMode,
    pub status: TestStatus,
    pub eligible: bool,
    // 是否已经作答
    pub completed: bool,
    // 现在能否进入作答
    pub can_attempt: bool,
    // 距离截止的毫秒数，永不截止时为空
    pub time_remaining_ms: Option<i64>,
    pub attempt: Option<AttemptSummary>,
}
