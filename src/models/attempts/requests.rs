use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 提交测验请求
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "attempt.ts")]
pub struct SubmitAttemptRequest {
    // 答对的题目数
    pub correct_answers: u32,
}
