//! 数据模型定义

pub mod assessments;
pub mod attempts;
pub mod catalog;
pub mod common;
pub mod learners;
pub mod subjects;
pub mod system;

pub use common::reference::DocRef;
pub use common::response::ApiResponse;

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// 业务错误码，随 `ApiResponse` 返回给前端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    RateLimitExceeded = 1029,
    InternalServerError = 1500,
    ServiceUnavailable = 1503,
    GatewayTimeout = 1504,

    // 测验相关
    TestNotAttemptable = 3001,
    AttemptAlreadyRecorded = 3002,
    LearnerNotEligible = 3003,
}
