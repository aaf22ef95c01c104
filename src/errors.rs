//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。
//! 远程存储错误经过分类后落入 `E1xx` 段的变体。

use std::fmt;

use crate::resilience::{ErrorCause, RemoteError, classify_remote_error};

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_exam_portal_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum ExamPortalError {
            $($variant(String),)*
        }

        impl ExamPortalError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(ExamPortalError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(ExamPortalError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(ExamPortalError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl ExamPortalError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        ExamPortalError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_exam_portal_errors! {
    DatabaseConfig("E001", "Database Configuration Error"),
    DatabaseConnection("E002", "Database Connection Error"),
    DatabaseOperation("E003", "Database Operation Error"),
    FileOperation("E004", "File Operation Error"),
    Validation("E005", "Validation Error"),
    Serialization("E006", "Serialization Error"),
    StoragePluginNotFound("E007", "Storage Plugin Not Found"),
    DateParse("E008", "Date Parse Error"),
    TestNotAttemptable("E009", "Test Not Attemptable"),
    AttemptAlreadyRecorded("E010", "Attempt Already Recorded"),
    LearnerNotEligible("E011", "Learner Not Eligible"),
    PermissionDenied("E101", "Permission Denied"),
    ServiceUnavailable("E102", "Service Unavailable"),
    Timeout("E103", "Timeout"),
    NotFound("E104", "Resource Not Found"),
    Unauthenticated("E105", "Unauthenticated"),
    QuotaExceeded("E106", "Quota Exceeded"),
    PreconditionFailed("E107", "Precondition Failed"),
    Aborted("E108", "Aborted"),
    Unknown("E109", "Unknown Remote Error"),
}

impl ExamPortalError {
    /// 把远程错误转换为带用户提示的错误
    ///
    /// `action` 会嵌入提示语句，例如 "加载测验列表"。
    pub fn from_remote(err: &RemoteError, action: &str) -> Self {
        let message = classify_remote_error(err, action);
        match err.cause() {
            ErrorCause::PermissionDenied => ExamPortalError::PermissionDenied(message),
            ErrorCause::ServiceUnavailable => ExamPortalError::ServiceUnavailable(message),
            ErrorCause::Timeout => ExamPortalError::Timeout(message),
            ErrorCause::NotFound => ExamPortalError::NotFound(message),
            ErrorCause::Unauthenticated => ExamPortalError::Unauthenticated(message),
            ErrorCause::QuotaExceeded => ExamPortalError::QuotaExceeded(message),
            ErrorCause::PreconditionFailed => ExamPortalError::PreconditionFailed(message),
            ErrorCause::Aborted => ExamPortalError::Aborted(message),
            ErrorCause::Unknown => ExamPortalError::Unknown(message),
        }
    }

    /// 远程错误的分类；非远程错误返回 `None`
    pub fn cause(&self) -> Option<ErrorCause> {
        match self {
            ExamPortalError::PermissionDenied(_) => Some(ErrorCause::PermissionDenied),
            ExamPortalError::ServiceUnavailable(_) => Some(ErrorCause::ServiceUnavailable),
            ExamPortalError::Timeout(_) => Some(ErrorCause::Timeout),
            ExamPortalError::NotFound(_) => Some(ErrorCause::NotFound),
            ExamPortalError::Unauthenticated(_) => Some(ErrorCause::Unauthenticated),
            ExamPortalError::QuotaExceeded(_) => Some(ErrorCause::QuotaExceeded),
            ExamPortalError::PreconditionFailed(_) => Some(ErrorCause::PreconditionFailed),
            ExamPortalError::Aborted(_) => Some(ErrorCause::Aborted),
            ExamPortalError::Unknown(_) => Some(ErrorCause::Unknown),
            _ => None,
        }
    }

    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ExamPortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ExamPortalError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for ExamPortalError {
    fn from(err: sea_orm::DbErr) -> Self {
        ExamPortalError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for ExamPortalError {
    fn from(err: std::io::Error) -> Self {
        ExamPortalError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ExamPortalError {
    fn from(err: serde_json::Error) -> Self {
        ExamPortalError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for ExamPortalError {
    fn from(err: chrono::ParseError) -> Self {
        ExamPortalError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExamPortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ExamPortalError::database_config("test").code(), "E001");
        assert_eq!(ExamPortalError::validation("test").code(), "E005");
        assert_eq!(ExamPortalError::test_not_attemptable("test").code(), "E009");
        assert_eq!(ExamPortalError::attempt_already_recorded("test").code(), "E010");
        assert_eq!(ExamPortalError::permission_denied("test").code(), "E101");
        assert_eq!(ExamPortalError::unknown("test").code(), "E109");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            ExamPortalError::service_unavailable("test").error_type(),
            "Service Unavailable"
        );
        assert_eq!(
            ExamPortalError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_error_message() {
        let err = ExamPortalError::validation("Invalid input");
        assert_eq!(err.message(), "Invalid input");
    }

    #[test]
    fn test_format_simple() {
        let err = ExamPortalError::timeout("加载测验列表超时");
        let formatted = err.format_simple();
        assert!(formatted.contains("Timeout"));
        assert!(formatted.contains("加载测验列表超时"));
    }

    #[test]
    fn test_from_remote_selects_variant() {
        let err = ExamPortalError::from_remote(
            &RemoteError::new("permission-denied", "denied"),
            "加载测验列表",
        );
        assert!(matches!(err, ExamPortalError::PermissionDenied(_)));
        assert_eq!(err.cause(), Some(ErrorCause::PermissionDenied));
        assert!(err.message().contains("加载测验列表"));

        let err = ExamPortalError::from_remote(&RemoteError::default(), "加载测验列表");
        assert!(matches!(err, ExamPortalError::Unknown(_)));
    }

    #[test]
    fn test_local_errors_have_no_cause() {
        assert_eq!(ExamPortalError::validation("x").cause(), None);
        assert_eq!(ExamPortalError::learner_not_eligible("x").cause(), None);
    }
}
