//! 远程错误分类
//!
//! 把文档存储返回的不透明错误码归入一个封闭的原因集合，
//! 并生成面向用户的提示语句。

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// 文档存储返回的原始错误
///
/// `code` 和 `message` 都可能为空，分类逻辑必须对任意输入保持完整。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl RemoteError {
    pub const CANCELLED: &'static str = "cancelled";
    pub const ALREADY_EXISTS: &'static str = "already-exists";

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new("unavailable", message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new("unknown", message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(Self::ALREADY_EXISTS, message)
    }

    pub fn is_already_exists(&self) -> bool {
        self.code == Self::ALREADY_EXISTS
    }

    /// 错误所属的原因分类
    pub fn cause(&self) -> ErrorCause {
        ErrorCause::from_code(&self.code)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code.is_empty(), self.message.is_empty()) {
            (true, true) => write!(f, "remote error"),
            (false, true) => write!(f, "{}", self.code),
            (true, false) => write!(f, "{}", self.message),
            (false, false) => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

impl std::error::Error for RemoteError {}

/// 重试被取消时返回的标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl From<Cancelled> for RemoteError {
    fn from(_: Cancelled) -> Self {
        RemoteError::new(RemoteError::CANCELLED, "operation cancelled by caller")
    }
}

/// 面向用户的错误原因（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "error-cause.ts")]
pub enum ErrorCause {
    PermissionDenied,
    ServiceUnavailable,
    Timeout,
    NotFound,
    Unauthenticated,
    QuotaExceeded,
    PreconditionFailed,
    Aborted,
    Unknown,
}

impl ErrorCause {
    /// 从错误码解析原因
    ///
    /// 支持 `service/code` 形式的前缀，大小写与下划线不敏感。
    pub fn from_code(code: &str) -> Self {
        let code = code.rsplit('/').next().unwrap_or_default();
        let normalized = code.trim().to_ascii_lowercase().replace('_', "-");

        match normalized.as_str() {
            "permission-denied" => ErrorCause::PermissionDenied,
            "unavailable" | "service-unavailable" => ErrorCause::ServiceUnavailable,
            "deadline-exceeded" | "timeout" => ErrorCause::Timeout,
            "not-found" => ErrorCause::NotFound,
            "unauthenticated" => ErrorCause::Unauthenticated,
            "resource-exhausted" | "quota-exceeded" => ErrorCause::QuotaExceeded,
            "failed-precondition" | "precondition-failed" => ErrorCause::PreconditionFailed,
            "aborted" | "cancelled" | "canceled" => ErrorCause::Aborted,
            _ => ErrorCause::Unknown,
        }
    }

    /// 是否属于应当被重试吸收的瞬时错误
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorCause::ServiceUnavailable | ErrorCause::Timeout | ErrorCause::Aborted
        )
    }
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCause::PermissionDenied => "permission-denied",
            ErrorCause::ServiceUnavailable => "service-unavailable",
            ErrorCause::Timeout => "timeout",
            ErrorCause::NotFound => "not-found",
            ErrorCause::Unauthenticated => "unauthenticated",
            ErrorCause::QuotaExceeded => "quota-exceeded",
            ErrorCause::PreconditionFailed => "precondition-failed",
            ErrorCause::Aborted => "aborted",
            ErrorCause::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// 把远程错误翻译为可直接展示给用户的提示
///
/// `action` 是用户正在进行的操作，例如 "加载测验列表"。
pub fn classify_remote_error(error: &RemoteError, action: &str) -> String {
    let action = if action.trim().is_empty() {
        "完成操作"
    } else {
        action.trim()
    };

    match error.cause() {
        ErrorCause::PermissionDenied => format!("没有权限{action}，请确认账号权限后重试"),
        ErrorCause::ServiceUnavailable => {
            format!("服务暂时不可用，无法{action}，请检查网络连接后重试")
        }
        ErrorCause::Timeout => format!("{action}超时，请稍后重试"),
        ErrorCause::NotFound => format!("{action}失败：请求的数据不存在"),
        ErrorCause::Unauthenticated => format!("登录状态已失效，请重新登录后再{action}"),
        ErrorCause::QuotaExceeded => format!("请求过于频繁或配额已用尽，暂时无法{action}"),
        ErrorCause::PreconditionFailed => format!("当前数据状态不满足条件，无法{action}"),
        ErrorCause::Aborted => format!("{action}被中断，请重试"),
        ErrorCause::Unknown => {
            if error.message.trim().is_empty() {
                format!("{action}时发生未知错误，请稍后重试")
            } else {
                error.message.clone()
            }
        }
    }
}
