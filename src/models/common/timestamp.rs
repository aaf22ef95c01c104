//! 时间戳解码
//!
//! 远程文档中的时间可能是 RFC 3339 字符串、毫秒时间戳，
//! 或 `{"seconds": .., "nanoseconds": ..}` 形式的对象。

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::errors::{ExamPortalError, Result};

/// 解析可选的时间字段，`null` 或缺失返回 `None`
pub fn parse_timestamp(value: Option<&Value>) -> Result<Option<DateTime<Utc>>> {
    let Some(value) = value else {
        return Ok(None);
    };

    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => {
            let parsed = DateTime::parse_from_rfc3339(s.trim())?;
            Ok(Some(parsed.with_timezone(&Utc)))
        }
        Value::Number(n) => {
            let millis = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or_else(|| ExamPortalError::date_parse(format!("无效的时间戳: {n}")))?;
            DateTime::<Utc>::from_timestamp_millis(millis)
                .map(Some)
                .ok_or_else(|| ExamPortalError::date_parse(format!("时间戳超出范围: {millis}")))
        }
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)
                .ok_or_else(|| ExamPortalError::date_parse("时间对象缺少 seconds 字段"))?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("nanos"))
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            DateTime::<Utc>::from_timestamp(seconds, nanos.min(999_999_999) as u32)
                .map(Some)
                .ok_or_else(|| ExamPortalError::date_parse(format!("时间戳超出范围: {seconds}")))
        }
        other => Err(ExamPortalError::date_parse(format!(
            "无法识别的时间格式: {other}"
        ))),
    }
}
