use chrono::{DateTime, Utc};

use crate::models::catalog::entities::{Test, TestStatus};

/// 根据时间窗口判断测验状态
///
/// 先检查截止时间：截止时间等于 `now` 也算已结束。
pub fn resolve_test_status(test: &Test, now: DateTime<Utc>) -> TestStatus {
    if let Some(closes_at) = test.closes_at
        && closes_at <= now
    {
        return TestStatus::Finished;
    }

    match test.opens_at {
        Some(opens_at) if opens_at <= now => TestStatus::Ongoing,
        Some(_) => TestStatus::Upcoming,
        None => TestStatus::Published,
    }
}

/// 距离截止的毫秒数，不会为负；永不截止时为 `None`
pub fn time_remaining_ms(test: &Test, now: DateTime<Utc>) -> Option<i64> {
    test.closes_at
        .map(|closes_at| (closes_at - now).num_milliseconds().max(0))
}
