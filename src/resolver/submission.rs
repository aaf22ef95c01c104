//! 提交作答
//!
//! 写入前重新校验发布状态、参与资格、唯一作答和时间窗口。
//! 作答记录的文档 ID 由测验和学生决定，并发提交由存储的 ID 唯一性裁决。

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{AssessmentResolver, resolve_completion, resolve_eligibility, resolve_test_status};
use crate::errors::{ExamPortalError, Result};
use crate::models::DocRef;
use crate::models::attempts::entities::{AttemptRecord, LetterGrade};
use crate::models::catalog::entities::{Test, TestStatus};
use crate::resilience::RemoteError;
use crate::storage::collections;

const SUBMIT_ACTION: &str = "提交测验";

/// 按答对题数计算百分制得分
pub fn score_percentage(correct_answers: u32, question_count: u32) -> Result<f64> {
    if question_count == 0 {
        return Err(ExamPortalError::test_not_attemptable("测验没有题目"));
    }
    if correct_answers > question_count {
        return Err(ExamPortalError::validation(format!(
            "答对题数 {correct_answers} 超过题目总数 {question_count}"
        )));
    }
    Ok(f64::from(correct_answers) / f64::from(question_count) * 100.0)
}

/// 作答记录的文档 ID，每个 (测验, 学生) 对只有一个
pub fn attempt_document_id(test_id: &str, learner_id: &str) -> String {
    format!("{test_id}:{learner_id}")
}

impl AssessmentResolver {
    /// 记录一次作答并返回写入的记录
    pub async fn submit_attempt(
        &self,
        learner_id: &str,
        test_id: &str,
        correct_answers: u32,
        now: DateTime<Utc>,
        cancel: Option<&CancellationToken>,
    ) -> Result<AttemptRecord> {
        self.ensure_online(cancel, SUBMIT_ACTION).await?;

        let remote = self.remote(cancel);
        let to_error = |e: RemoteError| ExamPortalError::from_remote(&e, SUBMIT_ACTION);

        let learner = match self.find_learner(remote, learner_id).await.map_err(to_error)? {
            Some(learner) if learner.active => learner,
            Some(_) => {
                return Err(ExamPortalError::learner_not_eligible(format!(
                    "学生 {learner_id} 已停用"
                )));
            }
            None => {
                return Err(ExamPortalError::not_found(format!(
                    "学生 {learner_id} 不存在"
                )));
            }
        };

        let document = remote
            .fetch_one(collections::TESTS, test_id)
            .await
            .map_err(to_error)?
            .ok_or_else(|| ExamPortalError::not_found(format!("测验 {test_id} 不存在")))?;
        let test = Test::try_from(&document)?;

        if !test.published {
            return Err(ExamPortalError::test_not_attemptable(format!(
                "测验 {test_id} 尚未发布"
            )));
        }

        let same_cohort = match (&test.class_id, &learner.cohort) {
            (Some(class_id), Some(cohort)) => class_id.id == cohort.id,
            _ => false,
        };
        let learner_ref = learner.reference();
        if !same_cohort || !resolve_eligibility(&test, &learner_ref) {
            return Err(ExamPortalError::learner_not_eligible(format!(
                "学生 {learner_id} 不在测验 {test_id} 的参与范围内"
            )));
        }

        let attempts = self.fetch_attempts(remote, &learner).await.map_err(to_error)?;
        if resolve_completion(&attempts, &test.id, &learner_ref) {
            return Err(ExamPortalError::attempt_already_recorded(format!(
                "学生 {learner_id} 已经完成测验 {test_id}"
            )));
        }

        match resolve_test_status(&test, now) {
            TestStatus::Upcoming => {
                return Err(ExamPortalError::test_not_attemptable(format!(
                    "测验 {test_id} 尚未开放"
                )));
            }
            TestStatus::Finished => {
                return Err(ExamPortalError::test_not_attemptable(format!(
                    "测验 {test_id} 已结束"
                )));
            }
            TestStatus::Ongoing | TestStatus::Published => {}
        }

        let percentage = score_percentage(correct_answers, test.question_count)?;
        let record = AttemptRecord {
            id: attempt_document_id(&test.id, &learner.id),
            test_id: DocRef::new(collections::TESTS, test.id.clone()),
            learner_id: learner_ref,
            percentage,
            grade: LetterGrade::from_percentage(percentage),
            created_at: Some(now),
        };

        match remote
            .insert(collections::ATTEMPTS, &record.id, &record.to_document_data())
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_already_exists() => {
                return Err(ExamPortalError::attempt_already_recorded(format!(
                    "学生 {learner_id} 已经完成测验 {test_id}"
                )));
            }
            Err(e) => return Err(to_error(e)),
        }

        info!(
            "Recorded attempt {} for learner {} on test {} ({:.1}%, {})",
            record.id, learner.id, test.id, record.percentage, record.grade
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{FlakyStore, YieldingStore};
    use super::*;
    use crate::resilience::RetryPolicy;
    use crate::storage::DocumentStore;
    use crate::storage::memory_storage::MemoryStorage;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn storage(now: DateTime<Utc>) -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.put("students", "s1", json!({"classId": "c1"}));
        storage.put("students", "s2", json!({"classId": "c2"}));
        storage.put("students", "gone", json!({"classId": "c1", "active": false}));
        storage.put(
            "tests",
            "open",
            json!({
                "name": "Algebra",
                "classId": {"$ref": "classes/c1"},
                "opensAt": (now - ChronoDuration::hours(1)).to_rfc3339(),
                "closesAt": (now + ChronoDuration::hours(1)).to_rfc3339(),
                "questionCount": 8,
                "published": true
            }),
        );
        storage.put(
            "tests",
            "later",
            json!({
                "classId": "c1",
                "opensAt": (now + ChronoDuration::hours(1)).to_rfc3339(),
                "questionCount": 8,
                "published": true
            }),
        );
        storage.put(
            "tests",
            "closed",
            json!({
                "classId": "c1",
                "closesAt": (now - ChronoDuration::minutes(1)).to_rfc3339(),
                "questionCount": 8,
                "published": true
            }),
        );
        storage.put(
            "tests",
            "draft",
            json!({"classId": "c1", "questionCount": 8, "published": false}),
        );
        storage.put(
            "tests",
            "empty",
            json!({"classId": "c1", "questionCount": 0, "published": true}),
        );
        storage.put(
            "tests",
            "invite-only",
            json!({
                "classId": "c1",
                "enrollment": "selective",
                "eligibleLearners": ["students/s9"],
                "questionCount": 8,
                "published": true
            }),
        );
        storage
    }

    fn resolver(storage: MemoryStorage) -> AssessmentResolver {
        AssessmentResolver::new(Arc::new(storage))
            .with_policy(RetryPolicy::new(3, Duration::from_millis(1)))
    }

    #[test]
    fn test_score_percentage() {
        assert_eq!(score_percentage(8, 8).unwrap(), 100.0);
        assert_eq!(score_percentage(6, 8).unwrap(), 75.0);
        assert!(matches!(
            score_percentage(1, 0),
            Err(ExamPortalError::TestNotAttemptable(_))
        ));
        assert!(matches!(
            score_percentage(9, 8),
            Err(ExamPortalError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_then_reject_second_attempt() {
        let now = Utc::now();
        let resolver = resolver(storage(now));

        let record = resolver
            .submit_attempt("s1", "open", 6, now, None)
            .await
            .unwrap();
        assert_eq!(record.percentage, 75.0);
        assert_eq!(record.grade, LetterGrade::C);
        assert_eq!(record.created_at, Some(now));

        let err = resolver
            .submit_attempt("s1", "open", 8, now, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExamPortalError::AttemptAlreadyRecorded(_)));

        // 作答后解析结果不能再次作答
        let views = resolver
            .resolve_tests_for_learner("s1", now, None)
            .await
            .unwrap();
        let open = views.iter().find(|v| v.test_id == "open").unwrap();
        assert!(open.completed);
        assert!(!open.can_attempt);
        assert_eq!(
            open.attempt.as_ref().map(|a| a.attempt_id.clone()),
            Some(record.id)
        );
    }

    #[tokio::test]
    async fn test_rejections() {
        let now = Utc::now();
        let resolver = resolver(storage(now));

        let cases = [
            ("s1", "later", "TestNotAttemptable"),
            ("s1", "closed", "TestNotAttemptable"),
            ("s1", "draft", "TestNotAttemptable"),
            ("s1", "empty", "TestNotAttemptable"),
            ("s1", "invite-only", "LearnerNotEligible"),
            ("s2", "open", "LearnerNotEligible"),
            ("gone", "open", "LearnerNotEligible"),
            ("nobody", "open", "NotFound"),
            ("s1", "missing", "NotFound"),
        ];

        for (learner, test, expected) in cases {
            let err = resolver
                .submit_attempt(learner, test, 1, now, None)
                .await
                .unwrap_err();
            let variant = format!("{err:?}");
            assert!(
                variant.starts_with(expected),
                "{learner}/{test}: expected {expected}, got {variant}"
            );
        }
    }

    #[tokio::test]
    async fn test_submit_survives_transient_failures() {
        let now = Utc::now();
        let store = Arc::new(FlakyStore::new(storage(now), 2, "unavailable"));
        let resolver = AssessmentResolver::new(store.clone())
            .with_policy(RetryPolicy::new(3, Duration::from_millis(1)));

        let record = resolver
            .submit_attempt("s1", "open", 8, now, None)
            .await
            .unwrap();
        assert_eq!(record.grade, LetterGrade::A);
        assert_eq!(store.inner.count("attempts"), 1);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_record_one_attempt() {
        let now = Utc::now();
        let store = Arc::new(YieldingStore::new(storage(now)));
        let resolver = AssessmentResolver::new(store.clone())
            .with_policy(RetryPolicy::new(3, Duration::from_millis(1)));

        let (first, second) = tokio::join!(
            resolver.submit_attempt("s1", "open", 8, now, None),
            resolver.submit_attempt("s1", "open", 2, now, None),
        );

        let (accepted, rejected) = match (first, second) {
            (Ok(record), Err(err)) | (Err(err), Ok(record)) => (record, err),
            (first, second) => panic!("expected exactly one success: {first:?} / {second:?}"),
        };
        assert!(matches!(rejected, ExamPortalError::AttemptAlreadyRecorded(_)));
        assert_eq!(accepted.id, attempt_document_id("open", "s1"));
        assert_eq!(store.inner.count("attempts"), 1);

        let stored = store
            .inner
            .fetch_one("attempts", &accepted.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.data["percentage"], json!(accepted.percentage));
    }

    #[tokio::test]
    async fn test_legacy_attempt_blocks_submission() {
        let now = Utc::now();
        let storage = storage(now);
        storage.put(
            "attempts",
            "legacy-uuid",
            json!({"testId": "open", "studentId": "s1", "percentage": 50.0}),
        );
        let resolver = resolver(storage);

        let err = resolver
            .submit_attempt("s1", "open", 8, now, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExamPortalError::AttemptAlreadyRecorded(_)));
    }
}
