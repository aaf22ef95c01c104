use std::collections::HashSet;

use crate::models::DocRef;
use crate::models::attempts::entities::AttemptRecord;
use crate::models::catalog::entities::{EnrollmentMode, Test, TestStatus};

/// 学生是否在测验的参与范围内
///
/// 班级全体模式下总是为真（班级成员已经由目录查询过滤）；
/// 指定学生模式下按引用比较名单。
pub fn resolve_eligibility(test: &Test, learner: &DocRef) -> bool {
    match test.enrollment {
        EnrollmentMode::WholeCohort => true,
        EnrollmentMode::Selective => test
            .eligible_learners
            .iter()
            .any(|candidate| candidate.refers_to(learner)),
    }
}

/// 学生是否已经作答过该测验
pub fn resolve_completion(attempts: &[AttemptRecord], test_id: &str, learner: &DocRef) -> bool {
    completed_test_ids(attempts, learner).contains(test_id)
}

/// 学生作答过的测验 ID 集合
pub(crate) fn completed_test_ids<'a>(
    attempts: &'a [AttemptRecord],
    learner: &DocRef,
) -> HashSet<&'a str> {
    attempts
        .iter()
        .filter(|attempt| attempt.learner_id.refers_to(learner))
        .map(|attempt| attempt.test_id.id.as_str())
        .collect()
}

/// 现在能否进入作答
///
/// 除 Upcoming 和 Ongoing 外，没有开始时间的 Published 测验也视为已开放，
/// 可以作答；Finished 一律不可作答。
pub fn can_attempt(status: TestStatus, eligible: bool, completed: bool) -> bool {
    eligible
        && !completed
        && matches!(
            status,
            TestStatus::Upcoming | TestStatus::Ongoing | TestStatus::Published
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attempts::entities::LetterGrade;

    fn selective(learners: &[&str]) -> Test {
        Test {
            id: "t1".into(),
            name: "Quiz".into(),
            class_id: None,
            subject_id: None,
            opens_at: None,
            closes_at: None,
            enrollment: EnrollmentMode::Selective,
            eligible_learners: learners.iter().map(|id| DocRef::new("students", *id)).collect(),
            question_count: 5,
            published: true,
        }
    }

    fn attempt(test_id: &str, learner: DocRef) -> AttemptRecord {
        AttemptRecord {
            id: format!("{test_id}-attempt"),
            test_id: DocRef::bare(test_id),
            learner_id: learner,
            percentage: 50.0,
            grade: LetterGrade::F,
            created_at: None,
        }
    }

    #[test]
    fn test_whole_cohort_ignores_list() {
        let mut test = selective(&["a"]);
        test.enrollment = EnrollmentMode::WholeCohort;
        assert!(resolve_eligibility(&test, &DocRef::new("students", "z")));

        test.eligible_learners.clear();
        assert!(resolve_eligibility(&test, &DocRef::new("students", "z")));
    }

    #[test]
    fn test_selective_membership() {
        let test = selective(&["a", "b"]);
        assert!(resolve_eligibility(&test, &DocRef::new("students", "a")));
        assert!(resolve_eligibility(&test, &DocRef::bare("b")));
        assert!(!resolve_eligibility(&test, &DocRef::new("students", "c")));
        assert!(!resolve_eligibility(&test, &DocRef::new("teachers", "a")));

        // 增删无关学生不影响结果
        let widened = selective(&["a", "b", "d", "e"]);
        assert!(!resolve_eligibility(&widened, &DocRef::bare("c")));
        let narrowed = selective(&["a"]);
        assert!(resolve_eligibility(&narrowed, &DocRef::bare("a")));
    }

    #[test]
    fn test_completion() {
        let me = DocRef::new("students", "s1");
        let attempts = vec![
            attempt("t1", DocRef::bare("s1")),
            attempt("t2", DocRef::new("students", "s2")),
        ];
        assert!(resolve_completion(&attempts, "t1", &me));
        assert!(!resolve_completion(&attempts, "t2", &me));
        assert!(!resolve_completion(&[], "t1", &me));
    }

    #[test]
    fn test_can_attempt_matrix() {
        assert!(can_attempt(TestStatus::Ongoing, true, false));
        assert!(can_attempt(TestStatus::Upcoming, true, false));
        assert!(can_attempt(TestStatus::Published, true, false));
        assert!(!can_attempt(TestStatus::Finished, true, false));
        assert!(!can_attempt(TestStatus::Ongoing, true, true));
        assert!(!can_attempt(TestStatus::Ongoing, false, false));
    }
}
