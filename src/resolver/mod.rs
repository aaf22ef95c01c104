//! 测验生命周期与参与资格解析
//!
//! 给定学生和当前时间，读取该学生班级可见的已发布测验，判断时间状态、
//! 参与资格和是否已作答，生成可直接渲染的视图。所有远程读取都经过重试，
//! 任何读取在重试耗尽后失败都会让整次解析失败，不返回部分结果。

pub mod eligibility;
pub mod lookup;
pub mod status;
pub mod subjects;
pub mod submission;

pub use eligibility::{can_attempt, resolve_completion, resolve_eligibility};
use eligibility::completed_test_ids;
pub use lookup::LookupChain;
pub use status::{resolve_test_status, time_remaining_ms};
pub use subjects::SubjectNameCache;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::errors::{ExamPortalError, Result};
use crate::models::DocRef;
use crate::models::assessments::responses::{AttemptSummary, ResolvedTestView};
use crate::models::attempts::entities::AttemptRecord;
use crate::models::catalog::entities::Test;
use crate::models::learners::entities::Learner;
use crate::resilience::{
    Cancelled, ConnectivitySignal, RemoteError, RetryPolicy, Unmonitored, await_network, is_online,
};
use crate::storage::{DocumentStore, Filter, collections};
use lookup::RetryingStore;

const LIST_ACTION: &str = "加载测验列表";

pub struct AssessmentResolver {
    store: Arc<dyn DocumentStore>,
    policy: RetryPolicy,
    connectivity: Arc<dyn ConnectivitySignal>,
    network_timeout: Duration,
    subjects: SubjectNameCache,
}

impl AssessmentResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            policy: RetryPolicy::default(),
            connectivity: Arc::new(Unmonitored),
            network_timeout: Duration::from_secs(10),
            subjects: SubjectNameCache::new(1000, Duration::from_secs(300)),
        }
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        Self::new(store)
            .with_policy(RetryPolicy::from_config(&config.resilience))
            .with_network_timeout(Duration::from_millis(config.resilience.network_timeout_ms))
            .with_subject_cache(SubjectNameCache::from_config(&config.cache))
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_connectivity(mut self, connectivity: Arc<dyn ConnectivitySignal>) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn with_network_timeout(mut self, timeout: Duration) -> Self {
        self.network_timeout = timeout;
        self
    }

    pub fn with_subject_cache(mut self, cache: SubjectNameCache) -> Self {
        self.subjects = cache;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn remote<'a>(&'a self, cancel: Option<&'a CancellationToken>) -> RetryingStore<'a> {
        RetryingStore {
            store: self.store.as_ref(),
            policy: &self.policy,
            cancel,
        }
    }

    /// 离线时等待网络恢复，超时视为服务不可用
    async fn ensure_online(&self, cancel: Option<&CancellationToken>, action: &str) -> Result<()> {
        if is_online(self.connectivity.as_ref()) {
            return Ok(());
        }

        if await_network(self.connectivity.as_ref(), self.network_timeout, cancel).await {
            return Ok(());
        }

        let error = if cancel.is_some_and(|token| token.is_cancelled()) {
            RemoteError::from(Cancelled)
        } else {
            RemoteError::unavailable("network offline")
        };
        Err(ExamPortalError::from_remote(&error, action))
    }

    /// 按 ID 查找学生，找不到时按认证 uid 再查一次
    pub(crate) async fn find_learner(
        &self,
        remote: RetryingStore<'_>,
        learner_id: &str,
    ) -> std::result::Result<Option<Learner>, RemoteError> {
        if let Some(doc) = remote.fetch_one(collections::STUDENTS, learner_id).await? {
            return Ok(Some(Learner::from(&doc)));
        }

        let by_uid = LookupChain::new(collections::STUDENTS)
            .shape(vec![Filter::eq("uid", learner_id)])
            .first_non_empty(remote)
            .await?;

        Ok(by_uid.first().map(Learner::from))
    }

    /// 班级的已发布测验目录
    async fn fetch_catalog(
        &self,
        remote: RetryingStore<'_>,
        cohort: &DocRef,
    ) -> std::result::Result<Vec<Test>, RemoteError> {
        let class_ref = DocRef::new(collections::CLASSES, cohort.id.clone());
        let documents = LookupChain::new(collections::TESTS)
            .reference_or_id(
                "classId",
                class_ref.to_reference_value(),
                class_ref.to_id_value(),
                &[Filter::eq("published", true)],
            )
            .first_non_empty(remote)
            .await?;

        let tests = documents
            .iter()
            .filter_map(|doc| match Test::try_from(doc) {
                Ok(test) => Some(test),
                Err(e) => {
                    warn!("Skipping malformed test {}: {}", doc.id, e);
                    None
                }
            })
            .filter(|test| test.published)
            .collect();

        Ok(tests)
    }

    /// 学生的全部作答记录，两种 studentId 形式取并集
    async fn fetch_attempts(
        &self,
        remote: RetryingStore<'_>,
        learner: &Learner,
    ) -> std::result::Result<Vec<AttemptRecord>, RemoteError> {
        let reference = learner.reference();
        let documents = LookupChain::new(collections::ATTEMPTS)
            .reference_or_id(
                "studentId",
                reference.to_reference_value(),
                reference.to_id_value(),
                &[],
            )
            .union(remote)
            .await?;

        let attempts = documents
            .iter()
            .filter_map(|doc| match AttemptRecord::try_from(doc) {
                Ok(attempt) => Some(attempt),
                Err(e) => {
                    warn!("Skipping malformed attempt {}: {}", doc.id, e);
                    None
                }
            })
            .collect();

        Ok(attempts)
    }

    /// 解析学生当前可见的全部测验
    ///
    /// 找不到学生、学生已停用或没有班级时返回空列表。
    pub async fn resolve_tests_for_learner(
        &self,
        learner_id: &str,
        now: DateTime<Utc>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<ResolvedTestView>> {
        self.ensure_online(cancel, LIST_ACTION).await?;

        let remote = self.remote(cancel);
        let to_error = |e: RemoteError| ExamPortalError::from_remote(&e, LIST_ACTION);

        let Some(learner) = self.find_learner(remote, learner_id).await.map_err(to_error)? else {
            debug!("Learner {} not found", learner_id);
            return Ok(Vec::new());
        };
        if !learner.active {
            debug!("Learner {} is inactive", learner_id);
            return Ok(Vec::new());
        }
        let Some(cohort) = learner.cohort.clone() else {
            debug!("Learner {} has no cohort", learner_id);
            return Ok(Vec::new());
        };

        let catalog = self.fetch_catalog(remote, &cohort).await.map_err(to_error)?;
        if catalog.is_empty() {
            return Ok(Vec::new());
        }

        let attempts = self.fetch_attempts(remote, &learner).await.map_err(to_error)?;
        let learner_ref = learner.reference();

        let completed_ids = completed_test_ids(&attempts, &learner_ref);

        // 每个测验只展示最早的一条作答，没有时间的排在最后
        let mut attempt_by_test: HashMap<&str, &AttemptRecord> = HashMap::new();
        for attempt in attempts.iter().filter(|a| a.learner_id.refers_to(&learner_ref)) {
            attempt_by_test
                .entry(attempt.test_id.id.as_str())
                .and_modify(|existing| {
                    if submitted_earlier(attempt, existing) {
                        *existing = attempt;
                    }
                })
                .or_insert(attempt);
        }

        let visible: Vec<&Test> = catalog
            .iter()
            .filter(|test| resolve_eligibility(test, &learner_ref))
            .collect();

        let subject_names = self
            .subjects
            .resolve_names(
                remote,
                visible
                    .iter()
                    .filter_map(|test| test.subject_id.as_ref().map(|s| s.id.as_str())),
            )
            .await
            .map_err(to_error)?;

        let mut views: Vec<ResolvedTestView> = visible
            .into_iter()
            .map(|test| {
                let status = resolve_test_status(test, now);
                let attempt = attempt_by_test.get(test.id.as_str()).copied();
                let completed = completed_ids.contains(test.id.as_str());
                let subject_id = test.subject_id.as_ref().map(|s| s.id.clone());
                let subject_name = subject_id
                    .as_ref()
                    .and_then(|id| subject_names.get(id).cloned().flatten());

                ResolvedTestView {
                    test_id: test.id.clone(),
                    name: test.name.clone(),
                    class_id: test.class_id.as_ref().map(|c| c.id.clone()),
                    subject_id,
                    subject_name,
                    opens_at: test.opens_at,
                    closes_at: test.closes_at,
                    question_count: test.question_count,
                    enrollment: test.enrollment,
                    status,
                    eligible: true,
                    completed,
                    can_attempt: can_attempt(status, true, completed),
                    time_remaining_ms: time_remaining_ms(test, now),
                    attempt: attempt.map(|a| AttemptSummary {
                        attempt_id: a.id.clone(),
                        percentage: a.percentage,
                        grade: a.grade,
                        submitted_at: a.created_at,
                    }),
                }
            })
            .collect();

        views.sort_by(|a, b| {
            a.opens_at
                .cmp(&b.opens_at)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.test_id.cmp(&b.test_id))
        });

        debug!(
            "Resolved {} test(s) for learner {} ({} in catalog)",
            views.len(),
            learner_id,
            catalog.len()
        );

        Ok(views)
    }
}

fn submitted_earlier(candidate: &AttemptRecord, current: &AttemptRecord) -> bool {
    match (candidate.created_at, current.created_at) {
        (Some(a), Some(b)) => a < b,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::resilience::RemoteError;
    use crate::storage::memory_storage::MemoryStorage;
    use crate::storage::{Document, DocumentStore, Filter, StoreResult};

    /// 前 N 次读取失败的存储
    pub struct FlakyStore {
        pub inner: MemoryStorage,
        pub failures_left: AtomicU32,
        pub code: &'static str,
        pub calls: AtomicU32,
    }

    impl FlakyStore {
        pub fn new(inner: MemoryStorage, failures: u32, code: &'static str) -> Self {
            Self {
                inner,
                failures_left: AtomicU32::new(failures),
                code,
                calls: AtomicU32::new(0),
            }
        }

        fn trip(&self) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let tripped = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if tripped {
                Err(RemoteError::new(self.code, "injected failure"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn fetch_one(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
            self.trip()?;
            self.inner.fetch_one(collection, id).await
        }

        async fn fetch_many(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Document>> {
            self.trip()?;
            self.inner.fetch_many(collection, filters).await
        }

        async fn insert(
            &self,
            collection: &str,
            id: Option<&str>,
            data: Value,
        ) -> StoreResult<Document> {
            self.trip()?;
            self.inner.insert(collection, id, data).await
        }
    }

    /// 每次操作前让出执行权，使并发请求交错执行
    pub struct YieldingStore {
        pub inner: MemoryStorage,
    }

    impl YieldingStore {
        pub fn new(inner: MemoryStorage) -> Self {
            Self { inner }
        }
    }

    #[async_trait]
    impl DocumentStore for YieldingStore {
        async fn fetch_one(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
            tokio::task::yield_now().await;
            self.inner.fetch_one(collection, id).await
        }

        async fn fetch_many(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Document>> {
            tokio::task::yield_now().await;
            self.inner.fetch_many(collection, filters).await
        }

        async fn insert(
            &self,
            collection: &str,
            id: Option<&str>,
            data: Value,
        ) -> StoreResult<Document> {
            tokio::task::yield_now().await;
            self.inner.insert(collection, id, data).await
        }
    }
}
