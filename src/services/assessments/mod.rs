pub mod list;
pub mod submit;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode, web};
use std::sync::Arc;
use tracing::{error, warn};

use crate::errors::ExamPortalError;
use crate::models::attempts::requests::SubmitAttemptRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::resolver::AssessmentResolver;

pub struct AssessmentService {
    resolver: Option<Arc<AssessmentResolver>>,
}

impl AssessmentService {
    pub fn new_lazy() -> Self {
        Self { resolver: None }
    }

    pub fn with_resolver(resolver: Arc<AssessmentResolver>) -> Self {
        Self {
            resolver: Some(resolver),
        }
    }

    pub(crate) fn get_resolver(&self, request: &HttpRequest) -> Option<Arc<AssessmentResolver>> {
        if let Some(resolver) = &self.resolver {
            return Some(resolver.clone());
        }
        request
            .app_data::<web::Data<Arc<AssessmentResolver>>>()
            .map(|data| data.get_ref().clone())
    }

    // 获取学生可见的测验列表
    pub async fn list_tests(
        &self,
        request: &HttpRequest,
        learner_id: String,
    ) -> ActixResult<HttpResponse> {
        list::list_tests(self, request, learner_id).await
    }

    // 提交作答
    pub async fn submit_attempt(
        &self,
        request: &HttpRequest,
        learner_id: String,
        test_id: String,
        body: SubmitAttemptRequest,
    ) -> ActixResult<HttpResponse> {
        submit::submit_attempt(self, request, learner_id, test_id, body).await
    }
}

/// 解析器未注册时的响应
pub(crate) fn resolver_missing() -> HttpResponse {
    error!("AssessmentResolver not found in app data");
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::InternalServerError,
        "Assessment resolver is not configured",
    ))
}

/// 错误对应的 HTTP 状态码和业务错误码
pub(crate) fn status_for(err: &ExamPortalError) -> (StatusCode, ErrorCode) {
    match err {
        ExamPortalError::Validation(_) | ExamPortalError::PreconditionFailed(_) => {
            (StatusCode::BAD_REQUEST, ErrorCode::BadRequest)
        }
        ExamPortalError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized),
        ExamPortalError::PermissionDenied(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
        ExamPortalError::LearnerNotEligible(_) => {
            (StatusCode::FORBIDDEN, ErrorCode::LearnerNotEligible)
        }
        ExamPortalError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
        ExamPortalError::TestNotAttemptable(_) => {
            (StatusCode::CONFLICT, ErrorCode::TestNotAttemptable)
        }
        ExamPortalError::AttemptAlreadyRecorded(_) => {
            (StatusCode::CONFLICT, ErrorCode::AttemptAlreadyRecorded)
        }
        ExamPortalError::QuotaExceeded(_) => {
            (StatusCode::TOO_MANY_REQUESTS, ErrorCode::RateLimitExceeded)
        }
        ExamPortalError::ServiceUnavailable(_) | ExamPortalError::Aborted(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::ServiceUnavailable)
        }
        ExamPortalError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, ErrorCode::GatewayTimeout),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
        ),
    }
}

pub(crate) fn error_response(err: &ExamPortalError) -> HttpResponse {
    let (status, code) = status_for(err);
    if status.is_server_error() {
        warn!("{} {}", err.code(), err.format_simple());
    }
    HttpResponse::build(status).json(ApiResponse::error_empty(code, err.message()))
}
