use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;

use super::{AssessmentService, error_response, resolver_missing};
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate_document_id;

pub async fn list_tests(
    service: &AssessmentService,
    request: &HttpRequest,
    learner_id: String,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = validate_document_id(&learner_id) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            msg,
        )));
    }

    let Some(resolver) = service.get_resolver(request) else {
        return Ok(resolver_missing());
    };

    match resolver
        .resolve_tests_for_learner(&learner_id, Utc::now(), None)
        .await
    {
        Ok(views) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            views,
            "Test list retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
