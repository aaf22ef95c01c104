use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;

use super::{AssessmentService, error_response, resolver_missing};
use crate::models::attempts::requests::SubmitAttemptRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate_document_id;

pub async fn submit_attempt(
    service: &AssessmentService,
    request: &HttpRequest,
    learner_id: String,
    test_id: String,
    body: SubmitAttemptRequest,
) -> ActixResult<HttpResponse> {
    for id in [&learner_id, &test_id] {
        if let Err(msg) = validate_document_id(id) {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                msg,
            )));
        }
    }

    let Some(resolver) = service.get_resolver(request) else {
        return Ok(resolver_missing());
    };

    match resolver
        .submit_attempt(&learner_id, &test_id, body.correct_answers, Utc::now(), None)
        .await
    {
        Ok(record) => Ok(HttpResponse::Created().json(ApiResponse::success(
            record,
            "Attempt recorded successfully",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
