use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::models::attempts::requests::SubmitAttemptRequest;
use crate::services::AssessmentService;

// 懒加载的全局 ASSESSMENT_SERVICE 实例
static ASSESSMENT_SERVICE: Lazy<AssessmentService> = Lazy::new(AssessmentService::new_lazy);

// HTTP处理程序
pub async fn list_tests(req: HttpRequest, path: web::Path<String>) -> ActixResult<HttpResponse> {
    ASSESSMENT_SERVICE.list_tests(&req, path.into_inner()).await
}

pub async fn submit_attempt(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<SubmitAttemptRequest>,
) -> ActixResult<HttpResponse> {
    let (learner_id, test_id) = path.into_inner();
    ASSESSMENT_SERVICE
        .submit_attempt(&req, learner_id, test_id, body.into_inner())
        .await
}

// 配置路由
pub fn configure_assessment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/learners/{learner_id}/tests")
            // 学生可见的测验列表
            .service(web::resource("").route(web::get().to(list_tests)))
            .service(
                web::resource("/{test_id}/attempts").route(web::post().to(submit_attempt)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::AssessmentResolver;
    use crate::storage::memory_storage::MemoryStorage;
    use actix_web::{App, http::StatusCode, test};
    use chrono::{Duration, Utc};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn resolver() -> Arc<AssessmentResolver> {
        let now = Utc::now();
        let storage = MemoryStorage::new();
        storage.put("students", "s1", json!({"classId": "c1"}));
        storage.put(
            "tests",
            "t1",
            json!({
                "name": "Algebra",
                "classId": {"$ref": "classes/c1"},
                "opensAt": (now - Duration::hours(1)).to_rfc3339(),
                "closesAt": (now + Duration::hours(1)).to_rfc3339(),
                "questionCount": 4,
                "published": true
            }),
        );
        Arc::new(AssessmentResolver::new(Arc::new(storage)))
    }

    #[actix_web::test]
    async fn test_list_submit_and_reject() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(resolver()))
                .configure(configure_assessment_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/learners/s1/tests")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["code"], json!(0));
        assert_eq!(body["data"][0]["test_id"], json!("t1"));
        assert_eq!(body["data"][0]["status"], json!("ongoing"));
        assert_eq!(body["data"][0]["can_attempt"], json!(true));

        let req = test::TestRequest::post()
            .uri("/api/v1/learners/s1/tests/t1/attempts")
            .set_json(json!({"correct_answers": 3}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["percentage"], json!(75.0));
        assert_eq!(body["data"]["grade"], json!("C"));

        let req = test::TestRequest::post()
            .uri("/api/v1/learners/s1/tests/t1/attempts")
            .set_json(json!({"correct_answers": 4}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], json!(3002));
    }

    #[actix_web::test]
    async fn test_invalid_learner_id() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(resolver()))
                .configure(configure_assessment_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/learners/bad%20id/tests")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
