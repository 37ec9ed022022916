use crate::models::Catalog;
use crate::services::analyzer_service::ProjectAnalyzer;
use actix_web::{web, HttpResponse};

#[utoipa::path(
    get,
    path = "/api/catalog",
    tag = "Catalog",
    responses(
        (status = 200, description = "Labels the classifier chooses from", body = Catalog)
    )
)]
pub async fn get_catalog(analyzer: web::Data<ProjectAnalyzer>) -> HttpResponse {
    HttpResponse::Ok().json(analyzer.catalog())
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{test_app, TestContext};
    use actix_web::{http::StatusCode, test};

    #[actix_rt::test]
    async fn test_catalog_is_public() {
        let ctx = TestContext::new();
        let app = test::init_service(test_app(&ctx)).await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/api/catalog").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert!(body["complexityLevels"].as_array().unwrap().iter().any(|l| l == "Complex"));
        assert_eq!(body["technologyCategories"][0]["name"], "frontend");
    }
}
