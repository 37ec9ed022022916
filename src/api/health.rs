use crate::database::MongoDB;
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: String,
    pub timestamp: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(db: Option<web::Data<MongoDB>>) -> impl Responder {
    // Sem pool registrado (testes) o banco não entra na conta
    let database = match db {
        Some(db) => {
            if db.health_check().await {
                "connected"
            } else {
                "disconnected"
            }
        }
        None => "not configured",
    };

    let body = HealthResponse {
        status: if database == "disconnected" { "degraded" } else { "healthy" }.to_string(),
        service: "creators-meet".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    };

    if database == "disconnected" {
        log::warn!("⚠️  Health check: database unreachable");
        HttpResponse::ServiceUnavailable().json(body)
    } else {
        HttpResponse::Ok().json(body)
    }
}
