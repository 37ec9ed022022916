use crate::middleware::auth::Claims;
use crate::models::MatchCandidate;
use crate::services::match_service;
use crate::services::user_repository::{UserRepository, UserSelector};
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse, ResponseError};
use serde::Serialize;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MatchesResponse {
    pub success: bool,
    pub technologies: Vec<String>,
    pub matches: Vec<MatchCandidate>,
}

async fn matches_for(users: &dyn UserRepository, user_id: &str) -> Result<MatchesResponse, AppError> {
    let user = users
        .find(&UserSelector::Id(user_id.to_string()))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let technologies = user.project_requirements.map(|r| r.technologies).unwrap_or_default();
    let matches = match_service::find_matches(users, &technologies).await?;

    Ok(MatchesResponse {
        success: true,
        technologies,
        matches,
    })
}

#[utoipa::path(
    get,
    path = "/api/matches",
    tag = "Matches",
    responses(
        (status = 200, description = "Coders matching the stored project technologies", body = MatchesResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_matches(users: web::Data<dyn UserRepository>, user: web::ReqData<Claims>) -> HttpResponse {
    log::info!("🤝 GET /matches - user: {}", user.sub);

    match matches_for(users.get_ref(), &user.sub).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Failed to load matches for {}: {}", user.sub, e);
            e.error_response()
        }
    }
}
