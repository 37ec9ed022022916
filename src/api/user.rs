use crate::config::AppConfig;
use crate::middleware::auth::Claims;
use crate::models::ProjectRequirements;
use crate::services::analyzer_service::ProjectAnalyzer;
use crate::services::requirements_service;
use crate::services::user_repository::{UserRepository, UserSelector};
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

/// Requisitos informados manualmente. Não passa pelo classificador.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequirementsRequest {
    pub description: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub complexity: Option<String>,
    pub expertise: Option<String>,
    pub preferred_stack: Option<String>,
    /// Revisão lida pelo cliente; se divergir do banco a escrita é recusada com 409
    pub expected_revision: Option<i64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequirementsResponse {
    pub success: bool,
    pub project_requirements: ProjectRequirements,
}

fn validate(request: &UpdateRequirementsRequest, analyzer: &ProjectAnalyzer) -> Result<ProjectRequirements, AppError> {
    let description = request.description.as_deref().map(str::trim).unwrap_or_default();
    let complexity = request.complexity.as_deref().map(str::trim).unwrap_or_default();
    let expertise = request.expertise.as_deref().map(str::trim).unwrap_or_default();
    let technologies: Vec<String> = request
        .technologies
        .iter()
        .flatten()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if description.is_empty() || complexity.is_empty() || expertise.is_empty() || technologies.is_empty() {
        return Err(AppError::Validation(
            "description, technologies, complexity and expertise are required".into(),
        ));
    }

    let catalog = analyzer.catalog();
    if !catalog.is_complexity_level(complexity) {
        return Err(AppError::Validation(format!(
            "Invalid complexity: {}. Supported: {}",
            complexity,
            catalog.complexity_levels.join(", ")
        )));
    }
    if !catalog.is_expertise_area(expertise) {
        return Err(AppError::Validation(format!(
            "Invalid expertise: {}. Supported: {}",
            expertise,
            catalog.expertise_areas.join(", ")
        )));
    }

    Ok(requirements_service::build_requirements(
        description,
        technologies,
        complexity,
        expertise,
        request.preferred_stack.clone(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/user/update-requirements",
    tag = "User",
    request_body = UpdateRequirementsRequest,
    responses(
        (status = 200, description = "Requirements saved", body = UpdateRequirementsResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 401, description = "Missing or invalid token"),
        (status = 409, description = "Stale expectedRevision")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_requirements(
    users: web::Data<dyn UserRepository>,
    analyzer: web::Data<ProjectAnalyzer>,
    config: web::Data<AppConfig>,
    user: web::ReqData<Claims>,
    request: web::Json<UpdateRequirementsRequest>,
) -> HttpResponse {
    log::info!("✏️  POST /user/update-requirements - user: {}", user.sub);

    let requirements = match validate(&request, &analyzer) {
        Ok(requirements) => requirements,
        Err(e) => {
            log::warn!("❌ Invalid requirements from {}: {}", user.sub, e);
            return e.error_response();
        }
    };

    let selector = UserSelector::Id(user.sub.clone());
    match requirements_service::save_requirements(
        users.get_ref(),
        &config.write_retry,
        &selector,
        &requirements,
        request.expected_revision,
    )
    .await
    {
        Ok(saved) => HttpResponse::Ok().json(UpdateRequirementsResponse {
            success: true,
            project_requirements: saved.project_requirements.unwrap_or(requirements),
        }),
        Err(e) => {
            log::error!("❌ Failed to update requirements for {}: {}", user.sub, e);
            e.error_response()
        }
    }
}
