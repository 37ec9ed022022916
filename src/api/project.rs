use crate::config::AppConfig;
use crate::middleware::auth::Claims;
use crate::models::{MatchCandidate, ProjectAnalysis, ProjectRequirements};
use crate::services::analyzer_service::ProjectAnalyzer;
use crate::services::user_repository::{UserRepository, UserSelector};
use crate::services::{match_service, requirements_service};
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub project_idea: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateByEmailRequest {
    pub email: Option<String>,
    pub project_description: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateByEmailResponse {
    pub success: bool,
    pub project_requirements: ProjectRequirements,
    pub analysis: ProjectAnalysis,
    pub potential_matches: Vec<MatchCandidate>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

async fn analyze_and_save(
    users: &dyn UserRepository,
    analyzer: &ProjectAnalyzer,
    config: &AppConfig,
    selector: &UserSelector,
    description: &str,
) -> Result<(ProjectAnalysis, ProjectRequirements), AppError> {
    let analysis = analyzer.analyze(description).await?;
    let requirements = requirements_service::requirements_from_analysis(description, &analysis, None);
    let user = requirements_service::save_requirements(users, &config.write_retry, selector, &requirements, None).await?;
    Ok((analysis, user.project_requirements.unwrap_or(requirements)))
}

#[utoipa::path(
    post,
    path = "/api/project/analyze",
    tag = "Project",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis result, also saved on the user", body = ProjectAnalysis),
        (status = 400, description = "Missing projectIdea"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn analyze(
    users: web::Data<dyn UserRepository>,
    analyzer: web::Data<ProjectAnalyzer>,
    config: web::Data<AppConfig>,
    user: web::ReqData<Claims>,
    request: web::Json<AnalyzeRequest>,
) -> HttpResponse {
    log::info!("🧠 POST /project/analyze - user: {}", user.sub);

    let Some(idea) = non_empty(&request.project_idea) else {
        return AppError::Validation("Project idea is required".into()).error_response();
    };

    let selector = UserSelector::Id(user.sub.clone());

    // Token válido de usuário removido: nada de chamar o classificador
    match users.find(&selector).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            log::warn!("❌ Project analysis for unknown user {}", user.sub);
            return AppError::NotFound("User not found".into()).error_response();
        }
        Err(e) => return e.error_response(),
    }

    match analyze_and_save(users.get_ref(), &analyzer, &config, &selector, idea).await {
        Ok((analysis, _)) => HttpResponse::Ok().json(analysis),
        Err(e) => {
            log::error!("❌ Project analysis failed for {}: {}", user.sub, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/project-requirements/update",
    tag = "Project",
    request_body = UpdateByEmailRequest,
    responses(
        (status = 200, description = "Requirements re-analyzed and saved", body = UpdateByEmailResponse),
        (status = 400, description = "Missing email or projectDescription"),
        (status = 404, description = "Email not found")
    )
)]
pub async fn update_by_email(
    users: web::Data<dyn UserRepository>,
    analyzer: web::Data<ProjectAnalyzer>,
    config: web::Data<AppConfig>,
    request: web::Json<UpdateByEmailRequest>,
) -> HttpResponse {
    let (Some(email), Some(description)) = (non_empty(&request.email), non_empty(&request.project_description)) else {
        return AppError::Validation("Email and project description are required".into()).error_response();
    };
    let email = email.to_lowercase();
    log::info!("📝 POST /project-requirements/update - email: {}", email);

    let selector = UserSelector::Email(email.clone());

    // Falha cedo antes de gastar três chamadas no classificador
    match users.find(&selector).await {
        Ok(Some(_)) => {}
        Ok(None) => return AppError::NotFound("User not found".into()).error_response(),
        Err(e) => return e.error_response(),
    }

    let result = async {
        let (analysis, requirements) =
            analyze_and_save(users.get_ref(), &analyzer, &config, &selector, description).await?;
        let potential_matches = match_service::find_matches(users.get_ref(), &requirements.technologies).await?;
        Ok::<_, AppError>(UpdateByEmailResponse {
            success: true,
            project_requirements: requirements,
            analysis,
            potential_matches,
        })
    }
    .await;

    match result {
        Ok(response) => {
            log::info!(
                "✅ Requirements updated for {} ({} potential matches)",
                email,
                response.potential_matches.len()
            );
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::error!("❌ Requirements update failed for {}: {}", email, e);
            e.error_response()
        }
    }
}
