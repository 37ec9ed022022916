use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Creators Meet API",
        version = "1.0.0",
        description = "Connects innovators with project ideas to coders with matching stacks.\n\n**Authentication:** session cookie `token` or JWT Bearer token.\n\n**Features:**\n- Zero-shot project analysis (technologies, complexity, expertise)\n- Coder matching by technology overlap\n- Label catalog"
    ),
    paths(
        // Auth endpoints
        crate::api::auth::signup,
        crate::api::auth::login,
        crate::api::auth::get_me,

        // Health
        crate::api::health::health_check,

        // Project
        crate::api::project::analyze,
        crate::api::project::update_by_email,

        // User
        crate::api::user::update_requirements,

        // Matches & Catalog
        crate::api::matches::get_matches,
        crate::api::catalog::get_catalog,
    ),
    components(
        schemas(
            // Auth
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::SignupRequest,
            crate::services::auth_service::SignupProject,
            crate::services::auth_service::AuthResponse,
            crate::models::UserInfo,
            crate::models::Role,
            crate::models::DeveloperStack,

            // Health
            crate::api::health::HealthResponse,

            // Project
            crate::api::project::AnalyzeRequest,
            crate::api::project::UpdateByEmailRequest,
            crate::api::project::UpdateByEmailResponse,
            crate::models::ProjectAnalysis,
            crate::models::TechnologyScore,
            crate::models::ProjectRequirements,

            // User
            crate::api::user::UpdateRequirementsRequest,
            crate::api::user::UpdateRequirementsResponse,

            // Matches & Catalog
            crate::api::matches::MatchesResponse,
            crate::models::MatchCandidate,
            crate::models::Catalog,
            crate::models::TechnologyCategory,
            crate::models::FallbackAnswers,
        )
    ),
    tags(
        (name = "Auth", description = "Signup, login, logout and current user. Login sets an HTTP-only session cookie."),
        (name = "Health", description = "Health check with database status."),
        (name = "Project", description = "Project analysis through the zero-shot classifier. Results are stored on the user."),
        (name = "User", description = "Manually provided project requirements."),
        (name = "Matches", description = "Coders whose declared stack overlaps the project technologies."),
        (name = "Catalog", description = "Technology, complexity and expertise labels."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build()
                ),
            );
        }
    }
}
