// ==================== REQUIREMENTS STORE ====================
// Persiste `projectRequirements` no usuário. Toda escrita passa pelo mesmo retry.

use crate::models::{ProjectAnalysis, ProjectRequirements, User};
use crate::services::analyzer_service::MAX_TECHNOLOGIES;
use crate::services::user_repository::{UserRepository, UserSelector};
use crate::utils::error::AppError;
use crate::utils::retry::{retry_async, RetryPolicy};
use chrono::Utc;

/// Monta o documento a persistir. `preferredStack` cai para a primeira tecnologia.
/// Tecnologias repetidas são descartadas (vale a primeira) e a lista é cortada no top 5.
pub fn build_requirements(
    description: &str,
    technologies: Vec<String>,
    complexity: &str,
    expertise: &str,
    preferred_stack: Option<String>,
) -> ProjectRequirements {
    let mut unique: Vec<String> = Vec::with_capacity(MAX_TECHNOLOGIES);
    for tech in technologies {
        if unique.len() == MAX_TECHNOLOGIES {
            break;
        }
        if !unique.contains(&tech) {
            unique.push(tech);
        }
    }
    let technologies = unique;

    let preferred_stack = preferred_stack
        .filter(|s| !s.trim().is_empty())
        .or_else(|| technologies.first().cloned());

    ProjectRequirements {
        description: description.trim().to_string(),
        technologies,
        complexity: complexity.to_string(),
        expertise: expertise.to_string(),
        preferred_stack,
        last_analyzed: Some(Utc::now()),
        revision: 0,
    }
}

pub fn requirements_from_analysis(
    description: &str,
    analysis: &ProjectAnalysis,
    preferred_stack: Option<String>,
) -> ProjectRequirements {
    build_requirements(
        description,
        analysis.technology_names(),
        &analysis.complexity,
        &analysis.expertise,
        preferred_stack,
    )
}

/// Sobrescreve os requisitos do usuário.
///
/// Com `expected_revision` a escrita é condicional: se outra escrita chegou antes,
/// retorna `Conflict` em vez de sobrescrever.
pub async fn save_requirements(
    users: &dyn UserRepository,
    retry: &RetryPolicy,
    selector: &UserSelector,
    requirements: &ProjectRequirements,
    expected_revision: Option<i64>,
) -> Result<User, AppError> {
    log::info!("💾 Saving project requirements for {}", selector);

    let updated = retry_async(retry, "Save project requirements", || {
        users.update_requirements(selector, requirements, expected_revision)
    })
    .await?;

    match updated {
        Some(user) => {
            log::info!(
                "✅ Requirements saved for {} (revision {})",
                selector,
                user.project_requirements.as_ref().map(|r| r.revision).unwrap_or_default()
            );
            Ok(user)
        }
        None => {
            if expected_revision.is_some() && users.find(selector).await?.is_some() {
                log::warn!("⚠️  Stale revision for {}", selector);
                return Err(AppError::Conflict(
                    "Project requirements were modified by another request".into(),
                ));
            }
            Err(AppError::NotFound("User not found".into()))
        }
    }
}
