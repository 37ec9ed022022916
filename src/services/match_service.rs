use crate::models::MatchCandidate;
use crate::services::user_repository::UserRepository;
use crate::utils::error::AppError;

/// Coders cujo stack declarado tem ao menos uma das tecnologias recomendadas.
/// Sem ranking: interseção binária, ordem do banco.
pub async fn find_matches(
    users: &dyn UserRepository,
    technologies: &[String],
) -> Result<Vec<MatchCandidate>, AppError> {
    let mut wanted: Vec<String> = Vec::new();
    for tech in technologies {
        let tech = tech.trim();
        if !tech.is_empty() && !wanted.iter().any(|t| t == tech) {
            wanted.push(tech.to_string());
        }
    }

    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let matches = users.find_coders_by_technologies(&wanted).await?;
    log::info!("🤝 Found {} coder(s) for [{}]", matches.len(), wanted.join(", "));

    Ok(matches)
}
