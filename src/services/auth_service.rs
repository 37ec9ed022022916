use crate::config::JwtConfig;
use crate::models::{DeveloperStack, MatchCandidate, ProjectAnalysis, Role, User, UserInfo};
use crate::services::analyzer_service::ProjectAnalyzer;
use crate::services::match_service;
use crate::services::requirements_service;
use crate::services::user_repository::{UserRepository, UserSelector};
use crate::utils::error::AppError;
use crate::utils::retry::{retry_async, RetryPolicy};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "token";
const MIN_PASSWORD_LEN: usize = 6;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user _id (hex)
    pub email: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
    pub aud: String,
    pub iss: String,
}

// Request/Response structures
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupProject {
    pub description: Option<String>,
    pub preferred_stack: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub country: Option<String>,
    pub project_requirements: Option<SignupProject>,
    pub developer_stack: Option<DeveloperStack>,
}

/// O que cada papel traz no cadastro
#[derive(Debug, Clone)]
enum SignupProfile {
    Innovator { project: Option<SignupProject> },
    Coder { developer_stack: DeveloperStack },
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ProjectAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potential_matches: Option<Vec<MatchCandidate>>,
}

// Generate JWT token
pub fn generate_jwt(jwt: &JwtConfig, user: &User) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id_hex(),
        email: user.email.clone(),
        role: user.role,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(jwt.ttl_hours)).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        aud: jwt.audience.clone(),
        iss: jwt.issuer.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt.secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

// Verify JWT token
pub fn verify_token(jwt: &JwtConfig, token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[jwt.audience.as_str()]);

    let mut issuers = HashSet::new();
    issuers.insert(jwt.issuer.clone());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt.secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_profile(request: &SignupRequest, role: Role) -> SignupProfile {
    match role {
        Role::Innovator => SignupProfile::Innovator {
            project: request.project_requirements.clone(),
        },
        Role::Coder => SignupProfile::Coder {
            developer_stack: request.developer_stack.clone().unwrap_or_default(),
        },
    }
}

/// Cadastro único para os dois papéis. Innovator com descrição é analisado
/// na hora e já sai com requisitos e matches.
pub async fn signup(
    users: &dyn UserRepository,
    analyzer: &ProjectAnalyzer,
    retry: &RetryPolicy,
    jwt: &JwtConfig,
    request: &SignupRequest,
) -> Result<AuthResponse, AppError> {
    let name = present(&request.name);
    let email = present(&request.email).map(|e| e.to_lowercase());
    let password = request.password.clone().filter(|p| !p.is_empty());
    let role_raw = present(&request.role);

    let missing: Vec<&str> = [
        ("name", name.is_none()),
        ("email", email.is_none()),
        ("password", password.is_none()),
        ("role", role_raw.is_none()),
    ]
    .iter()
    .filter(|(_, absent)| *absent)
    .map(|(field, _)| *field)
    .collect();

    let (Some(name), Some(email), Some(password), Some(role_raw)) = (name, email, password, role_raw) else {
        return Err(AppError::Validation(format!("Missing required fields: {}", missing.join(", "))));
    };

    if !email.contains('@') {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let role = role_raw.parse::<Role>().map_err(AppError::Validation)?;
    let profile = parse_profile(request, role);

    if users.find(&UserSelector::Email(email.clone())).await?.is_some() {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let hashed_password = hash(&password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    let now = Utc::now();
    // `_id` fixo antes do retry: reenviar o mesmo insert não duplica o usuário
    let mut new_user = User {
        id: Some(ObjectId::new()),
        name,
        email: email.clone(),
        password: hashed_password,
        role,
        country: present(&request.country),
        project_requirements: None,
        developer_stack: None,
        created_at: now,
        updated_at: now,
    };

    let mut analysis = None;
    match profile {
        SignupProfile::Innovator { project } => {
            if let Some(project) = project {
                if let Some(description) = present(&project.description) {
                    let result = analyzer.analyze(&description).await?;
                    let mut requirements = requirements_service::requirements_from_analysis(
                        &description,
                        &result,
                        present(&project.preferred_stack),
                    );
                    requirements.revision = 1;
                    new_user.project_requirements = Some(requirements);
                    analysis = Some(result);
                }
            }
        }
        SignupProfile::Coder { developer_stack } => {
            new_user.developer_stack = Some(developer_stack);
        }
    }

    let created = retry_async(retry, "Create user", || users.insert(new_user.clone())).await?;

    let potential_matches = match &analysis {
        Some(result) => Some(match_service::find_matches(users, &result.technology_names()).await?),
        None => None,
    };

    let token = generate_jwt(jwt, &created)?;

    log::info!("✅ User registered successfully: {} (role: {})", email, role.as_str());

    Ok(AuthResponse {
        success: true,
        token,
        user: UserInfo::from(created),
        analysis,
        potential_matches,
    })
}

// User login
pub async fn login(
    users: &dyn UserRepository,
    jwt: &JwtConfig,
    request: &LoginRequest,
) -> Result<AuthResponse, AppError> {
    let (Some(email), Some(password)) = (present(&request.email), request.password.as_ref()) else {
        return Err(AppError::Validation("Email and password are required".into()));
    };

    let user = users
        .find(&UserSelector::Email(email.to_lowercase()))
        .await?
        .ok_or_else(|| AppError::Auth("Invalid credentials".into()))?;

    let valid = verify(password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))?;

    if !valid {
        return Err(AppError::Auth("Invalid credentials".into()));
    }

    let token = generate_jwt(jwt, &user)?;

    Ok(AuthResponse {
        success: true,
        token,
        user: UserInfo::from(user),
        analysis: None,
        potential_matches: None,
    })
}

// Get current user
pub async fn get_current_user(users: &dyn UserRepository, user_id: &str) -> Result<UserInfo, AppError> {
    users
        .find(&UserSelector::Id(user_id.to_string()))
        .await?
        .map(UserInfo::from)
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::models::Catalog;
    use crate::services::classifier_service::UpstreamFailurePolicy;
    use crate::services::testing::{InMemoryUserRepository, StubClassifier};
    use std::sync::Arc;

    fn analyzer() -> ProjectAnalyzer {
        let stub = StubClassifier::new()
            .with_score("React", 0.9)
            .with_score("Node.js", 0.8)
            .with_score("Complex", 0.7)
            .with_score("Web Development", 0.6);
        ProjectAnalyzer::new(Arc::new(stub), Arc::new(Catalog::default()), UpstreamFailurePolicy::Propagate)
    }

    fn request(role: &str) -> SignupRequest {
        SignupRequest {
            name: Some("Ana".into()),
            email: Some("Ana@Example.com".into()),
            password: Some("s3cret-pass".into()),
            role: Some(role.into()),
            country: Some("Portugal".into()),
            project_requirements: None,
            developer_stack: None,
        }
    }

    #[test]
    fn test_jwt_round_trip() {
        let config = test_config();
        let now = Utc::now();
        let user = User {
            id: Some(mongodb::bson::oid::ObjectId::new()),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: String::new(),
            role: Role::Innovator,
            country: None,
            project_requirements: None,
            developer_stack: None,
            created_at: now,
            updated_at: now,
        };

        let token = generate_jwt(&config.jwt, &user).unwrap();
        let claims = verify_token(&config.jwt, &token).unwrap();
        assert_eq!(claims.sub, user.id_hex());
        assert_eq!(claims.role, Role::Innovator);

        let other = JwtConfig {
            secret: "another-secret".into(),
            ..config.jwt.clone()
        };
        assert!(matches!(verify_token(&other, &token), Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn test_signup_innovator_with_project_runs_analysis() {
        let config = test_config();
        let repo = InMemoryUserRepository::new();
        repo.seed("Grace", "grace@example.com", Role::Coder, &["Node.js"]).await;

        let mut req = request("innovator");
        req.project_requirements = Some(SignupProject {
            description: Some("A booking platform for yoga studios".into()),
            preferred_stack: None,
        });

        let response = signup(&repo, &analyzer(), &config.write_retry, &config.jwt, &req)
            .await
            .unwrap();

        assert_eq!(response.user.email, "ana@example.com");
        let requirements = response.user.project_requirements.unwrap();
        assert_eq!(requirements.technologies[0], "React");
        assert_eq!(requirements.technologies[1], "Node.js");
        assert_eq!(requirements.complexity, "Complex");
        assert_eq!(requirements.preferred_stack.as_deref(), Some("React"));
        assert_eq!(response.potential_matches.unwrap().len(), 1);
        assert!(response.analysis.is_some());
    }

    #[tokio::test]
    async fn test_signup_coder_keeps_stack() {
        let config = test_config();
        let repo = InMemoryUserRepository::new();
        let mut req = request("coder");
        req.developer_stack = Some(DeveloperStack {
            name: "MERN".into(),
            technologies: vec!["MongoDB".into(), "React".into()],
        });

        let response = signup(&repo, &analyzer(), &config.write_retry, &config.jwt, &req)
            .await
            .unwrap();

        assert_eq!(response.user.role, Role::Coder);
        assert_eq!(response.user.developer_stack.unwrap().name, "MERN");
        assert!(response.analysis.is_none());
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicates_and_bad_input() {
        let config = test_config();
        let repo = InMemoryUserRepository::new();
        repo.seed("Ana", "ana@example.com", Role::Innovator, &[]).await;

        let duplicate = signup(&repo, &analyzer(), &config.write_retry, &config.jwt, &request("innovator")).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        let mut missing = request("coder");
        missing.password = None;
        match signup(&repo, &analyzer(), &config.write_retry, &config.jwt, &missing).await {
            Err(AppError::Validation(msg)) => assert!(msg.contains("password")),
            other => panic!("expected validation error, got {:?}", other.map(|r| r.user.email)),
        }

        let bad_role = signup(&repo, &analyzer(), &config.write_retry, &config.jwt, &request("admin")).await;
        assert!(matches!(bad_role, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_signup_retry_after_lost_ack_keeps_single_user() {
        let config = test_config();
        let repo = InMemoryUserRepository::new();
        repo.lose_next_insert_acks(1);

        let mut req = request("coder");
        req.developer_stack = Some(DeveloperStack {
            name: "Backend".into(),
            technologies: vec!["Go".into()],
        });

        let response = signup(&repo, &analyzer(), &config.write_retry, &config.jwt, &req)
            .await
            .unwrap();

        assert_eq!(response.user.email, "ana@example.com");
        assert_eq!(repo.write_attempts(), 2);
        assert_eq!(repo.user_count().await, 1);

        let stored = repo
            .find(&UserSelector::Email("ana@example.com".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id_hex(), response.user.id);
    }

    #[tokio::test]
    async fn test_login() {
        let config = test_config();
        let repo = InMemoryUserRepository::new();
        repo.seed("Grace", "grace@example.com", Role::Coder, &["Go"]).await;

        let ok = login(
            &repo,
            &config.jwt,
            &LoginRequest {
                email: Some("grace@example.com".into()),
                password: Some("password123".into()),
            },
        )
        .await
        .unwrap();
        assert!(verify_token(&config.jwt, &ok.token).is_ok());

        let wrong = login(
            &repo,
            &config.jwt,
            &LoginRequest {
                email: Some("grace@example.com".into()),
                password: Some("nope".into()),
            },
        )
        .await;
        assert!(matches!(wrong, Err(AppError::Auth(_))));
    }
}
