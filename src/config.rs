use crate::services::classifier_service::UpstreamFailurePolicy;
use crate::utils::error::AppError;
use crate::utils::retry::{Backoff, RetryPolicy};
use std::time::Duration;

const DEFAULT_HF_API_URL: &str = "https://api-inference.huggingface.co/models";
const DEFAULT_HF_MODEL: &str = "facebook/bart-large-mnli";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub api_url: String,
    pub model: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
    pub on_failure: UpstreamFailurePolicy,
}

impl ClassifierConfig {
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.api_url.trim_end_matches('/'), self.model)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub cors_origins: Vec<String>,
    pub cookie_secure: bool,
    pub jwt: JwtConfig,
    pub classifier: ClassifierConfig,
    pub write_retry: RetryPolicy,
    pub catalog_path: Option<String>,
}

impl AppConfig {
    /// Lê a configuração das variáveis de ambiente (`.env` já carregado pelo main)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| AppError::Internal("DATABASE_URL must be set".into()))?;

        let port = parse_number::<u16>("PORT", &var("PORT", "3002"))?;
        let ttl_hours = parse_number::<i64>("JWT_TTL_HOURS", &var("JWT_TTL_HOURS", "24"))?;
        let timeout_secs = parse_number::<u64>("CLASSIFIER_TIMEOUT_SECS", &var("CLASSIFIER_TIMEOUT_SECS", "30"))?;
        let retry_attempts = parse_number::<u32>("WRITE_RETRY_ATTEMPTS", &var("WRITE_RETRY_ATTEMPTS", "3"))?;
        let retry_delay_ms = parse_number::<u64>("WRITE_RETRY_DELAY_MS", &var("WRITE_RETRY_DELAY_MS", "1000"))?;

        let on_failure = var("CLASSIFIER_ON_FAILURE", "fallback")
            .parse::<UpstreamFailurePolicy>()
            .map_err(AppError::Internal)?;
        let backoff = var("WRITE_RETRY_BACKOFF", "fixed")
            .parse::<Backoff>()
            .map_err(AppError::Internal)?;

        let cors_origins = var("CORS_ORIGINS", "http://localhost:3000,http://127.0.0.1:3000")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: var("HOST", "0.0.0.0"),
            port,
            database_url,
            cors_origins,
            cookie_secure: var("COOKIE_SECURE", "false").eq_ignore_ascii_case("true"),
            jwt: JwtConfig {
                secret: var("JWT_SECRET", "default-secret-change-me"),
                issuer: var("JWT_ISSUER", "creators-meet"),
                audience: var("JWT_AUDIENCE", "creators-meet-api"),
                ttl_hours,
            },
            classifier: ClassifierConfig {
                api_url: var("HF_API_URL", DEFAULT_HF_API_URL),
                model: var("HF_MODEL", DEFAULT_HF_MODEL),
                api_token: lookup("HF_API_TOKEN").filter(|t| !t.is_empty()),
                timeout: Duration::from_secs(timeout_secs),
                on_failure,
            },
            write_retry: RetryPolicy {
                max_attempts: retry_attempts.max(1),
                delay: Duration::from_millis(retry_delay_ms),
                backoff,
            },
            catalog_path: lookup("CATALOG_PATH").filter(|p| !p.is_empty()),
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| AppError::Internal(format!("{} must be a number, got '{}'", key, raw)))
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some("mongodb://localhost:27017/creators_meet_test".to_string()),
        "JWT_SECRET" => Some("test-secret".to_string()),
        "WRITE_RETRY_DELAY_MS" => Some("1".to_string()),
        _ => None,
    })
    .expect("test config")
}
