//! Retry com backoff para escritas que podem falhar de forma transitória.
//!
//! Um único utilitário para todas as escritas de usuário.

use crate::utils::error::AppError;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed,
    Exponential,
}

impl std::str::FromStr for Backoff {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(Backoff::Fixed),
            "exponential" => Ok(Backoff::Exponential),
            other => Err(format!("Invalid backoff '{}'. Supported: fixed, exponential", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1` (attempt is 1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.delay.saturating_mul(factor)
            }
        }
    }
}

/// Executa `op` até `max_attempts` vezes. Erros não transitórios retornam na hora;
/// esgotadas as tentativas, o último erro é devolvido ao chamador.
pub async fn retry_async<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                log::warn!(
                    "🔁 {} failed (attempt {}/{}): {} - retrying in {:?}",
                    label, attempt, max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    log::error!("❌ {} failed after {} attempts: {}", label, attempt, e);
                }
                return Err(e);
            }
        }
    }
}
