// ==================== ZERO-SHOT CLASSIFIER ====================
// Cliente do modelo hospedado (facebook/bart-large-mnli via inference API).
// A classificação é toda delegada: aqui só montamos o request e normalizamos a resposta.

use crate::config::ClassifierConfig;
use crate::utils::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// O que fazer quando o classificador falha
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamFailurePolicy {
    /// Usa as respostas de fallback do catálogo (degrada em vez de falhar)
    Fallback,
    /// Devolve o erro ao chamador
    Propagate,
}

impl std::str::FromStr for UpstreamFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fallback" => Ok(UpstreamFailurePolicy::Fallback),
            "propagate" => Ok(UpstreamFailurePolicy::Propagate),
            other => Err(format!(
                "Invalid classifier failure policy '{}'. Supported: fallback, propagate",
                other
            )),
        }
    }
}

/// `scores[i]` é a confiança de `labels[i]`. A ordem é a que a API decidir.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub labels: Vec<String>,
    pub scores: Vec<f64>,
}

impl ClassificationResult {
    /// Pares (label, score) ordenados por score decrescente.
    /// Ordenação estável: empates mantêm a ordem da API.
    pub fn ranked(&self) -> Vec<(String, f64)> {
        let mut pairs: Vec<(String, f64)> = self
            .labels
            .iter()
            .cloned()
            .zip(self.scores.iter().copied())
            .collect();
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        pairs
    }
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str, labels: &[String]) -> Result<ClassificationResult, AppError>;
}

#[derive(Debug, Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

#[derive(Debug, Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [String],
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// A inference API responde em dois formatos dependendo do backend
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZeroShotResponse {
    Columns {
        labels: Vec<String>,
        scores: Vec<f64>,
    },
    Pairs(Vec<LabelScore>),
}

pub fn parse_response(body: &str) -> Result<ClassificationResult, AppError> {
    let parsed: ZeroShotResponse = serde_json::from_str(body)
        .map_err(|e| AppError::Upstream(format!("Failed to parse classifier response: {}", e)))?;

    let result = match parsed {
        ZeroShotResponse::Columns { labels, scores } => {
            if labels.len() != scores.len() {
                return Err(AppError::Upstream(format!(
                    "Classifier returned {} labels but {} scores",
                    labels.len(),
                    scores.len()
                )));
            }
            ClassificationResult { labels, scores }
        }
        ZeroShotResponse::Pairs(pairs) => {
            let (labels, scores) = pairs.into_iter().map(|p| (p.label, p.score)).unzip();
            ClassificationResult { labels, scores }
        }
    };

    Ok(result)
}

pub struct HuggingFaceClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HuggingFaceClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            api_token: config.api_token.clone(),
        })
    }
}

#[async_trait]
impl Classifier for HuggingFaceClassifier {
    async fn classify(&self, text: &str, labels: &[String]) -> Result<ClassificationResult, AppError> {
        log::debug!("🧠 Classifying against {} candidate labels", labels.len());

        let request = ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters { candidate_labels: labels },
        };

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to reach classifier: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to read classifier response: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::Upstream(format!("Classifier API error: {} {}", status, body)));
        }

        parse_response(&body)
    }
}
