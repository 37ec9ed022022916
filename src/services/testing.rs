// Dublês de teste: classificador sem rede e repositório em memória.

use crate::models::{MatchCandidate, ProjectRequirements, Role, User};
use crate::services::classifier_service::{ClassificationResult, Classifier};
use crate::services::user_repository::{UserRepository, UserSelector};
use crate::utils::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;

/// Responde com os scores configurados; labels desconhecidos valem 0.01.
/// Devolve na ordem dos candidatos, sem ordenar.
#[derive(Default)]
pub struct StubClassifier {
    scores: HashMap<String, f64>,
    calls: AtomicUsize,
}

impl StubClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(mut self, label: &str, score: f64) -> Self {
        self.scores.insert(label.to_string(), score);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify(&self, _text: &str, labels: &[String]) -> Result<ClassificationResult, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ClassificationResult {
            labels: labels.to_vec(),
            scores: labels
                .iter()
                .map(|l| self.scores.get(l).copied().unwrap_or(0.01))
                .collect(),
        })
    }
}

pub struct FailingClassifier;

#[async_trait]
impl Classifier for FailingClassifier {
    async fn classify(&self, _text: &str, _labels: &[String]) -> Result<ClassificationResult, AppError> {
        Err(AppError::Upstream("Classifier API error: 503 Service Unavailable".into()))
    }
}

/// Mesma semântica do repositório Mongo, em ordem de inserção.
/// `fail_next_writes` simula falhas transitórias antes da escrita;
/// `lose_next_insert_acks` grava o usuário e mesmo assim devolve erro.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
    failing_writes: Mutex<u32>,
    lost_insert_acks: Mutex<u32>,
    write_attempts: AtomicUsize,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_writes(&self, count: u32) {
        if let Ok(mut failing) = self.failing_writes.lock() {
            *failing = count;
        }
    }

    pub fn lose_next_insert_acks(&self, count: u32) {
        if let Ok(mut lost) = self.lost_insert_acks.lock() {
            *lost = count;
        }
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> Result<(), AppError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        let mut failing = self
            .failing_writes
            .lock()
            .map_err(|_| AppError::Internal("poisoned".into()))?;
        if *failing > 0 {
            *failing -= 1;
            return Err(AppError::DatabaseError("simulated write failure".into()));
        }
        Ok(())
    }

    pub async fn seed(&self, name: &str, email: &str, role: Role, technologies: &[&str]) -> User {
        let now = Utc::now();
        let user = User {
            id: Some(ObjectId::new()),
            name: name.to_string(),
            email: email.to_string(),
            password: bcrypt::hash("password123", 4).unwrap_or_default(),
            role,
            country: Some("Brazil".to_string()),
            project_requirements: None,
            developer_stack: match role {
                Role::Coder => Some(crate::models::DeveloperStack {
                    name: format!("{} stack", name),
                    technologies: technologies.iter().map(|t| t.to_string()).collect(),
                }),
                Role::Innovator => None,
            },
            created_at: now,
            updated_at: now,
        };
        self.users.write().await.push(user.clone());
        user
    }
}

fn matches_selector(user: &User, selector: &UserSelector) -> bool {
    match selector {
        UserSelector::Id(id) => user.id_hex() == *id,
        UserSelector::Email(email) => user.email == *email,
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find(&self, selector: &UserSelector) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| matches_selector(u, selector)).cloned())
    }

    async fn insert(&self, mut user: User) -> Result<User, AppError> {
        self.take_failure()?;
        let id = *user.id.get_or_insert_with(ObjectId::new);
        let mut users = self.users.write().await;

        if let Some(existing) = users.iter().find(|u| u.id == Some(id)) {
            if existing.email == user.email {
                return Ok(existing.clone());
            }
            return Err(AppError::Conflict("Email already registered".into()));
        }
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        users.push(user.clone());

        let mut lost = self
            .lost_insert_acks
            .lock()
            .map_err(|_| AppError::Internal("poisoned".into()))?;
        if *lost > 0 {
            *lost -= 1;
            return Err(AppError::DatabaseError("connection closed before acknowledgement".into()));
        }
        Ok(user)
    }

    async fn update_requirements(
        &self,
        selector: &UserSelector,
        requirements: &ProjectRequirements,
        expected_revision: Option<i64>,
    ) -> Result<Option<User>, AppError> {
        self.take_failure()?;
        let mut users = self.users.write().await;
        let Some(user) = users.iter_mut().find(|u| matches_selector(u, selector)) else {
            return Ok(None);
        };

        let current = user.project_requirements.as_ref().map(|r| r.revision).unwrap_or(0);
        if let Some(expected) = expected_revision {
            if expected != current {
                return Ok(None);
            }
        }

        user.project_requirements = Some(ProjectRequirements {
            revision: current + 1,
            ..requirements.clone()
        });
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn find_coders_by_technologies(&self, technologies: &[String]) -> Result<Vec<MatchCandidate>, AppError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|u| u.role == Role::Coder)
            .filter(|u| {
                u.developer_stack
                    .as_ref()
                    .map(|s| s.technologies.iter().any(|t| technologies.contains(t)))
                    .unwrap_or(false)
            })
            .map(MatchCandidate::from)
            .collect())
    }
}
