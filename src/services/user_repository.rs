use crate::database::{MongoDB, USERS_COLLECTION};
use crate::models::{MatchCandidate, ProjectRequirements, Role, User};
use crate::utils::error::AppError;
use async_trait::async_trait;
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ReturnDocument;

/// Como um endpoint identifica o usuário: pelo token (id) ou pelo email
#[derive(Debug, Clone, PartialEq)]
pub enum UserSelector {
    Id(String),
    Email(String),
}

impl std::fmt::Display for UserSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserSelector::Id(id) => write!(f, "id {}", id),
            UserSelector::Email(email) => write!(f, "email {}", email),
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, selector: &UserSelector) -> Result<Option<User>, AppError>;

    /// Insere e devolve o usuário com `_id`. Email repetido → `Conflict`.
    /// Com `_id` definido pelo chamador o insert é idempotente: se esse `_id` já foi
    /// gravado com o mesmo email (retry após ack perdido), devolve o que está no banco.
    async fn insert(&self, user: User) -> Result<User, AppError>;

    /// `$set` parcial de `projectRequirements` + `$inc` da revisão.
    /// `None` quando nada casou (usuário inexistente ou revisão diferente da esperada).
    async fn update_requirements(
        &self,
        selector: &UserSelector,
        requirements: &ProjectRequirements,
        expected_revision: Option<i64>,
    ) -> Result<Option<User>, AppError>;

    /// Coders cujo stack tem interseção com `technologies`, na ordem do banco
    async fn find_coders_by_technologies(&self, technologies: &[String]) -> Result<Vec<MatchCandidate>, AppError>;
}

pub struct MongoUserRepository {
    db: MongoDB,
}

impl MongoUserRepository {
    pub fn new(db: MongoDB) -> Self {
        Self { db }
    }

}

/// `None` para ids que nem são ObjectId válidos (não há o que achar)
pub fn selector_filter(selector: &UserSelector) -> Option<Document> {
    match selector {
        UserSelector::Id(id) => ObjectId::parse_str(id).ok().map(|oid| doc! { "_id": oid }),
        UserSelector::Email(email) => Some(doc! { "email": email.as_str() }),
    }
}

/// Filtro do update: seletor + revisão esperada, quando houver
pub fn requirements_filter(selector: &UserSelector, expected_revision: Option<i64>) -> Option<Document> {
    let mut filter = selector_filter(selector)?;

    match expected_revision {
        // Nunca analisado: o campo ainda não existe
        Some(0) => {
            filter.insert(
                "$or",
                vec![
                    doc! { "projectRequirements.revision": { "$exists": false } },
                    doc! { "projectRequirements.revision": 0_i64 },
                ],
            );
        }
        Some(revision) => {
            filter.insert("projectRequirements.revision", revision);
        }
        None => {}
    }

    Some(filter)
}

/// Só as chaves de `projectRequirements` mudam; o resto do usuário fica intacto
pub fn requirements_update(requirements: &ProjectRequirements) -> Result<Document, AppError> {
    let mut set = doc! {
        "projectRequirements.description": requirements.description.as_str(),
        "projectRequirements.technologies": requirements.technologies.clone(),
        "projectRequirements.complexity": requirements.complexity.as_str(),
        "projectRequirements.expertise": requirements.expertise.as_str(),
        "projectRequirements.lastAnalyzed": to_bson(&requirements.last_analyzed)?,
        "updatedAt": to_bson(&chrono::Utc::now())?,
    };

    let mut update = doc! { "$inc": { "projectRequirements.revision": 1_i64 } };
    match &requirements.preferred_stack {
        Some(stack) => {
            set.insert("projectRequirements.preferredStack", stack.as_str());
        }
        None => {
            update.insert("$unset", doc! { "projectRequirements.preferredStack": "" });
        }
    }
    update.insert("$set", set);

    Ok(update)
}

pub fn coder_match_filter(technologies: &[String]) -> Document {
    doc! {
        "role": Role::Coder.as_str(),
        "developerStack.technologies": { "$in": technologies.to_vec() },
    }
}

/// Innovator nunca vê email nem senha do coder
pub fn coder_match_projection() -> Document {
    doc! { "_id": 0, "name": 1, "developerStack": 1, "country": 1 }
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn find(&self, selector: &UserSelector) -> Result<Option<User>, AppError> {
        let Some(filter) = selector_filter(selector) else {
            return Ok(None);
        };
        let collection = self.db.collection::<User>(USERS_COLLECTION);
        Ok(collection.find_one(filter).await?)
    }

    async fn insert(&self, mut user: User) -> Result<User, AppError> {
        let collection = self.db.collection::<User>(USERS_COLLECTION);
        let id = *user.id.get_or_insert_with(ObjectId::new);

        match collection.insert_one(&user).await {
            Ok(_) => Ok(user),
            Err(e) if is_duplicate_key(&e) => {
                // O primeiro insert pode ter sido aplicado antes da conexão cair
                match collection.find_one(doc! { "_id": id }).await? {
                    Some(existing) if existing.email == user.email => {
                        log::info!("ℹ️  User {} already inserted by a previous attempt", id);
                        Ok(existing)
                    }
                    _ => Err(AppError::Conflict("Email already registered".into())),
                }
            }
            Err(e) => Err(AppError::DatabaseError(format!("Failed to create user: {}", e))),
        }
    }

    async fn update_requirements(
        &self,
        selector: &UserSelector,
        requirements: &ProjectRequirements,
        expected_revision: Option<i64>,
    ) -> Result<Option<User>, AppError> {
        let Some(filter) = requirements_filter(selector, expected_revision) else {
            return Ok(None);
        };
        let update = requirements_update(requirements)?;

        let collection = self.db.collection::<User>(USERS_COLLECTION);
        let updated = collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;

        Ok(updated)
    }

    async fn find_coders_by_technologies(&self, technologies: &[String]) -> Result<Vec<MatchCandidate>, AppError> {
        let collection = self.db.collection::<MatchCandidate>(USERS_COLLECTION);

        let mut cursor = collection
            .find(coder_match_filter(technologies))
            .projection(coder_match_projection())
            .await?;

        let mut candidates = Vec::new();
        while let Some(result) = cursor.next().await {
            match result {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => log::warn!("⚠️  Skipping malformed coder document: {}", e),
            }
        }

        Ok(candidates)
    }
}
