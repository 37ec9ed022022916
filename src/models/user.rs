use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Innovator,
    Coder,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Innovator => "innovator",
            Role::Coder => "coder",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "innovator" => Ok(Role::Innovator),
            "coder" => Ok(Role::Coder),
            other => Err(format!("Invalid role: {}. Supported: innovator, coder", other)),
        }
    }
}

/// Stack declarado por um coder. `technologies` é só chave de busca para o match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeveloperStack {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub technologies: Vec<String>,
}

/// Resultado da análise persistido no usuário (sobrescrito a cada análise)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequirements {
    pub description: String,
    /// Top technologies, highest confidence first
    #[serde(default)]
    pub technologies: Vec<String>,
    pub complexity: String,
    pub expertise: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_analyzed: Option<DateTime<Utc>>,
    /// Bumped on every write, compared on conditional updates
    #[serde(default)]
    pub revision: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    /// bcrypt hash
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_requirements: Option<ProjectRequirements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_stack: Option<DeveloperStack>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

/// Coder reduzido ao que o innovator pode ver: sem email, sem senha.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub name: String,
    #[serde(default)]
    pub developer_stack: Option<DeveloperStack>,
    #[serde(default)]
    pub country: Option<String>,
}

impl From<&User> for MatchCandidate {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            developer_stack: user.developer_stack.clone(),
            country: user.country.clone(),
        }
    }
}

/// Public view of a user (what `/me` and signup/login return)
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_requirements: Option<ProjectRequirements>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_stack: Option<DeveloperStack>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id_hex(),
            name: user.name,
            email: user.email,
            role: user.role,
            country: user.country,
            project_requirements: user.project_requirements,
            developer_stack: user.developer_stack,
        }
    }
}
