use crate::utils::error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TechnologyCategory {
    pub name: String,
    pub technologies: Vec<String>,
}

/// Respostas usadas quando o classificador falha e a política é `fallback`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FallbackAnswers {
    pub technologies: Vec<String>,
    pub complexity: String,
    pub expertise: String,
}

/// Universo de labels do classificador. Carregado no startup (JSON em
/// `CATALOG_PATH` ou o default embutido) e injetado nos serviços.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub technology_categories: Vec<TechnologyCategory>,
    pub complexity_levels: Vec<String>,
    pub expertise_areas: Vec<String>,
    pub fallback: FallbackAnswers,
}

impl Catalog {
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        let catalog = match path {
            Some(path) => {
                log::info!("📚 Loading catalog from {}", path);
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| AppError::Internal(format!("Failed to read catalog {}: {}", path, e)))?;
                serde_json::from_str::<Catalog>(&raw)
                    .map_err(|e| AppError::Internal(format!("Failed to parse catalog {}: {}", path, e)))?
            }
            None => Catalog::default(),
        };

        catalog.validate()?;
        Ok(catalog)
    }

    /// Todas as categorias concatenadas, sem repetição
    pub fn all_technologies(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for category in &self.technology_categories {
            for tech in &category.technologies {
                if !labels.contains(tech) {
                    labels.push(tech.clone());
                }
            }
        }
        labels
    }

    pub fn is_complexity_level(&self, label: &str) -> bool {
        self.complexity_levels.iter().any(|l| l == label)
    }

    pub fn is_expertise_area(&self, label: &str) -> bool {
        self.expertise_areas.iter().any(|l| l == label)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.all_technologies().is_empty() {
            return Err(AppError::Internal("Catalog has no technology labels".into()));
        }
        if self.complexity_levels.is_empty() || self.expertise_areas.is_empty() {
            return Err(AppError::Internal("Catalog needs complexity and expertise labels".into()));
        }
        if !self.is_complexity_level(&self.fallback.complexity) {
            return Err(AppError::Internal(format!(
                "Fallback complexity '{}' is not a complexity level",
                self.fallback.complexity
            )));
        }
        if !self.is_expertise_area(&self.fallback.expertise) {
            return Err(AppError::Internal(format!(
                "Fallback expertise '{}' is not an expertise area",
                self.fallback.expertise
            )));
        }
        Ok(())
    }
}

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn category(name: &str, technologies: &[&str]) -> TechnologyCategory {
    TechnologyCategory {
        name: name.to_string(),
        technologies: labels(technologies),
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            technology_categories: vec![
                category("frontend", &["React", "Next.js", "Vue.js", "Angular", "Svelte", "Tailwind CSS"]),
                category("backend", &["Node.js", "Express", "Django", "Flask", "Spring Boot", "Ruby on Rails", "Go"]),
                category("database", &["MongoDB", "PostgreSQL", "MySQL", "Redis", "Firebase"]),
                category("mobile", &["React Native", "Flutter", "iOS", "Android", "Swift", "Kotlin"]),
                category("ai", &["TensorFlow", "PyTorch", "OpenAI API", "Hugging Face", "LangChain"]),
                category("cloud", &["AWS", "Google Cloud", "Azure", "Docker", "Kubernetes", "Vercel"]),
            ],
            complexity_levels: labels(&["Simple", "Moderate", "Complex", "Very Complex"]),
            expertise_areas: labels(&[
                "Technical Architecture",
                "Product Development",
                "AI/ML Development",
                "Mobile Development",
                "Web Development",
            ]),
            fallback: FallbackAnswers {
                technologies: labels(&["Next.js", "React", "Node.js", "MongoDB", "Express"]),
                complexity: "Moderate".to_string(),
                expertise: "Web Development".to_string(),
            },
        }
    }
}
