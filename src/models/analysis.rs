use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TechnologyScore {
    pub name: String,
    pub confidence: f64,
}

/// Saída do analisador: top tecnologias + um label de complexidade + um de expertise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProjectAnalysis {
    pub technologies: Vec<TechnologyScore>,
    pub complexity: String,
    pub expertise: String,
}

impl ProjectAnalysis {
    pub fn technology_names(&self) -> Vec<String> {
        self.technologies.iter().map(|t| t.name.clone()).collect()
    }
}
