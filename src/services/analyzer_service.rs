// ==================== PROJECT ANALYZER ====================
// Três classificações independentes da mesma descrição (tecnologias,
// complexidade, expertise), reduzidas a um resultado utilizável.

use crate::models::{Catalog, ProjectAnalysis, TechnologyScore};
use crate::services::classifier_service::{ClassificationResult, Classifier, UpstreamFailurePolicy};
use crate::utils::error::AppError;
use std::sync::Arc;

pub const MAX_TECHNOLOGIES: usize = 5;

pub struct ProjectAnalyzer {
    classifier: Arc<dyn Classifier>,
    catalog: Arc<Catalog>,
    on_failure: UpstreamFailurePolicy,
}

impl ProjectAnalyzer {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        catalog: Arc<Catalog>,
        on_failure: UpstreamFailurePolicy,
    ) -> Self {
        Self {
            classifier,
            catalog,
            on_failure,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn analyze(&self, description: &str) -> Result<ProjectAnalysis, AppError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::Validation("Project description is required".into()));
        }

        log::info!("🧠 Analyzing project description ({} chars)", description.len());

        let technology_labels = self.catalog.all_technologies();

        let (technologies, complexity, expertise) = tokio::try_join!(
            self.technologies(description, &technology_labels),
            self.single_label(
                description,
                &self.catalog.complexity_levels,
                &self.catalog.fallback.complexity,
                "complexity",
            ),
            self.single_label(
                description,
                &self.catalog.expertise_areas,
                &self.catalog.fallback.expertise,
                "expertise",
            ),
        )?;

        log::info!(
            "✅ Analysis done: {} technologies, complexity={}, expertise={}",
            technologies.len(),
            complexity,
            expertise
        );

        Ok(ProjectAnalysis {
            technologies,
            complexity,
            expertise,
        })
    }

    async fn technologies(&self, text: &str, labels: &[String]) -> Result<Vec<TechnologyScore>, AppError> {
        match self.classifier.classify(text, labels).await {
            Ok(result) => Ok(top_technologies(&result, labels, MAX_TECHNOLOGIES)),
            Err(e) => {
                self.degrade(e, "technologies")?;
                Ok(fallback_technologies(&self.catalog.fallback.technologies))
            }
        }
    }

    async fn single_label(
        &self,
        text: &str,
        labels: &[String],
        fallback: &str,
        dimension: &str,
    ) -> Result<String, AppError> {
        let outcome = self
            .classifier
            .classify(text, labels)
            .await
            .and_then(|result| {
                top_label(&result, labels).ok_or_else(|| {
                    AppError::Upstream(format!("Classifier returned no usable {} label", dimension))
                })
            });

        match outcome {
            Ok(label) => Ok(label),
            Err(e) => {
                self.degrade(e, dimension)?;
                Ok(fallback.to_string())
            }
        }
    }

    /// Aplica a política configurada: `Ok` = seguir com o fallback
    fn degrade(&self, error: AppError, dimension: &str) -> Result<(), AppError> {
        match self.on_failure {
            UpstreamFailurePolicy::Fallback => {
                log::warn!("⚠️  Classifier failed for {} - using fallback: {}", dimension, error);
                Ok(())
            }
            UpstreamFailurePolicy::Propagate => {
                log::error!("❌ Classifier failed for {}: {}", dimension, error);
                Err(error)
            }
        }
    }
}

/// Top-N por confiança. Labels fora do conjunto de candidatos e repetidos são descartados.
pub fn top_technologies(result: &ClassificationResult, candidates: &[String], limit: usize) -> Vec<TechnologyScore> {
    let mut picked: Vec<TechnologyScore> = Vec::with_capacity(limit);

    for (label, score) in result.ranked() {
        if picked.len() == limit {
            break;
        }
        if !candidates.contains(&label) || picked.iter().any(|t| t.name == label) {
            continue;
        }
        picked.push(TechnologyScore {
            name: label,
            confidence: score,
        });
    }

    picked
}

/// Maior score vence; empate fica com o primeiro na saída do classificador
pub fn top_label(result: &ClassificationResult, candidates: &[String]) -> Option<String> {
    result
        .ranked()
        .into_iter()
        .map(|(label, _)| label)
        .find(|label| candidates.contains(label))
}

fn fallback_technologies(names: &[String]) -> Vec<TechnologyScore> {
    names
        .iter()
        .take(MAX_TECHNOLOGIES)
        .enumerate()
        .map(|(i, name)| TechnologyScore {
            name: name.clone(),
            confidence: 0.9 - 0.1 * i as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{FailingClassifier, StubClassifier};

    fn analyzer(classifier: Arc<dyn Classifier>, on_failure: UpstreamFailurePolicy) -> ProjectAnalyzer {
        ProjectAnalyzer::new(classifier, Arc::new(Catalog::default()), on_failure)
    }

    fn result(pairs: &[(&str, f64)]) -> ClassificationResult {
        ClassificationResult {
            labels: pairs.iter().map(|(l, _)| l.to_string()).collect(),
            scores: pairs.iter().map(|(_, s)| *s).collect(),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_top_technologies_sorted_deduped_and_truncated() {
        let candidates = strings(&["A", "B", "C", "D", "E", "F", "G"]);
        let raw = result(&[
            ("C", 0.10),
            ("A", 0.40),
            ("B", 0.35),
            ("A", 0.05),
            ("Z", 0.99),
            ("D", 0.20),
            ("E", 0.15),
            ("F", 0.12),
            ("G", 0.01),
        ]);

        let top = top_technologies(&raw, &candidates, 5);
        let names: Vec<&str> = top.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "D", "E", "F"]);
        assert!(top.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn test_top_technologies_without_padding() {
        let candidates = strings(&["React", "Flutter"]);
        let top = top_technologies(&result(&[("Flutter", 0.6), ("React", 0.3)]), &candidates, 5);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Flutter");
    }

    #[test]
    fn test_top_label_prefers_highest_score_regardless_of_api_order() {
        let candidates = strings(&["Simple", "Moderate", "Complex", "Very Complex"]);
        let raw = result(&[("Simple", 0.2), ("Complex", 0.5), ("Moderate", 0.3)]);
        assert_eq!(top_label(&raw, &candidates), Some("Complex".to_string()));
        assert_eq!(top_label(&result(&[]), &candidates), None);
    }

    #[tokio::test]
    async fn test_mobile_description_ranks_mobile_labels_first() {
        let stub = StubClassifier::new()
            .with_score("React Native", 0.92)
            .with_score("Flutter", 0.88)
            .with_score("iOS", 0.81)
            .with_score("Android", 0.79)
            .with_score("Firebase", 0.55)
            .with_score("Node.js", 0.40)
            .with_score("Complex", 0.61)
            .with_score("Mobile Development", 0.83);

        let analysis = analyzer(Arc::new(stub), UpstreamFailurePolicy::Propagate)
            .analyze("A mobile app for tracking workouts with social features")
            .await
            .unwrap();

        assert_eq!(
            analysis.technology_names(),
            vec!["React Native", "Flutter", "iOS", "Android", "Firebase"]
        );
        assert_eq!(analysis.complexity, "Complex");
        assert_eq!(analysis.expertise, "Mobile Development");
    }

    #[tokio::test]
    async fn test_analysis_invariants_hold() {
        let stub = StubClassifier::new().with_score("Vue.js", 0.7).with_score("Go", 0.7);
        let analysis = analyzer(Arc::new(stub), UpstreamFailurePolicy::Propagate)
            .analyze("An internal dashboard for invoices")
            .await
            .unwrap();

        let catalog = Catalog::default();
        assert!(analysis.technologies.len() <= MAX_TECHNOLOGIES);
        assert!(analysis
            .technologies
            .windows(2)
            .all(|w| w[0].confidence >= w[1].confidence));
        let mut names = analysis.technology_names();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), analysis.technologies.len());
        assert!(catalog.is_complexity_level(&analysis.complexity));
        assert!(catalog.is_expertise_area(&analysis.expertise));
    }

    #[tokio::test]
    async fn test_issues_three_classifications() {
        let stub = Arc::new(StubClassifier::new());
        analyzer(stub.clone(), UpstreamFailurePolicy::Propagate)
            .analyze("A recipe sharing site")
            .await
            .unwrap();
        assert_eq!(stub.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_description_is_rejected_before_classifying() {
        let stub = Arc::new(StubClassifier::new());
        let result = analyzer(stub.clone(), UpstreamFailurePolicy::Fallback)
            .analyze("   ")
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_fallback_policy_degrades() {
        let analysis = analyzer(Arc::new(FailingClassifier), UpstreamFailurePolicy::Fallback)
            .analyze("Anything")
            .await
            .unwrap();

        assert_eq!(
            analysis.technology_names(),
            vec!["Next.js", "React", "Node.js", "MongoDB", "Express"]
        );
        assert!(analysis
            .technologies
            .windows(2)
            .all(|w| w[0].confidence > w[1].confidence));
        assert_eq!(analysis.complexity, "Moderate");
        assert_eq!(analysis.expertise, "Web Development");
    }

    #[tokio::test]
    async fn test_propagate_policy_surfaces_error() {
        let result = analyzer(Arc::new(FailingClassifier), UpstreamFailurePolicy::Propagate)
            .analyze("Anything")
            .await;
        assert!(matches!(result, Err(AppError::Upstream(_))));
    }
}
