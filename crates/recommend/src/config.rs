use crate::error::Result;
use reflexion_terms::{MergingType, TokenLanguage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Settings of a recommendation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationSettings {
    /// Node type of implementation nodes that can be recommended
    pub candidate_type: String,

    /// Node type of architecture nodes candidates can be mapped to
    pub cluster_type: String,

    /// Attract function and its parameters
    pub attract: AttractConfig,

    /// Weight per implementation edge type, unknown types weigh 1.0
    pub edge_weights: BTreeMap<String, f64>,

    /// Language of all source regions (detected from `Source.File` when unset)
    pub language: Option<TokenLanguage>,

    /// Automatic mapping runs against an oracle
    pub experiment: ExperimentConfig,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            candidate_type: "Class".to_string(),
            cluster_type: "Cluster".to_string(),
            attract: AttractConfig::Count(CountConfig::default()),
            edge_weights: BTreeMap::new(),
            language: None,
            experiment: ExperimentConfig::default(),
        }
    }
}

impl RecommendationSettings {
    /// Dependency counting with the given weight for allowed dependencies
    pub fn for_count(phi: f64) -> Self {
        Self {
            attract: AttractConfig::Count(CountConfig { phi }),
            ..Default::default()
        }
    }

    /// Naive-Bayes over the source terms of mapped nodes
    pub fn for_naive_bayes() -> Self {
        Self {
            attract: AttractConfig::NaiveBayes(NaiveBayesConfig::default()),
            ..Default::default()
        }
    }

    /// Term similarity along architecture dependencies
    pub fn for_adc(merging_type: MergingType) -> Self {
        Self {
            attract: AttractConfig::Adc(AdcConfig {
                merging_type,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn with_node_types(
        mut self,
        candidate_type: impl Into<String>,
        cluster_type: impl Into<String>,
    ) -> Self {
        self.candidate_type = candidate_type.into();
        self.cluster_type = cluster_type.into();
        self
    }

    pub fn with_edge_weight(mut self, edge_type: impl Into<String>, weight: f64) -> Self {
        self.edge_weights.insert(edge_type.into(), weight);
        self
    }

    /// Parse settings from TOML
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.candidate_type.is_empty() {
            return Err("candidate_type must not be empty".to_string());
        }
        if self.cluster_type.is_empty() {
            return Err("cluster_type must not be empty".to_string());
        }

        for (edge_type, weight) in &self.edge_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(format!(
                    "edge weight of {edge_type} must be a finite non-negative number, got {weight}"
                ));
            }
        }

        match &self.attract {
            AttractConfig::Count(count) => {
                if !(0.0..=1.0).contains(&count.phi) {
                    return Err(format!("phi ({}) must be within [0, 1]", count.phi));
                }
            }
            AttractConfig::NaiveBayes(nb) => {
                if !nb.alpha_smoothing.is_finite() || nb.alpha_smoothing <= 0.0 {
                    return Err(format!(
                        "alpha_smoothing ({}) must be > 0",
                        nb.alpha_smoothing
                    ));
                }
                if !nb.use_standard_terms && !nb.use_cda {
                    return Err(
                        "naive_bayes needs use_standard_terms or use_cda".to_string(),
                    );
                }
            }
            AttractConfig::Adc(_) | AttractConfig::None => {}
        }

        self.experiment.validate()
    }
}

/// Attract function selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttractConfig {
    /// Counts dependencies into and out of a cluster
    Count(CountConfig),

    /// Naive-Bayes classifier trained on mapped nodes
    NaiveBayes(NaiveBayesConfig),

    /// Architecture dependency terms compared with candidate dependencies
    Adc(AdcConfig),

    /// Every attraction is zero
    None,
}

impl AttractConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Count(_) => "count",
            Self::NaiveBayes(_) => "naive_bayes",
            Self::Adc(_) => "adc",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountConfig {
    /// Weight of dependencies the architecture allows
    pub phi: f64,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self { phi: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NaiveBayesConfig {
    /// Laplace smoothing parameter
    pub alpha_smoothing: f64,

    /// Train on the terms of the source region
    pub use_standard_terms: bool,

    /// Train on cluster dependency terms
    pub use_cda: bool,
}

impl Default for NaiveBayesConfig {
    fn default() -> Self {
        Self {
            alpha_smoothing: 1.0,
            use_standard_terms: true,
            use_cda: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdcConfig {
    /// How the terms of both ends of a dependency are combined
    pub merging_type: MergingType,

    pub similarity: Similarity,

    pub ambiguity: AmbiguityPolicy,

    /// Count every term once per document
    pub use_documents_as_set: bool,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            merging_type: MergingType::Union,
            similarity: Similarity::DotProduct,
            ambiguity: AmbiguityPolicy::FirstMatch,
            use_documents_as_set: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Share of all candidates mapped from the oracle before automatic mapping starts
    pub initial_mapping_percentage: f64,

    /// Seed of the initial mapping, or of the seed sequence when running several iterations
    pub root_seed: u64,

    pub iterations: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            initial_mapping_percentage: 0.5,
            root_seed: 0,
            iterations: 1,
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(0.0..=1.0).contains(&self.initial_mapping_percentage) {
            return Err(format!(
                "initial_mapping_percentage ({}) must be within [0, 1]",
                self.initial_mapping_percentage
            ));
        }
        if self.iterations == 0 {
            return Err("iterations must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Similarity of a dependency document and an architecture dependency document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    /// Sum of frequency products over shared terms
    #[default]
    DotProduct,

    /// Shared terms divided by the smaller vocabulary
    Overlap,
}

/// Handling of several architecture dependencies allowing the same dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// Use the nearest one
    #[default]
    FirstMatch,

    /// Fail with `AmbiguousArchitectureDependency`
    ErrorOnAmbiguity,
}
