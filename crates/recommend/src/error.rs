use crate::classifier::ClassifierError;
use reflexion_graph::GraphError;
use reflexion_terms::TermsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecommendError>;

#[derive(Error, Debug)]
pub enum RecommendError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Term extraction error: {0}")]
    Terms(#[from] TermsError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Attraction value of {candidate} -> {cluster} is already set")]
    AttractionValueOverwrite { candidate: String, cluster: String },

    #[error("{count} architecture dependencies allow {source_cluster} -> {target_cluster}")]
    AmbiguousArchitectureDependency {
        source_cluster: String,
        target_cluster: String,
        count: usize,
    },

    #[error("Cannot read source region of {node}: {reason}")]
    NodeReader { node: String, reason: String },

    #[error("Oracle mapping has no information about {0}")]
    OracleIncomplete(String),

    #[error("Oracle mapping of {node} is ambiguous ({count} mappings)")]
    OracleAmbiguous { node: String, count: usize },

    #[error("{0} training data is not empty after resetting the mapping")]
    TrainingNotReset(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RecommendError {
    pub fn node_reader(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NodeReader {
            node: node.into(),
            reason: reason.into(),
        }
    }
}
