//! # Reflexion Recommend
//!
//! Mapping recommendations for reflexion analysis: which unmapped
//! implementation node should go into which architecture cluster.
//!
//! ## Attract functions
//!
//! - **Count** - weighted dependencies into the cluster, minus dependencies that
//!   would become divergent (allowed ones damped by `phi`)
//! - **Naive Bayes** - classifies source terms with one class per cluster,
//!   optionally with the cluster dependencies a candidate would create
//! - **ADC** - compares the terms of a new dependency with the terms collected
//!   for the architecture dependency that would allow it
//!
//! ## Architecture
//!
//! ```text
//! ReflexionGraph ── take_events() ──> Recommendations
//!                                        │
//!                                        ├──> AttractFunction (training data)
//!                                        │      └─ UpdateTracker (flagged clusters/candidates)
//!                                        │
//!                                        ├──> attraction_value(candidate, cluster)
//!                                        │      └─ probe_mapping + EdgeStateCache
//!                                        │
//!                                        └──> MaxFilter (pairs within delta of the max)
//!
//! Oracle (correct mapping) ──> Experiment ── automatic mappings ──> ExperimentResult
//! ```
//!
//! ## Example
//!
//! ```rust
//! use reflexion_graph::{GraphNode, ReflexionGraph};
//! use reflexion_recommend::{LookupNodeReader, RecommendationSettings, Recommendations};
//! use std::sync::Arc;
//!
//! let mut graph = ReflexionGraph::new();
//! let a = graph.add_node(GraphNode::architecture("A", "Cluster")).unwrap();
//! let b = graph.add_node(GraphNode::architecture("B", "Cluster")).unwrap();
//! graph.add_edge(a, b, "Source_Dependency").unwrap();
//! let x = graph.add_node(GraphNode::implementation("x", "Class")).unwrap();
//! let y = graph.add_node(GraphNode::implementation("y", "Class")).unwrap();
//! graph.add_edge(x, y, "Call").unwrap();
//! graph.add_to_mapping(y, b).unwrap();
//!
//! let settings = RecommendationSettings::for_count(1.0);
//! let recommendations =
//!     Recommendations::new(&mut graph, settings, Arc::new(LookupNodeReader::new(""))).unwrap();
//!
//! let best = recommendations.definite_recommendation().unwrap();
//! assert_eq!((best.candidate(), best.cluster()), ("x", "B"));
//! ```

mod attract;
mod classifier;
mod config;
mod edge_state_cache;
mod error;
mod experiment;
mod filter;
mod mapping_pair;
mod oracle;
mod reader;
mod recommendations;

pub use attract::{
    AdcAttract, AttractFunction, CountAttract, NaiveBayesAttract, NodeTypes, TermExtractor, UpdateTracker,
    IS_ANONYMOUS, IS_ARTIFICIAL,
};
pub use classifier::{ClassInformation, ClassifierError, NaiveBayesIncremental, TextClassifier, UNDERFLOW_OFFSET};
pub use config::{
    AdcConfig, AmbiguityPolicy, AttractConfig, CountConfig, ExperimentConfig, NaiveBayesConfig, RecommendationSettings,
    Similarity,
};
pub use edge_state_cache::EdgeStateCache;
pub use error::{RecommendError, Result};
pub use experiment::{CandidateStatistic, Experiment, ExperimentResult, ExperimentSummary, MappingStep};
pub use filter::MaxFilter;
pub use mapping_pair::{MappingPair, ATTRACTION_VALUE_DELTA};
pub use oracle::{Oracle, OracleMapping};
pub use reader::{
    FileRegionReader, LookupNodeReader, NodeReader, SOURCE_FILE, SOURCE_LINE, SOURCE_NAME, SOURCE_PATH,
    SOURCE_REGION_LENGTH,
};
pub use recommendations::Recommendations;
pub use reflexion_terms::{MergingType, TokenLanguage};
