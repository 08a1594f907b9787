use anyhow::Result;
use reflexion_recommend::{ExperimentResult, MappingPair};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RecommendReport {
    pub attract: &'static str,
    pub candidates: usize,
    pub unmapped_candidates: usize,
    pub clusters: usize,
    pub recommendations: Vec<MappingPair>,
    /// Definite recommendations applied with `--auto-map`, in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applied: Vec<MappingPair>,
}

#[derive(Debug, Serialize)]
pub struct AttractionReport {
    pub attract: &'static str,
    pub candidate: String,
    pub values: Vec<MappingPair>,
}

#[derive(Debug, Serialize)]
pub struct DumpReport {
    pub attract: &'static str,
    pub empty_training_data: bool,
    pub training_data: String,
    pub mapping_pairs: Vec<MappingPair>,
}

#[derive(Debug, Serialize)]
pub struct ExperimentReport {
    pub attract: &'static str,
    pub oracle: String,
    pub runs: Vec<ExperimentResult>,
    pub average: ExperimentResult,
}

pub fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
