use crate::config::ExperimentConfig;
use crate::error::{RecommendError, Result};
use crate::mapping_pair::MappingPair;
use crate::oracle::Oracle;
use crate::recommendations::Recommendations;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reflexion_graph::ReflexionGraph;
use serde::Serialize;

/// When a candidate got its cluster during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStep {
    /// Part of the initial mapping
    Initial,
    /// Mapped by the n-th automatic mapping
    Automatic(usize),
    /// Still unmapped when no recommendation was left
    LeftOver,
}

/// Outcome for one candidate of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateStatistic {
    pub candidate: String,
    pub expected_cluster: Option<String>,
    pub mapped_cluster: Option<String>,
    pub hit: bool,
    pub step: MappingStep,
    /// Percentile ranks observed whenever the candidate was picked
    pub percentile_ranks: Vec<f64>,
}

impl CandidateStatistic {
    fn new(candidate: impl Into<String>, expected_cluster: Option<String>) -> Self {
        Self {
            candidate: candidate.into(),
            expected_cluster,
            mapped_cluster: None,
            hit: false,
            step: MappingStep::LeftOver,
            percentile_ranks: Vec::new(),
        }
    }

    pub fn average_percentile_rank(&self) -> Option<f64> {
        mean(&self.percentile_ranks)
    }
}

/// Rates of one run, or averaged over several runs.
///
/// Counts of an averaged result are sums over the runs; the `*_std` fields
/// are only set for averages of at least two runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExperimentResult {
    pub root_seed: u64,
    pub seed: u64,
    pub iterations: usize,
    pub candidates_total: usize,
    pub candidates_considered: usize,
    pub initially_mapped: usize,
    pub left_over: usize,
    pub total_hits: usize,
    pub total_fails: usize,
    pub mapping_rate: f64,
    pub hit_rate_all: f64,
    pub hit_rate_mapped: f64,
    pub precision: f64,
    pub recall: f64,
    pub f_score: f64,
    pub average_percentile_rank: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_rate_std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit_rate_all_std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit_rate_mapped_std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision_std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recall_std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_score_std: Option<f64>,
    /// Per candidate, in the order the candidates were settled
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub statistics: Vec<CandidateStatistic>,
}

impl ExperimentResult {
    /// Derive all counts and rates from the candidate statistics
    pub fn from_statistics(statistics: Vec<CandidateStatistic>) -> Self {
        let automatic = |s: &&CandidateStatistic| matches!(s.step, MappingStep::Automatic(_));

        let candidates_total = statistics.len();
        let initially_mapped = statistics.iter().filter(|s| s.step == MappingStep::Initial).count();
        let left_over = statistics.iter().filter(|s| s.step == MappingStep::LeftOver).count();
        let total_hits = statistics.iter().filter(automatic).filter(|s| s.hit).count();
        let total_fails = statistics.iter().filter(automatic).filter(|s| !s.hit).count();
        let candidates_considered = candidates_total - initially_mapped;
        let mapped = candidates_considered - left_over;

        let precision = ratio(total_hits, total_hits + total_fails);
        let recall = ratio(total_hits, total_hits + left_over);
        let f_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        let ranks: Vec<f64> = statistics
            .iter()
            .filter_map(CandidateStatistic::average_percentile_rank)
            .collect();

        Self {
            iterations: 1,
            candidates_total,
            candidates_considered,
            initially_mapped,
            left_over,
            total_hits,
            total_fails,
            mapping_rate: ratio(mapped, candidates_considered),
            hit_rate_all: ratio(total_hits, candidates_considered),
            hit_rate_mapped: ratio(total_hits, mapped),
            precision,
            recall,
            f_score,
            average_percentile_rank: mean(&ranks),
            statistics,
            ..Default::default()
        }
    }

    /// Sum the counts and average the rates of several runs
    pub fn average(results: &[ExperimentResult]) -> Self {
        let rates = |rate: fn(&ExperimentResult) -> f64| -> Vec<f64> { results.iter().map(rate).collect() };
        let sum = |count: fn(&ExperimentResult) -> usize| -> usize { results.iter().map(count).sum() };
        let ranks: Vec<f64> = results.iter().filter_map(|r| r.average_percentile_rank).collect();

        let mapping_rate = rates(|r| r.mapping_rate);
        let hit_rate_all = rates(|r| r.hit_rate_all);
        let hit_rate_mapped = rates(|r| r.hit_rate_mapped);
        let precision = rates(|r| r.precision);
        let recall = rates(|r| r.recall);
        let f_score = rates(|r| r.f_score);

        Self {
            root_seed: results.first().map_or(0, |r| r.root_seed),
            seed: results.first().map_or(0, |r| r.seed),
            iterations: results.len(),
            candidates_total: sum(|r| r.candidates_total),
            candidates_considered: sum(|r| r.candidates_considered),
            initially_mapped: sum(|r| r.initially_mapped),
            left_over: sum(|r| r.left_over),
            total_hits: sum(|r| r.total_hits),
            total_fails: sum(|r| r.total_fails),
            mapping_rate: mean(&mapping_rate).unwrap_or(0.0),
            hit_rate_all: mean(&hit_rate_all).unwrap_or(0.0),
            hit_rate_mapped: mean(&hit_rate_mapped).unwrap_or(0.0),
            precision: mean(&precision).unwrap_or(0.0),
            recall: mean(&recall).unwrap_or(0.0),
            f_score: mean(&f_score).unwrap_or(0.0),
            average_percentile_rank: mean(&ranks),
            mapping_rate_std: standard_deviation(&mapping_rate),
            hit_rate_all_std: standard_deviation(&hit_rate_all),
            hit_rate_mapped_std: standard_deviation(&hit_rate_mapped),
            precision_std: standard_deviation(&precision),
            recall_std: standard_deviation(&recall),
            f_score_std: standard_deviation(&f_score),
            statistics: Vec::new(),
        }
    }
}

/// All runs of an experiment and their average
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentSummary {
    pub runs: Vec<ExperimentResult>,
    pub average: ExperimentResult,
}

/// Replays automatic mapping against an oracle.
///
/// ```text
/// reset mapping ─> initial mapping (seeded, from the oracle)
///      ─> repeat: pick a random automatic mapping, map it, update
///      ─> statistics ─> reset mapping (training data must be empty again)
/// ```
pub struct Experiment<'a> {
    oracle: &'a Oracle,
    config: ExperimentConfig,
}

impl<'a> Experiment<'a> {
    pub fn new(oracle: &'a Oracle, config: ExperimentConfig) -> Self {
        Self { oracle, config }
    }

    /// Run all iterations; each one starts from an empty mapping and leaves it empty
    pub fn run(&self, graph: &mut ReflexionGraph, recommendations: &mut Recommendations) -> Result<ExperimentSummary> {
        self.config.validate().map_err(RecommendError::InvalidSettings)?;
        reset(graph, recommendations)?;

        let mut seeds = StdRng::seed_from_u64(self.config.root_seed);
        let mut seed = if self.config.iterations <= 1 {
            self.config.root_seed
        } else {
            u64::from(seeds.gen::<u32>())
        };

        let mut runs = Vec::with_capacity(self.config.iterations);
        for iteration in 0..self.config.iterations {
            log::info!("experiment run {iteration} with seed {seed}");
            let mut result = self.run_once(graph, recommendations, seed)?;
            result.root_seed = self.config.root_seed;
            runs.push(result);
            seed = u64::from(seeds.gen::<u32>());
        }

        let average = ExperimentResult::average(&runs);
        log::info!(
            "experiment finished: hit rate {:.3}, mapping rate {:.3} over {} runs",
            average.hit_rate_all,
            average.mapping_rate,
            runs.len()
        );
        Ok(ExperimentSummary { runs, average })
    }

    /// One run with `seed`, from the initial mapping until no automatic mapping is left
    pub fn run_once(
        &self,
        graph: &mut ReflexionGraph,
        recommendations: &mut Recommendations,
        seed: u64,
    ) -> Result<ExperimentResult> {
        let initial =
            self.oracle
                .initial_mapping(recommendations, graph, self.config.initial_mapping_percentage, seed)?;
        for (candidate, cluster) in &initial {
            let candidate = graph.require_node(candidate)?;
            let cluster = graph.require_node(cluster)?;
            graph.add_to_mapping(candidate, cluster)?;
        }
        recommendations.update_recommendations(graph)?;

        let mut finished = Vec::new();
        let mut active = Vec::new();
        for candidate in recommendations.candidates(graph) {
            let id = graph.node_id(candidate);
            let expected = self.oracle.expected_cluster(id).map(str::to_string);
            let mut statistic = CandidateStatistic::new(id, expected);
            if let Some(cluster) = graph.maps_to(candidate) {
                statistic.mapped_cluster = Some(graph.node_id(cluster).to_string());
                statistic.hit = self.oracle.is_hit(id, graph.node_id(cluster));
                statistic.step = MappingStep::Initial;
                finished.push(statistic);
            } else {
                active.push(statistic);
            }
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut step = 0;
        let mut pending: Vec<MappingPair> = recommendations.automatic_mappings().into_iter().cloned().collect();
        while !pending.is_empty() {
            let pairs: Vec<MappingPair> = recommendations.mapping_pairs().into_iter().cloned().collect();
            while !pending.is_empty() {
                let chosen = pending.swap_remove(rng.gen_range(0..pending.len()));
                pending.retain(|pair| pair.candidate() != chosen.candidate());

                let candidate = graph.require_node(chosen.candidate())?;
                if graph.maps_to(candidate).is_some() {
                    continue;
                }
                if let Some(statistic) = active.iter_mut().find(|s| s.candidate == chosen.candidate()) {
                    match self.oracle.percentile_rank(chosen.candidate(), &pairs) {
                        Ok(Some(rank)) => statistic.percentile_ranks.push(rank),
                        Ok(None) => {}
                        Err(e) => log::debug!("no percentile rank for {}: {e}", chosen.candidate()),
                    }
                }

                let cluster = graph.require_node(chosen.cluster())?;
                graph.add_to_mapping(candidate, cluster)?;
                log::debug!("step {step}: mapped {} onto {}", chosen.candidate(), chosen.cluster());
                self.settle(graph, &mut active, &mut finished, MappingStep::Automatic(step));
                step += 1;
            }
            recommendations.update_recommendations(graph)?;
            pending = recommendations.automatic_mappings().into_iter().cloned().collect();
        }
        finished.append(&mut active);

        let mut result = ExperimentResult::from_statistics(finished);
        result.seed = seed;
        reset(graph, recommendations)?;
        Ok(result)
    }

    /// Finish the statistics of all active candidates that are mapped now
    fn settle(
        &self,
        graph: &ReflexionGraph,
        active: &mut Vec<CandidateStatistic>,
        finished: &mut Vec<CandidateStatistic>,
        step: MappingStep,
    ) {
        let mut index = 0;
        while index < active.len() {
            let cluster = graph
                .node_index(&active[index].candidate)
                .and_then(|node| graph.maps_to(node));
            let Some(cluster) = cluster else {
                index += 1;
                continue;
            };
            let mut statistic = active.remove(index);
            let cluster = graph.node_id(cluster);
            statistic.hit = self.oracle.is_hit(&statistic.candidate, cluster);
            statistic.mapped_cluster = Some(cluster.to_string());
            statistic.step = step;
            finished.push(statistic);
        }
    }
}

/// Clear the mapping and check that no training data survived it
fn reset(graph: &mut ReflexionGraph, recommendations: &mut Recommendations) -> Result<()> {
    graph.reset_mapping()?;
    recommendations.update_recommendations(graph)?;
    if !recommendations.attract_function().empty_training_data() {
        return Err(RecommendError::TrainingNotReset(
            recommendations.attract_function().kind().to_string(),
        ));
    }
    Ok(())
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation, `None` below two values
fn standard_deviation(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}
