use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use reflexion_graph::ReflexionGraph;
use reflexion_recommend::{
    Experiment, FileRegionReader, LookupNodeReader, MappingPair, NodeReader, Oracle, RecommendationSettings,
    Recommendations,
};
use report::{print_json, AttractionReport, DumpReport, ExperimentReport, RecommendReport};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod report;

#[derive(Parser)]
#[command(name = "reflexion")]
#[command(about = "Mapping recommendations for reflexion analysis", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the pairs with the highest attraction
    Recommend(RecommendArgs),

    /// Print the attraction of a candidate to clusters
    Attraction(AttractionArgs),

    /// Print the training data of the attract function
    Dump(DumpArgs),

    /// Map automatically from a partial oracle mapping and rate the result
    Experiment(ExperimentArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Graph description (JSON)
    #[arg(long)]
    graph: PathBuf,

    /// Recommendation settings (TOML); count attraction if omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory `Source.Path`/`Source.File` of nodes are relative to
    #[arg(long)]
    source_root: Option<PathBuf>,
}

#[derive(Args)]
struct RecommendArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Only recommendations involving this candidate or cluster
    #[arg(long)]
    node: Option<String>,

    /// Apply the definite recommendation up to this many times
    #[arg(long, default_value_t = 0)]
    auto_map: usize,
}

#[derive(Args)]
struct AttractionArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Candidate node id
    #[arg(long)]
    candidate: String,

    /// Cluster node id (default: every cluster)
    #[arg(long)]
    cluster: Option<String>,
}

#[derive(Args)]
struct DumpArgs {
    #[command(flatten)]
    input: InputArgs,
}

#[derive(Args)]
struct ExperimentArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Graph with the correct mapping (JSON); the mapping of --graph if omitted
    #[arg(long)]
    oracle: Option<PathBuf>,

    /// Share of candidates mapped from the oracle up front
    #[arg(long)]
    percentage: Option<f64>,

    /// Root seed of the initial mappings
    #[arg(long)]
    seed: Option<u64>,

    /// Number of runs
    #[arg(long)]
    iterations: Option<usize>,

    /// Include per-candidate statistics of every run
    #[arg(long)]
    details: bool,
}

/// A loaded graph with recommendations trained on its mapping
struct Session {
    graph: ReflexionGraph,
    recommendations: Recommendations,
}

impl Session {
    fn load(input: &InputArgs) -> Result<Self> {
        let text = fs::read_to_string(&input.graph)
            .with_context(|| format!("Failed to read graph {}", input.graph.display()))?;
        let mut graph = ReflexionGraph::from_json(&text)
            .with_context(|| format!("Invalid graph description {}", input.graph.display()))?;

        let settings = match &input.config {
            Some(path) => RecommendationSettings::load(path)
                .with_context(|| format!("Failed to load settings {}", path.display()))?,
            None => RecommendationSettings::default(),
        };
        let reader: Arc<dyn NodeReader> = match &input.source_root {
            Some(root) => Arc::new(FileRegionReader::new(root.clone())),
            None => Arc::new(LookupNodeReader::new("")),
        };

        let recommendations =
            Recommendations::new(&mut graph, settings, reader).context("Failed to compute recommendations")?;
        log::info!(
            "Loaded {} nodes and {} edges from {}",
            graph.node_count(),
            graph.edge_count(),
            input.graph.display()
        );
        Ok(Self { graph, recommendations })
    }

    /// Map the definite recommendation onto its cluster; `None` if there is none
    fn apply_definite(&mut self) -> Result<Option<MappingPair>> {
        let Some(pair) = self.recommendations.definite_recommendation().cloned() else {
            return Ok(None);
        };
        let candidate = self.graph.require_node(pair.candidate())?;
        let cluster = self.graph.require_node(pair.cluster())?;
        self.graph.add_to_mapping(candidate, cluster)?;
        self.recommendations.update_recommendations(&mut self.graph)?;
        log::info!(
            "Mapped {} onto {} (attraction {:.3})",
            pair.candidate(),
            pair.cluster(),
            pair.attraction_value()
        );
        Ok(Some(pair))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Recommend(args) => run_recommend(args, cli.pretty),
        Commands::Attraction(args) => run_attraction(args, cli.pretty),
        Commands::Dump(args) => run_dump(args, cli.pretty),
        Commands::Experiment(args) => run_experiment(args, cli.pretty),
    }
}

fn run_recommend(args: RecommendArgs, pretty: bool) -> Result<()> {
    let mut session = Session::load(&args.input)?;

    let mut applied = Vec::new();
    for _ in 0..args.auto_map {
        match session.apply_definite()? {
            Some(pair) => applied.push(pair),
            None => break,
        }
    }

    let recommendations = &session.recommendations;
    let selected = match &args.node {
        Some(id) => {
            let Some(node) = session.graph.node_index(id) else {
                bail!("Unknown node {id}");
            };
            recommendations.recommendations_for(&session.graph, node)
        }
        None => recommendations.recommendations(),
    };

    let report = RecommendReport {
        attract: recommendations.attract_function().kind(),
        candidates: recommendations.candidates(&session.graph).len(),
        unmapped_candidates: recommendations.unmapped_candidates(&session.graph).len(),
        clusters: recommendations.clusters(&session.graph).len(),
        recommendations: selected.into_iter().cloned().collect(),
        applied,
    };
    print_json(&report, pretty)
}

fn run_attraction(args: AttractionArgs, pretty: bool) -> Result<()> {
    let mut session = Session::load(&args.input)?;
    let graph = &mut session.graph;
    let recommendations = &mut session.recommendations;

    let candidate = graph.require_node(&args.candidate)?;
    if graph.node(candidate).is_some_and(|node| !recommendations.is_candidate(node)) {
        log::warn!("{} is not a candidate, its attraction is always 0", args.candidate);
    }
    let clusters = match &args.cluster {
        Some(id) => vec![graph.require_node(id)?],
        None => recommendations.clusters(graph),
    };

    let mut values = Vec::with_capacity(clusters.len());
    for cluster in clusters {
        let value = recommendations
            .attraction_value(graph, candidate, cluster)
            .with_context(|| format!("Failed to compute attraction of {}", args.candidate))?;
        values.push(MappingPair::with_value(args.candidate.as_str(), graph.node_id(cluster), value));
    }

    let report = AttractionReport {
        attract: recommendations.attract_function().kind(),
        candidate: args.candidate,
        values,
    };
    print_json(&report, pretty)
}

fn run_dump(args: DumpArgs, pretty: bool) -> Result<()> {
    let session = Session::load(&args.input)?;
    let attract = session.recommendations.attract_function();

    let report = DumpReport {
        attract: attract.kind(),
        empty_training_data: attract.empty_training_data(),
        training_data: attract.dump_training_data(),
        mapping_pairs: session.recommendations.mapping_pairs().into_iter().cloned().collect(),
    };
    print_json(&report, pretty)
}

fn run_experiment(args: ExperimentArgs, pretty: bool) -> Result<()> {
    let oracle_path = args.oracle.as_ref().unwrap_or(&args.input.graph);
    let text = fs::read_to_string(oracle_path)
        .with_context(|| format!("Failed to read oracle {}", oracle_path.display()))?;
    let oracle =
        Oracle::from_json(&text).with_context(|| format!("Invalid oracle description {}", oracle_path.display()))?;

    let mut session = Session::load(&args.input)?;
    let mut config = session.recommendations.settings().experiment.clone();
    if let Some(percentage) = args.percentage {
        config.initial_mapping_percentage = percentage;
    }
    if let Some(seed) = args.seed {
        config.root_seed = seed;
    }
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }

    let mut summary = Experiment::new(&oracle, config)
        .run(&mut session.graph, &mut session.recommendations)
        .context("Experiment failed")?;
    if !args.details {
        for run in &mut summary.runs {
            run.statistics.clear();
        }
    }

    let report = ExperimentReport {
        attract: session.recommendations.attract_function().kind(),
        oracle: oracle_path.display().to_string(),
        runs: summary.runs,
        average: summary.average,
    };
    print_json(&report, pretty)
}
