//! Command implementations and argument parsing for the cohort CLI.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use cohort_core::{
    ClusterPartition, CohortError, Graph, GraphErrorCode, Hierarchy, HierarchyConfig, Linkage,
    PropagationConfig, PropagationOutcome, agglomerative_clustering, modularity_clustering,
    propagate_labels, propagate_labels_async, propagate_seeded_labels,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{Span, field, info, instrument};

const DEFAULT_MAX_ITERATIONS: usize = 100;
const DEFAULT_RANDOM_SEED: i64 = 42;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "cohort",
    about = "Detect communities and build cluster hierarchies over weighted graphs."
)]
pub struct Cli {
    /// Rendering used for the command summary on stdout.
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Assign community labels by label propagation.
    Propagate(PropagateCommand),
    /// Build an agglomerative hierarchy over hop distances.
    Hierarchy(HierarchyCommand),
    /// Build a hierarchy by greedy modularity merging.
    Modularity(ModularityCommand),
}

/// Summary renderings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Line-oriented text.
    #[default]
    Human,
    /// A single JSON document.
    Json,
}

/// Label propagation update schemes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PropagationMode {
    /// Nodes update in a shuffled order and see earlier updates at once.
    #[default]
    Sync,
    /// Nodes read the previous pass's labels; ties take the lowest label.
    Async,
}

/// Options accepted by the `propagate` command.
#[derive(Debug, Args, Clone)]
pub struct PropagateCommand {
    /// JSON adjacency object mapping node to `{neighbour: weight}`.
    pub graph: PathBuf,

    /// Update scheme for unseeded runs.
    #[arg(long, value_enum, default_value_t = PropagationMode::Sync)]
    pub mode: PropagationMode,

    /// Upper bound on full update passes.
    #[arg(long = "max-iterations", default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,

    /// Seed for shuffles and tie-breaks.
    #[arg(long, default_value_t = DEFAULT_RANDOM_SEED, allow_hyphen_values = true)]
    pub seed: i64,

    /// JSON object mapping node to a fixed label; enables seeded propagation.
    #[arg(long, conflicts_with = "mode")]
    pub seeds: Option<PathBuf>,
}

/// Options accepted by the `hierarchy` command.
#[derive(Debug, Args, Clone)]
pub struct HierarchyCommand {
    /// JSON adjacency object mapping node to `{neighbour: weight}`.
    pub graph: PathBuf,

    /// Rule combining pairwise hop distances between clusters.
    #[arg(long, default_value_t = Linkage::Single)]
    pub linkage: Linkage,

    /// Flat cut to report.
    #[command(flatten)]
    pub cut: CutArgs,
}

/// Options accepted by the `modularity` command.
#[derive(Debug, Args, Clone)]
pub struct ModularityCommand {
    /// JSON adjacency object mapping node to `{neighbour: weight}`.
    pub graph: PathBuf,

    /// Flat cut to report.
    #[command(flatten)]
    pub cut: CutArgs,
}

/// Flat cut selection; defaults to the root height.
#[derive(Debug, Args, Clone, Copy, Default)]
pub struct CutArgs {
    /// Cut every cluster whose height does not exceed this value.
    #[arg(long, conflicts_with = "clusters")]
    pub height: Option<usize>,

    /// Search for a cut with this many clusters.
    #[arg(long)]
    pub clusters: Option<usize>,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// An input file could not be read.
    #[error("failed to open `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// An input file did not hold the expected JSON shape.
    #[error("failed to parse `{path}`: {source}")]
    Json {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// The core library rejected the input.
    #[error(transparent)]
    Core(#[from] CohortError),
}

impl CliError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "CLI_IO",
            Self::Json { .. } => "CLI_INVALID_JSON",
            Self::Core(error) => error.code().as_str(),
        }
    }

    /// Graph validation code when the input graph was rejected.
    #[must_use]
    pub fn graph_code(&self) -> Option<GraphErrorCode> {
        match self {
            Self::Core(error) => error.graph_code(),
            Self::Io { .. } | Self::Json { .. } => None,
        }
    }
}

/// Outcome of a command, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ExecutionSummary {
    /// Result of `propagate`.
    Propagate(PropagationSummary),
    /// Result of `hierarchy`.
    Hierarchy(HierarchySummary),
    /// Result of `modularity`.
    Modularity(HierarchySummary),
}

/// Label propagation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropagationSummary {
    /// `synchronous`, `asynchronous` or `seeded`.
    pub mode: &'static str,
    /// Passes performed.
    pub iterations: usize,
    /// Whether the final pass changed no label.
    pub converged: bool,
    /// Number of distinct labels.
    pub communities: usize,
    /// Label per node.
    pub labels: BTreeMap<String, usize>,
}

impl From<(&'static str, PropagationOutcome)> for PropagationSummary {
    fn from((mode, outcome): (&'static str, PropagationOutcome)) -> Self {
        Self {
            mode,
            iterations: outcome.iterations(),
            converged: outcome.converged(),
            communities: outcome.community_count(),
            labels: outcome.labels().clone(),
        }
    }
}

/// Hierarchy result with one flat cut.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchySummary {
    /// Linkage name, or `modularity`.
    pub engine: String,
    /// Nodes in the dendrogram arena.
    pub dendrogram_nodes: usize,
    /// Root identifier, absent for an empty graph.
    pub root: Option<String>,
    /// Height of the root.
    pub root_height: usize,
    /// Cut that produced `clusters`.
    pub cut: CutSelection,
    /// Member sets of the cut.
    pub clusters: ClusterPartition,
}

/// Cut applied to a dendrogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CutSelection {
    /// Cut at a height.
    Height(usize),
    /// Cut searched for a cluster count.
    Clusters(usize),
}

impl CutSelection {
    fn resolve(args: CutArgs, hierarchy: &Hierarchy) -> Self {
        match (args.clusters, args.height) {
            (Some(k), _) => Self::Clusters(k),
            (None, Some(height)) => Self::Height(height),
            (None, None) => Self::Height(hierarchy.root_height()),
        }
    }

    fn apply(self, hierarchy: &Hierarchy) -> ClusterPartition {
        match self {
            Self::Height(height) => hierarchy
                .clusters_at(height)
                .cloned()
                .unwrap_or_else(|| hierarchy.dendrogram().cut_at_height(height)),
            Self::Clusters(k) => hierarchy.dendrogram().cut_for_k_clusters(k),
        }
    }
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when an input file cannot be read or parsed, or when
/// the graph fails validation.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use cohort_cli::cli::{Cli, Command, ExecutionSummary, OutputFormat, PropagateCommand,
/// #     PropagationMode, run_cli};
/// # use tempfile::NamedTempFile;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let file = NamedTempFile::new()?;
/// std::fs::write(file.path(), r#"{"a": {"b": 1.0}, "b": {"a": 1.0}}"#)?;
/// let cli = Cli {
///     format: OutputFormat::Human,
///     command: Command::Propagate(PropagateCommand {
///         graph: file.path().to_path_buf(),
///         mode: PropagationMode::Async,
///         max_iterations: 10,
///         seed: 42,
///         seeds: None,
///     }),
/// };
/// let ExecutionSummary::Propagate(summary) = run_cli(cli)? else {
///     panic!("propagate yields a propagation summary");
/// };
/// assert_eq!(summary.labels.len(), 2);
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty, format = ?cli.format),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    match cli.command {
        Command::Propagate(command) => {
            span.record("command", "propagate");
            run_propagate(command).map(ExecutionSummary::Propagate)
        }
        Command::Hierarchy(command) => {
            span.record("command", "hierarchy");
            run_hierarchy(command).map(ExecutionSummary::Hierarchy)
        }
        Command::Modularity(command) => {
            span.record("command", "modularity");
            run_modularity(command).map(ExecutionSummary::Modularity)
        }
    }
}

#[instrument(
    name = "cli.propagate",
    err,
    skip(command),
    fields(mode = field::Empty, seeded = command.seeds.is_some()),
)]
pub(super) fn run_propagate(command: PropagateCommand) -> Result<PropagationSummary, CliError> {
    let graph = load_graph(&command.graph)?;
    let config = PropagationConfig::new()
        .with_max_iterations(command.max_iterations)
        .with_random_seed(command.seed);

    let (mode, outcome) = match (&command.seeds, command.mode) {
        (Some(path), _) => {
            let seeds: BTreeMap<String, usize> = read_json(path)?;
            ("seeded", propagate_seeded_labels(&graph, &seeds, &config))
        }
        (None, PropagationMode::Sync) => ("synchronous", propagate_labels(&graph, &config)),
        (None, PropagationMode::Async) => ("asynchronous", propagate_labels_async(&graph, &config)),
    };
    Span::current().record("mode", mode);

    let summary = PropagationSummary::from((mode, outcome));
    info!(
        mode,
        communities = summary.communities,
        converged = summary.converged,
        "command completed"
    );
    Ok(summary)
}

#[instrument(
    name = "cli.hierarchy",
    err,
    skip(command),
    fields(linkage = %command.linkage),
)]
pub(super) fn run_hierarchy(command: HierarchyCommand) -> Result<HierarchySummary, CliError> {
    let graph = load_graph(&command.graph)?;
    let config = HierarchyConfig::new().with_linkage(command.linkage);
    let hierarchy = agglomerative_clustering(&graph, &config);
    Ok(summarise(command.linkage.to_string(), &hierarchy, command.cut))
}

#[instrument(name = "cli.modularity", err, skip(command))]
pub(super) fn run_modularity(command: ModularityCommand) -> Result<HierarchySummary, CliError> {
    let graph = load_graph(&command.graph)?;
    let hierarchy = modularity_clustering(&graph);
    Ok(summarise("modularity".to_owned(), &hierarchy, command.cut))
}

fn summarise(engine: String, hierarchy: &Hierarchy, cut: CutArgs) -> HierarchySummary {
    let selection = CutSelection::resolve(cut, hierarchy);
    let clusters = selection.apply(hierarchy);
    info!(
        engine = engine.as_str(),
        root_height = hierarchy.root_height(),
        clusters = clusters.len(),
        "command completed"
    );
    HierarchySummary {
        engine,
        dendrogram_nodes: hierarchy.dendrogram().len(),
        root: hierarchy.root().map(|root| root.id().to_owned()),
        root_height: hierarchy.root_height(),
        cut: selection,
        clusters,
    }
}

/// Reads a JSON adjacency object and validates it into a [`Graph`].
#[instrument(name = "cli.load_graph", err, fields(path = %path.display(), nodes = field::Empty))]
pub(super) fn load_graph(path: &Path) -> Result<Graph, CliError> {
    let adjacency: BTreeMap<String, BTreeMap<String, f64>> = read_json(path)?;
    let graph = Graph::try_from_adjacency(adjacency).map_err(CohortError::from)?;
    Span::current().record("nodes", graph.node_count());
    Ok(graph)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Renders `summary` to `writer`.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::collections::BTreeMap;
/// # use std::error::Error;
/// # use cohort_cli::cli::{ExecutionSummary, OutputFormat, PropagationSummary, render_summary};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = ExecutionSummary::Propagate(PropagationSummary {
///     mode: "asynchronous",
///     iterations: 2,
///     converged: true,
///     communities: 1,
///     labels: BTreeMap::from([("a".to_owned(), 0), ("b".to_owned(), 0)]),
/// });
/// let mut buffer = Vec::new();
/// render_summary(&summary, OutputFormat::Human, &mut buffer)?;
/// assert!(String::from_utf8(buffer)?.ends_with("a\t0\nb\t0\n"));
/// # Ok(())
/// # }
/// ```
pub fn render_summary(
    summary: &ExecutionSummary,
    format: OutputFormat,
    mut writer: impl Write,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut writer, summary)?;
            writeln!(writer)
        }
        OutputFormat::Human => match summary {
            ExecutionSummary::Propagate(propagation) => render_propagation(propagation, writer),
            ExecutionSummary::Hierarchy(hierarchy) | ExecutionSummary::Modularity(hierarchy) => {
                render_hierarchy(hierarchy, writer)
            }
        },
    }
}

fn render_propagation(summary: &PropagationSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "mode: {}", summary.mode)?;
    writeln!(writer, "iterations: {}", summary.iterations)?;
    writeln!(writer, "converged: {}", summary.converged)?;
    writeln!(writer, "communities: {}", summary.communities)?;
    for (node, label) in &summary.labels {
        writeln!(writer, "{node}\t{label}")?;
    }
    Ok(())
}

fn render_hierarchy(summary: &HierarchySummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "engine: {}", summary.engine)?;
    writeln!(writer, "dendrogram nodes: {}", summary.dendrogram_nodes)?;
    match &summary.root {
        Some(root) => writeln!(writer, "root: {root} (height {})", summary.root_height)?,
        None => writeln!(writer, "root: none")?,
    }
    match summary.cut {
        CutSelection::Height(height) => writeln!(writer, "cut: height {height}")?,
        CutSelection::Clusters(k) => writeln!(writer, "cut: {k} clusters requested")?,
    }
    writeln!(writer, "clusters: {}", summary.clusters.len())?;
    for (index, members) in summary.clusters.iter().enumerate() {
        let members: Vec<&str> = members.iter().map(String::as_str).collect();
        writeln!(writer, "{index}\t{}", members.join(" "))?;
    }
    Ok(())
}
