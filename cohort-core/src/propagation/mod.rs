//! Community detection by iterative label propagation.
//!
//! Every node starts with a label of its own and repeatedly adopts the label
//! carrying the largest total edge weight among its neighbours. Three modes
//! are provided:
//!
//! - [`propagate_labels`]: nodes are visited in a freshly shuffled order each
//!   pass and updates are visible immediately; ties are broken at random.
//! - [`propagate_labels_async`]: every node reads the previous pass's labels
//!   and the whole pass is applied as a batch; ties go to the lowest label.
//! - [`propagate_seeded_labels`]: a subset of nodes carries fixed labels that
//!   vote but never change.
//!
//! A run stops after a pass without label changes or once
//! [`PropagationConfig::max_iterations`] passes have executed. All randomness
//! comes from a [`DeterministicRandom`] so identical inputs yield identical
//! outputs.

mod tally;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info, instrument, trace};

use crate::{graph::Graph, graph::IndexedGraph, random::DeterministicRandom, telemetry};

use self::tally::LabelTally;

const DEFAULT_MAX_ITERATIONS: usize = 100;
const DEFAULT_RANDOM_SEED: i64 = 42;

/// Tuning parameters shared by all propagation modes.
///
/// # Examples
/// ```
/// use cohort_core::PropagationConfig;
///
/// let config = PropagationConfig::default()
///     .with_max_iterations(20)
///     .with_random_seed(-3);
/// assert_eq!(config.max_iterations(), 20);
/// assert_eq!(config.random_seed(), -3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropagationConfig {
    max_iterations: usize,
    random_seed: i64,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            random_seed: DEFAULT_RANDOM_SEED,
        }
    }
}

impl PropagationConfig {
    /// Creates a configuration populated with defaults (100 passes, seed 42).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the pass budget.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Returns the pass budget.
    #[must_use]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Overrides the seed used when no random source is supplied.
    #[must_use]
    pub fn with_random_seed(mut self, random_seed: i64) -> Self {
        self.random_seed = random_seed;
        self
    }

    /// Returns the configured seed.
    #[must_use]
    pub fn random_seed(&self) -> i64 {
        self.random_seed
    }
}

/// Labels produced by a propagation run together with its termination state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropagationOutcome {
    labels: BTreeMap<String, usize>,
    iterations: usize,
    converged: bool,
}

impl PropagationOutcome {
    fn empty() -> Self {
        Self {
            labels: BTreeMap::new(),
            iterations: 0,
            converged: true,
        }
    }

    /// Returns the label of every node keyed by node identifier.
    #[must_use]
    pub fn labels(&self) -> &BTreeMap<String, usize> {
        &self.labels
    }

    /// Returns the label assigned to `id`.
    #[must_use]
    pub fn label(&self, id: &str) -> Option<usize> {
        self.labels.get(id).copied()
    }

    /// Returns the number of passes that executed.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Returns whether the run stopped on a pass without label changes.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Counts the distinct labels.
    #[must_use]
    pub fn community_count(&self) -> usize {
        self.labels.values().collect::<BTreeSet<_>>().len()
    }

    /// Groups node identifiers by label in ascending label order.
    #[must_use]
    pub fn communities(&self) -> BTreeMap<usize, BTreeSet<String>> {
        let mut groups: BTreeMap<usize, BTreeSet<String>> = BTreeMap::new();
        for (id, label) in &self.labels {
            groups.entry(*label).or_default().insert(id.clone());
        }
        groups
    }
}

#[derive(Clone, Copy, Debug)]
struct PassSummary {
    iterations: usize,
    converged: bool,
}

/// Runs synchronous label propagation seeded from `config`.
///
/// Labels are renumbered to `0..k` in order of first appearance over the
/// node iteration order.
///
/// # Examples
/// ```
/// use cohort_core::{Graph, PropagationConfig, propagate_labels};
///
/// let mut graph = Graph::new();
/// for (a, b) in [("a", "b"), ("b", "c"), ("a", "c"), ("x", "y"), ("y", "z"), ("x", "z")] {
///     graph.insert_undirected_edge(a, b, 1.0)?;
/// }
/// let outcome = propagate_labels(&graph, &PropagationConfig::default());
/// assert!(outcome.converged());
/// assert_eq!(outcome.community_count(), 2);
/// assert_eq!(outcome.label("a"), outcome.label("c"));
/// # Ok::<(), cohort_core::GraphError>(())
/// ```
#[must_use]
pub fn propagate_labels(graph: &Graph, config: &PropagationConfig) -> PropagationOutcome {
    let mut random = DeterministicRandom::new(config.random_seed());
    propagate_labels_with(graph, config, &mut random)
}

/// Runs synchronous label propagation drawing from a caller-owned source.
///
/// The seed in `config` is ignored; the state of `random` advances by every
/// shuffle and tie-break performed.
#[must_use]
#[instrument(
    name = "core.propagate_labels",
    skip(graph, config, random),
    fields(nodes = graph.node_count(), max_iterations = config.max_iterations()),
)]
pub fn propagate_labels_with(
    graph: &Graph,
    config: &PropagationConfig,
    random: &mut DeterministicRandom,
) -> PropagationOutcome {
    let indexed = graph.indexed();
    if indexed.is_empty() {
        return PropagationOutcome::empty();
    }

    let mut labels: Vec<usize> = (0..indexed.len()).collect();
    let movable: Vec<usize> = (0..indexed.len()).collect();
    let summary = run_randomised(
        &indexed,
        &mut labels,
        &movable,
        config.max_iterations(),
        random,
    );
    finish(&indexed, &renumber(&labels), summary)
}

/// Runs asynchronous label propagation.
///
/// Nodes are evaluated in iteration order against the previous pass's
/// labels, and ties resolve to the lowest label, so no randomness is used.
#[must_use]
#[instrument(
    name = "core.propagate_labels_async",
    skip(graph, config),
    fields(nodes = graph.node_count(), max_iterations = config.max_iterations()),
)]
pub fn propagate_labels_async(graph: &Graph, config: &PropagationConfig) -> PropagationOutcome {
    let indexed = graph.indexed();
    if indexed.is_empty() {
        return PropagationOutcome::empty();
    }

    let mut labels: Vec<usize> = (0..indexed.len()).collect();
    let mut next = labels.clone();
    let mut tally = LabelTally::default();
    let mut summary = PassSummary {
        iterations: 0,
        converged: false,
    };

    while summary.iterations < config.max_iterations() {
        summary.iterations += 1;
        let mut changes = 0;
        for (node, slot) in next.iter_mut().enumerate() {
            tally.collect(indexed.neighbours(node), &labels);
            *slot = tally.pick_lowest(labels[node]);
            if *slot != labels[node] {
                changes += 1;
            }
        }
        std::mem::swap(&mut labels, &mut next);
        telemetry::record_pass(changes);
        trace!(pass = summary.iterations, changes, "asynchronous pass completed");
        if changes == 0 {
            summary.converged = true;
            break;
        }
    }

    finish(&indexed, &renumber(&labels), summary)
}

/// Runs semi-supervised propagation seeded from `config`.
///
/// Nodes present in `seeds` keep their label for the whole run and are never
/// visited. Seeds naming unknown nodes are ignored. Remaining nodes receive
/// distinct starting labels just above the largest applied seed label.
/// Labels are returned verbatim, without renumbering.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use cohort_core::{Graph, PropagationConfig, propagate_seeded_labels};
///
/// let mut graph = Graph::new();
/// graph.insert_undirected_edge("a", "b", 5.0)?;
/// graph.insert_undirected_edge("b", "c", 1.0)?;
/// let seeds = BTreeMap::from([("a".to_owned(), 7)]);
/// let outcome = propagate_seeded_labels(&graph, &seeds, &PropagationConfig::default());
/// assert_eq!(outcome.label("a"), Some(7));
/// assert_eq!(outcome.label("b"), Some(7));
/// # Ok::<(), cohort_core::GraphError>(())
/// ```
#[must_use]
pub fn propagate_seeded_labels(
    graph: &Graph,
    seeds: &BTreeMap<String, usize>,
    config: &PropagationConfig,
) -> PropagationOutcome {
    let mut random = DeterministicRandom::new(config.random_seed());
    propagate_seeded_labels_with(graph, seeds, config, &mut random)
}

/// Runs semi-supervised propagation drawing from a caller-owned source.
#[must_use]
#[instrument(
    name = "core.propagate_seeded_labels",
    skip(graph, seeds, config, random),
    fields(
        nodes = graph.node_count(),
        seeds = seeds.len(),
        max_iterations = config.max_iterations()
    ),
)]
pub fn propagate_seeded_labels_with(
    graph: &Graph,
    seeds: &BTreeMap<String, usize>,
    config: &PropagationConfig,
    random: &mut DeterministicRandom,
) -> PropagationOutcome {
    let indexed = graph.indexed();
    if indexed.is_empty() {
        return PropagationOutcome::empty();
    }

    let mut labels = vec![0; indexed.len()];
    let mut anchored = vec![false; indexed.len()];
    let mut highest_seed = None;
    for (id, &label) in seeds {
        let Some(node) = indexed.position(id) else {
            debug!(node = %id, "ignoring seed for unknown node");
            continue;
        };
        labels[node] = label;
        anchored[node] = true;
        highest_seed = highest_seed.max(Some(label));
    }

    let first_free = highest_seed.map_or(0, |label: usize| label.saturating_add(1));
    let movable: Vec<usize> = (0..indexed.len()).filter(|&node| !anchored[node]).collect();
    for (offset, &node) in movable.iter().enumerate() {
        labels[node] = first_free.saturating_add(offset);
    }

    let summary = run_randomised(
        &indexed,
        &mut labels,
        &movable,
        config.max_iterations(),
        random,
    );
    finish(&indexed, &labels, summary)
}

/// Shared pass loop of the synchronous and semi-supervised modes.
fn run_randomised(
    graph: &IndexedGraph<'_>,
    labels: &mut [usize],
    movable: &[usize],
    max_iterations: usize,
    random: &mut DeterministicRandom,
) -> PassSummary {
    let mut order = movable.to_vec();
    let mut tally = LabelTally::default();
    let mut summary = PassSummary {
        iterations: 0,
        converged: false,
    };

    while summary.iterations < max_iterations {
        summary.iterations += 1;
        order.copy_from_slice(movable);
        random.shuffle(&mut order);

        let mut changes = 0;
        for &node in &order {
            let current = labels[node];
            tally.collect(graph.neighbours(node), labels);
            let chosen = tally.pick_random(current, random);
            if chosen != current {
                labels[node] = chosen;
                changes += 1;
            }
        }

        telemetry::record_pass(changes);
        trace!(pass = summary.iterations, changes, "propagation pass completed");
        if changes == 0 {
            summary.converged = true;
            break;
        }
    }

    summary
}

/// Maps labels onto `0..k` in order of first appearance.
fn renumber(labels: &[usize]) -> Vec<usize> {
    let mut dense: HashMap<usize, usize> = HashMap::new();
    labels
        .iter()
        .map(|&label| {
            let next = dense.len();
            *dense.entry(label).or_insert(next)
        })
        .collect()
}

fn finish(graph: &IndexedGraph<'_>, labels: &[usize], summary: PassSummary) -> PropagationOutcome {
    let labels: BTreeMap<String, usize> = graph
        .ids()
        .iter()
        .zip(labels)
        .map(|(id, label)| ((*id).to_owned(), *label))
        .collect();
    let outcome = PropagationOutcome {
        labels,
        iterations: summary.iterations,
        converged: summary.converged,
    };
    info!(
        communities = outcome.community_count(),
        iterations = outcome.iterations,
        converged = outcome.converged,
        "label propagation completed"
    );
    outcome
}

#[cfg(test)]
mod tests;
