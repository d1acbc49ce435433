//! Partition quality scores.
//!
//! [`modularity`] rates a label assignment against the graph it came from.
//! [`partition_agreement`] compares two assignments with the Adjusted Rand
//! Index (ARI) and Normalised Mutual Information (NMI), which lets callers
//! check propagation results against dendrogram cuts or known ground truth.

use std::collections::{BTreeMap, HashMap};

use crate::{error::QualityError, graph::Graph, hierarchy::ClusterPartition};

/// Label assignment keyed by node identifier.
pub type LabelAssignment = BTreeMap<String, usize>;

/// ARI and NMI for two label assignments.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgreementScore {
    /// Adjusted Rand Index in `[-1, 1]`; `1` for identical groupings.
    pub ari: f64,
    /// Normalised Mutual Information in `[0, 1]`.
    pub nmi: f64,
    /// Number of nodes labelled on both sides.
    pub shared_nodes: usize,
}

/// Converts a partition into labels numbered by cluster position.
///
/// # Examples
/// ```
/// use std::collections::BTreeSet;
/// use cohort_core::labels_from_partition;
///
/// let partition = vec![
///     BTreeSet::from(["b".to_owned()]),
///     BTreeSet::from(["a".to_owned(), "c".to_owned()]),
/// ];
/// let labels = labels_from_partition(&partition);
/// assert_eq!(labels.get("a"), Some(&1));
/// assert_eq!(labels.get("b"), Some(&0));
/// ```
#[must_use]
pub fn labels_from_partition(partition: &ClusterPartition) -> LabelAssignment {
    partition
        .iter()
        .enumerate()
        .flat_map(|(label, members)| members.iter().map(move |id| (id.clone(), label)))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Community {
    Labelled(usize),
    Unlabelled(usize),
}

/// Weighted Newman modularity of `labels` over `graph`.
///
/// `Q = Σ_c [L_c / m − (d_c / 2m)²]` where `m` is half the total adjacency
/// weight, `L_c` the weight inside community `c` and `d_c` its weighted
/// degree. Nodes missing from `labels` count as singletons and adjacency
/// entries naming unknown nodes are ignored. Returns `0` for graphs without
/// positive edge weight.
///
/// # Examples
/// ```
/// use cohort_core::{Graph, PropagationConfig, modularity, propagate_labels};
///
/// let mut graph = Graph::new();
/// for (a, b) in [("a", "b"), ("b", "c"), ("a", "c"), ("x", "y"), ("y", "z"), ("x", "z")] {
///     graph.insert_undirected_edge(a, b, 1.0)?;
/// }
/// let outcome = propagate_labels(&graph, &PropagationConfig::default());
/// assert!((modularity(&graph, outcome.labels()) - 0.5).abs() < 1e-12);
/// # Ok::<(), cohort_core::GraphError>(())
/// ```
#[must_use]
pub fn modularity(graph: &Graph, labels: &LabelAssignment) -> f64 {
    let indexed = graph.indexed();
    let communities: Vec<Community> = indexed
        .ids()
        .iter()
        .enumerate()
        .map(|(node, id)| {
            labels
                .get(*id)
                .map_or(Community::Unlabelled(node), |&label| Community::Labelled(label))
        })
        .collect();

    let mut total_weight = 0.0;
    let mut inside: HashMap<Community, f64> = HashMap::new();
    let mut degree: HashMap<Community, f64> = HashMap::new();
    for (node, community) in communities.iter().enumerate() {
        for &(neighbour, weight) in indexed.neighbours(node) {
            total_weight += weight;
            *degree.entry(*community).or_insert(0.0) += weight;
            if communities[neighbour] == *community {
                *inside.entry(*community).or_insert(0.0) += weight;
            }
        }
    }
    if total_weight <= 0.0 {
        return 0.0;
    }

    let m = total_weight / 2.0;
    degree
        .iter()
        .map(|(community, &degree)| {
            let internal = inside.get(community).copied().unwrap_or(0.0) / 2.0;
            internal / m - (degree / total_weight).powi(2)
        })
        .sum()
}

type Counts = HashMap<usize, usize>;

/// Joint label counts over the nodes two assignments share.
#[derive(Debug, Default)]
struct Contingency {
    items: usize,
    left: Counts,
    right: Counts,
    joint: HashMap<(usize, usize), usize>,
}

impl Contingency {
    fn build(left: &LabelAssignment, right: &LabelAssignment) -> Self {
        let mut table = Self::default();
        for (id, &left_label) in left {
            let Some(&right_label) = right.get(id) else {
                continue;
            };
            table.items += 1;
            *table.left.entry(left_label).or_insert(0) += 1;
            *table.right.entry(right_label).or_insert(0) += 1;
            *table.joint.entry((left_label, right_label)).or_insert(0) += 1;
        }
        table
    }

    fn adjusted_rand_index(&self) -> f64 {
        let total = pairs(self.items);
        if total == 0.0 {
            return 1.0;
        }
        let joint: f64 = self.joint.values().copied().map(pairs).sum();
        let left: f64 = self.left.values().copied().map(pairs).sum();
        let right: f64 = self.right.values().copied().map(pairs).sum();

        let expected = left * right / total;
        let ceiling = (left + right) / 2.0;
        if ceiling == expected {
            1.0
        } else {
            (joint - expected) / (ceiling - expected)
        }
    }

    fn normalised_mutual_information(&self) -> f64 {
        let n = self.items as f64;
        let left_entropy = entropy(&self.left, n);
        let right_entropy = entropy(&self.right, n);
        match (left_entropy == 0.0, right_entropy == 0.0) {
            (true, true) => 1.0,
            (true, false) | (false, true) => 0.0,
            (false, false) => {
                let mut information = 0.0;
                for (&(a, b), &count) in &self.joint {
                    let (Some(&left), Some(&right)) = (self.left.get(&a), self.right.get(&b)) else {
                        continue;
                    };
                    let count = count as f64;
                    information += (count / n) * (count * n / (left as f64 * right as f64)).ln();
                }
                information / (left_entropy * right_entropy).sqrt()
            }
        }
    }
}

fn pairs(count: usize) -> f64 {
    let count = count as f64;
    count * (count - 1.0) / 2.0
}

fn entropy(counts: &Counts, n: f64) -> f64 {
    counts
        .values()
        .map(|&count| {
            let probability = count as f64 / n;
            -probability * probability.ln()
        })
        .sum()
}

/// Compares two label assignments over the nodes they both label.
///
/// Label values are only compared for grouping, so renumbered assignments
/// of the same grouping agree perfectly.
///
/// # Errors
/// Returns [`QualityError::NoSharedNodes`] when no node carries a label on
/// both sides.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use cohort_core::partition_agreement;
///
/// let left = BTreeMap::from([("a".to_owned(), 0), ("b".to_owned(), 0), ("c".to_owned(), 1)]);
/// let right = BTreeMap::from([("a".to_owned(), 5), ("b".to_owned(), 5), ("c".to_owned(), 2)]);
/// let score = partition_agreement(&left, &right)?;
/// assert_eq!(score.ari, 1.0);
/// assert_eq!(score.shared_nodes, 3);
/// # Ok::<(), cohort_core::QualityError>(())
/// ```
pub fn partition_agreement(
    left: &LabelAssignment,
    right: &LabelAssignment,
) -> Result<AgreementScore, QualityError> {
    let table = Contingency::build(left, right);
    if table.items == 0 {
        return Err(QualityError::NoSharedNodes {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(AgreementScore {
        ari: table.adjusted_rand_index(),
        nmi: table.normalised_mutual_information(),
        shared_nodes: table.items,
    })
}
