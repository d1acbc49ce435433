//! All-pairs hop distances.
//!
//! Every edge counts as one hop regardless of its weight. A breadth-first
//! search runs from each node, so building a [`DistanceMatrix`] costs
//! `O(V·(V+E))` time and `O(V²)` memory.

use std::collections::VecDeque;

use tracing::{debug, instrument};

use crate::graph::{Graph, IndexedGraph};

/// Shortest hop counts between every ordered pair of nodes.
///
/// Unreachable pairs have no recorded distance.
///
/// # Examples
/// ```
/// use cohort_core::{Graph, hop_distances};
///
/// let mut graph = Graph::new();
/// graph.insert_undirected_edge("a", "b", 7.0)?;
/// graph.insert_undirected_edge("b", "c", 0.5)?;
/// graph.insert_node("island")?;
///
/// let distances = hop_distances(&graph);
/// assert_eq!(distances.distance("a", "c"), Some(2));
/// assert_eq!(distances.distance("a", "island"), None);
/// # Ok::<(), cohort_core::GraphError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistanceMatrix {
    ids: Vec<String>,
    hops: Vec<Option<usize>>,
}

impl DistanceMatrix {
    pub(crate) fn from_indexed(graph: &IndexedGraph<'_>) -> Self {
        let n = graph.len();
        let mut hops = vec![None; n * n];
        let mut queue = VecDeque::new();
        for source in 0..n {
            let row = &mut hops[source * n..(source + 1) * n];
            row[source] = Some(0);
            queue.push_back(source);
            while let Some(node) = queue.pop_front() {
                let next = row[node].map_or(0, |hops| hops + 1);
                for &(neighbour, _) in graph.neighbours(node) {
                    if row[neighbour].is_none() {
                        row[neighbour] = Some(next);
                        queue.push_back(neighbour);
                    }
                }
            }
        }
        Self {
            ids: graph.ids().iter().map(|id| (*id).to_owned()).collect(),
            hops,
        }
    }

    /// Returns the hop count from `source` to `target`, if reachable.
    ///
    /// Unknown identifiers are treated as unreachable.
    #[must_use]
    pub fn distance(&self, source: &str, target: &str) -> Option<usize> {
        let source = self.position(source)?;
        let target = self.position(target)?;
        self.hops(source, target)
    }

    /// Returns the number of nodes covered by the matrix.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Returns node identifiers in matrix order.
    #[must_use]
    pub fn node_ids(&self) -> &[String] {
        &self.ids
    }

    pub(crate) fn hops(&self, source: usize, target: usize) -> Option<usize> {
        self.hops[source * self.ids.len() + target]
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.ids.binary_search_by(|probe| probe.as_str().cmp(id)).ok()
    }
}

/// Computes unit-length shortest paths between every pair of nodes.
///
/// Adjacency entries are followed in their stored direction only; adjacency
/// entries naming unknown nodes are skipped.
#[must_use]
#[instrument(name = "core.distance_oracle", skip(graph), fields(nodes = graph.node_count()))]
pub fn hop_distances(graph: &Graph) -> DistanceMatrix {
    let matrix = DistanceMatrix::from_indexed(&graph.indexed());
    debug!(
        reachable_pairs = matrix.hops.iter().filter(|hops| hops.is_some()).count(),
        "distance matrix computed"
    );
    matrix
}
