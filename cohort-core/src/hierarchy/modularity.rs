//! Greedy modularity-gain agglomeration.

use tracing::{debug, info, instrument};

use super::{ClusterIndex, Dendrogram, Hierarchy};
use crate::{
    graph::{Graph, IndexedGraph},
    telemetry,
};

#[derive(Debug)]
struct Active {
    index: ClusterIndex,
    members: Vec<usize>,
    degree_sum: f64,
}

/// Degrees, edge count and adjacency lookups used by the gain formula.
#[derive(Debug)]
struct GainModel {
    node_count: usize,
    adjacent: Vec<bool>,
    degrees: Vec<f64>,
    edge_count: f64,
}

impl GainModel {
    fn new(graph: &IndexedGraph<'_>) -> Self {
        let node_count = graph.len();
        let mut adjacent = vec![false; node_count * node_count];
        let mut degrees = Vec::with_capacity(node_count);
        for node in 0..node_count {
            let neighbours = graph.neighbours(node);
            degrees.push(neighbours.len() as f64);
            for &(neighbour, _) in neighbours {
                adjacent[node * node_count + neighbour] = true;
            }
        }
        let edge_count = degrees.iter().sum::<f64>() / 2.0;
        Self {
            node_count,
            adjacent,
            degrees,
            edge_count,
        }
    }

    /// `edges_between / m - degree_product / (4 m²)`, or zero without edges.
    fn gain(&self, left: &Active, right: &Active) -> f64 {
        if self.edge_count == 0.0 {
            return 0.0;
        }
        let edges_between = left
            .members
            .iter()
            .flat_map(|&u| right.members.iter().map(move |&v| (u, v)))
            .filter(|&(u, v)| self.adjacent[u * self.node_count + v])
            .count() as f64;
        let degree_product = left.degree_sum * right.degree_sum;
        let m = self.edge_count;
        edges_between / m - degree_product / (4.0 * m * m)
    }
}

/// Builds a dendrogram by merging the pair with the largest modularity gain.
///
/// A node's degree is the number of its adjacency entries naming known
/// nodes and `m` is half the degree sum. Ties go to the first pair in
/// active-set order. Each merge records `-gain` as its distance, so less
/// beneficial merges sit further from the leaves. Gain is defined for every
/// pair, so merging always continues down to a single root.
///
/// # Examples
/// ```
/// use cohort_core::{Graph, modularity_clustering};
///
/// let mut graph = Graph::new();
/// graph.insert_undirected_edge("a", "b", 1.0)?;
/// graph.insert_undirected_edge("c", "d", 1.0)?;
///
/// let hierarchy = modularity_clustering(&graph);
/// assert_eq!(hierarchy.dendrogram().len(), 7);
/// let root = hierarchy.root().map(|root| root.is_forest());
/// assert_eq!(root, Some(false));
/// # Ok::<(), cohort_core::GraphError>(())
/// ```
#[must_use]
#[instrument(name = "core.modularity", skip(graph), fields(nodes = graph.node_count()))]
pub fn modularity_clustering(graph: &Graph) -> Hierarchy {
    let indexed = graph.indexed();
    let model = GainModel::new(&indexed);

    let mut dendrogram = Dendrogram::default();
    let mut active: Vec<Active> = indexed
        .ids()
        .iter()
        .enumerate()
        .map(|(node, id)| Active {
            index: dendrogram.push_leaf(id),
            members: vec![node],
            degree_sum: model.degrees[node],
        })
        .collect();

    while active.len() > 1 {
        let mut best: Option<(usize, usize, f64)> = None;
        for (i, left) in active.iter().enumerate() {
            for (offset, right) in active[i + 1..].iter().enumerate() {
                let gain = model.gain(left, right);
                if best.is_none_or(|(_, _, current)| gain > current) {
                    best = Some((i, i + 1 + offset, gain));
                }
            }
        }
        let Some((i, j, gain)) = best else {
            break;
        };

        let right = active.remove(j);
        let left = active.remove(i);
        let index = dendrogram.push_merge(left.index, right.index, -gain);
        telemetry::record_merge();
        debug!(
            left = left.index.get(),
            right = right.index.get(),
            gain,
            "merged clusters"
        );

        let mut members = left.members;
        members.extend(right.members);
        active.push(Active {
            index,
            members,
            degree_sum: left.degree_sum + right.degree_sum,
        });
    }

    if let Some(root) = active.first() {
        dendrogram.set_root(root.index);
    }
    let hierarchy = Hierarchy::new(dendrogram);
    info!(
        clusters = hierarchy.dendrogram().len(),
        root_height = hierarchy.root_height(),
        edges = model.edge_count,
        "modularity clustering completed"
    );
    hierarchy
}
