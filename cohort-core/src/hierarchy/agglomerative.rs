//! Distance-driven agglomerative clustering.

use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};

use super::{ClusterIndex, Dendrogram, Hierarchy, HierarchyConfig, Linkage};
use crate::{distance::DistanceMatrix, graph::Graph, telemetry};

/// An active cluster: its arena position and the graph nodes it holds.
#[derive(Debug)]
struct Active {
    index: ClusterIndex,
    members: Vec<usize>,
}

/// Symmetric distances between active clusters keyed by arena position.
#[derive(Debug, Default)]
struct DistanceTable {
    entries: HashMap<(ClusterIndex, ClusterIndex), f64>,
}

impl DistanceTable {
    fn key(a: ClusterIndex, b: ClusterIndex) -> (ClusterIndex, ClusterIndex) {
        if a <= b { (a, b) } else { (b, a) }
    }

    fn insert(&mut self, a: ClusterIndex, b: ClusterIndex, distance: f64) {
        self.entries.insert(Self::key(a, b), distance);
    }

    fn get(&self, a: ClusterIndex, b: ClusterIndex) -> f64 {
        self.entries
            .get(&Self::key(a, b))
            .copied()
            .unwrap_or(f64::INFINITY)
    }

    fn forget(&mut self, cluster: ClusterIndex) {
        self.entries.retain(|&(a, b), _| a != cluster && b != cluster);
    }
}

/// Builds a dendrogram by merging the closest pair of active clusters.
///
/// Distances between graph nodes are hop counts; a pair counts as finite when
/// either direction is reachable, taking the shorter direction. Each round
/// scans active pairs in active-set order and merges the first pair at the
/// strictly smallest distance. When only infinite distances remain, every
/// surviving cluster becomes a child of one forest root.
///
/// # Examples
/// ```
/// use cohort_core::{Graph, HierarchyConfig, Linkage, agglomerative_clustering};
///
/// let mut graph = Graph::new();
/// graph.insert_undirected_edge("a", "b", 1.0)?;
/// graph.insert_undirected_edge("b", "c", 1.0)?;
/// graph.insert_undirected_edge("c", "d", 1.0)?;
///
/// let config = HierarchyConfig::default().with_linkage(Linkage::Complete);
/// let hierarchy = agglomerative_clustering(&graph, &config);
/// assert_eq!(hierarchy.dendrogram().len(), 7);
/// assert_eq!(hierarchy.root().map(|root| root.members().len()), Some(4));
/// # Ok::<(), cohort_core::GraphError>(())
/// ```
#[must_use]
#[instrument(
    name = "core.agglomerative",
    skip(graph, config),
    fields(nodes = graph.node_count(), linkage = %config.linkage()),
)]
pub fn agglomerative_clustering(graph: &Graph, config: &HierarchyConfig) -> Hierarchy {
    let indexed = graph.indexed();
    let matrix = DistanceMatrix::from_indexed(&indexed);
    let linkage = config.linkage();

    let mut dendrogram = Dendrogram::default();
    let mut active: Vec<Active> = indexed
        .ids()
        .iter()
        .enumerate()
        .map(|(node, id)| Active {
            index: dendrogram.push_leaf(id),
            members: vec![node],
        })
        .collect();

    let mut table = DistanceTable::default();
    for (i, left) in active.iter().enumerate() {
        for right in &active[i + 1..] {
            table.insert(
                left.index,
                right.index,
                cluster_distance(&matrix, linkage, left, right),
            );
        }
    }

    while active.len() > 1 {
        let Some((i, j, distance)) = closest_pair(&active, &table) else {
            let children: Vec<ClusterIndex> = active.iter().map(|cluster| cluster.index).collect();
            warn!(
                components = children.len(),
                "no finite merge remains; gathering clusters under a forest root"
            );
            telemetry::record_forest_fallback();
            let root = dendrogram.push_forest(children);
            active.clear();
            active.push(Active {
                index: root,
                members: Vec::new(),
            });
            break;
        };

        let right = active.remove(j);
        let left = active.remove(i);
        let index = dendrogram.push_merge(left.index, right.index, distance);
        telemetry::record_merge();
        debug!(
            left = left.index.get(),
            right = right.index.get(),
            distance,
            "merged clusters"
        );

        table.forget(left.index);
        table.forget(right.index);
        let mut members = left.members;
        members.extend(right.members);
        let merged = Active { index, members };
        for other in &active {
            table.insert(
                merged.index,
                other.index,
                cluster_distance(&matrix, linkage, &merged, other),
            );
        }
        active.push(merged);
    }

    if let Some(root) = active.first() {
        dendrogram.set_root(root.index);
    }
    let hierarchy = Hierarchy::new(dendrogram);
    info!(
        clusters = hierarchy.dendrogram().len(),
        root_height = hierarchy.root_height(),
        "agglomerative clustering completed"
    );
    hierarchy
}

/// Returns the first active pair at the strictly smallest finite distance.
fn closest_pair(active: &[Active], table: &DistanceTable) -> Option<(usize, usize, f64)> {
    let mut best: Option<(usize, usize, f64)> = None;
    for (i, left) in active.iter().enumerate() {
        for (offset, right) in active[i + 1..].iter().enumerate() {
            let distance = table.get(left.index, right.index);
            if !distance.is_finite() {
                continue;
            }
            if best.is_none_or(|(_, _, current)| distance < current) {
                best = Some((i, i + 1 + offset, distance));
            }
        }
    }
    best
}

fn cluster_distance(matrix: &DistanceMatrix, linkage: Linkage, left: &Active, right: &Active) -> f64 {
    let pairs = left.members.iter().flat_map(|&u| {
        right.members.iter().map(move |&v| {
            match (matrix.hops(u, v), matrix.hops(v, u)) {
                (Some(a), Some(b)) => a.min(b) as f64,
                (Some(hops), None) | (None, Some(hops)) => hops as f64,
                (None, None) => f64::INFINITY,
            }
        })
    });
    linkage.combine(pairs, left.members.len(), right.members.len())
}
