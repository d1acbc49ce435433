//! Hierarchical clustering over graph nodes.
//!
//! Two engines build the same [`Dendrogram`] shape:
//!
//! - [`agglomerative_clustering`] repeatedly merges the two closest active
//!   clusters under a [`Linkage`] policy applied to hop distances. When no
//!   finite merge remains, the surviving clusters are gathered under a
//!   synthetic forest root.
//! - [`modularity_clustering`] merges the pair with the largest modularity
//!   gain until one cluster remains.
//!
//! Nodes live in an arena addressed by [`ClusterIndex`]; leaves come first in
//! node iteration order, followed by merge nodes in creation order. The
//! result is wrapped in a [`Hierarchy`] carrying the flat partition for every
//! integer height up to the root.

mod agglomerative;
mod cut;
mod linkage;
mod modularity;

use std::collections::BTreeSet;

pub use self::agglomerative::agglomerative_clustering;
pub use self::linkage::Linkage;
pub use self::modularity::modularity_clustering;

/// Member sets, pairwise disjoint, covering every node of the source graph.
pub type ClusterPartition = Vec<BTreeSet<String>>;

static NO_MEMBERS: BTreeSet<String> = BTreeSet::new();

/// Configuration for [`agglomerative_clustering`].
///
/// # Examples
/// ```
/// use cohort_core::{HierarchyConfig, Linkage};
///
/// let config = HierarchyConfig::default().with_linkage(Linkage::Ward);
/// assert_eq!(config.linkage(), Linkage::Ward);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HierarchyConfig {
    linkage: Linkage,
}

impl HierarchyConfig {
    /// Creates a configuration using single linkage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the linkage policy.
    #[must_use]
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Returns the linkage policy.
    #[must_use]
    pub fn linkage(&self) -> Linkage {
        self.linkage
    }
}

/// Position of a [`ClusterNode`] inside its [`Dendrogram`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterIndex(usize);

impl ClusterIndex {
    /// Returns the raw arena position.
    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

/// Structural role of a [`ClusterNode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClusterKind {
    /// A single graph node.
    Leaf,
    /// The union of two earlier clusters.
    Merge {
        /// Cluster merged first.
        left: ClusterIndex,
        /// Cluster merged second.
        right: ClusterIndex,
    },
    /// Synthetic root holding clusters that never merged at a finite distance.
    Forest {
        /// Top-level trees in active-set order.
        children: Vec<ClusterIndex>,
    },
}

/// One node of a dendrogram.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterNode {
    id: String,
    members: BTreeSet<String>,
    kind: ClusterKind,
    distance: f64,
    height: usize,
}

impl ClusterNode {
    /// Returns the identifier: the graph node id for leaves, `cluster-<n>`
    /// otherwise.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns every graph node contained in this cluster.
    #[must_use]
    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    /// Returns the structural role of the node.
    #[must_use]
    pub fn kind(&self) -> &ClusterKind {
        &self.kind
    }

    /// Returns the merge distance; `0` for leaves, infinite for a forest root.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Returns the height; `0` for leaves, one more than the tallest child
    /// otherwise.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns whether the node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, ClusterKind::Leaf)
    }

    /// Returns whether the node is a synthetic forest root.
    #[must_use]
    pub fn is_forest(&self) -> bool {
        matches!(self.kind, ClusterKind::Forest { .. })
    }

    /// Iterates the direct children in merge order.
    pub fn children(&self) -> impl Iterator<Item = ClusterIndex> + '_ {
        let (pair, rest): (Option<[ClusterIndex; 2]>, &[ClusterIndex]) = match &self.kind {
            ClusterKind::Leaf => (None, &[]),
            ClusterKind::Merge { left, right } => (Some([*left, *right]), &[]),
            ClusterKind::Forest { children } => (None, children.as_slice()),
        };
        pair.into_iter().flatten().chain(rest.iter().copied())
    }
}

/// Arena of every cluster created while building a hierarchy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dendrogram {
    nodes: Vec<ClusterNode>,
    root: Option<ClusterIndex>,
}

impl Dendrogram {
    /// Returns the number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the arena holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns every node in creation order.
    #[must_use]
    pub fn nodes(&self) -> &[ClusterNode] {
        &self.nodes
    }

    /// Returns the node at `index`.
    #[must_use]
    pub fn get(&self, index: ClusterIndex) -> Option<&ClusterNode> {
        self.nodes.get(index.0)
    }

    /// Returns the arena position of the root, absent for an empty graph.
    #[must_use]
    pub fn root_index(&self) -> Option<ClusterIndex> {
        self.root
    }

    /// Returns the root node, absent for an empty graph.
    #[must_use]
    pub fn root(&self) -> Option<&ClusterNode> {
        self.root.and_then(|index| self.get(index))
    }

    /// Returns the root height, `0` for an empty graph.
    #[must_use]
    pub fn root_height(&self) -> usize {
        self.root().map_or(0, ClusterNode::height)
    }

    /// Returns the members of the root, empty for an empty graph.
    #[must_use]
    pub fn root_members(&self) -> &BTreeSet<String> {
        match self.root() {
            Some(root) => &root.members,
            None => &NO_MEMBERS,
        }
    }

    /// Iterates the leaves in node iteration order.
    pub fn leaves(&self) -> impl Iterator<Item = &ClusterNode> {
        self.nodes.iter().take_while(|node| node.is_leaf())
    }

    fn node(&self, index: ClusterIndex) -> &ClusterNode {
        &self.nodes[index.0]
    }

    fn push(&mut self, node: ClusterNode) -> ClusterIndex {
        let index = ClusterIndex(self.nodes.len());
        self.nodes.push(node);
        index
    }

    pub(crate) fn push_leaf(&mut self, id: &str) -> ClusterIndex {
        self.push(ClusterNode {
            id: id.to_owned(),
            members: BTreeSet::from([id.to_owned()]),
            kind: ClusterKind::Leaf,
            distance: 0.0,
            height: 0,
        })
    }

    pub(crate) fn push_merge(
        &mut self,
        left: ClusterIndex,
        right: ClusterIndex,
        distance: f64,
    ) -> ClusterIndex {
        let (left_node, right_node) = (self.node(left), self.node(right));
        let members = left_node.members.union(&right_node.members).cloned().collect();
        let height = 1 + left_node.height.max(right_node.height);
        self.push(ClusterNode {
            id: format!("cluster-{}", self.nodes.len()),
            members,
            kind: ClusterKind::Merge { left, right },
            distance,
            height,
        })
    }

    pub(crate) fn push_forest(&mut self, children: Vec<ClusterIndex>) -> ClusterIndex {
        let mut members = BTreeSet::new();
        let mut tallest = 0;
        for &child in &children {
            let child = self.node(child);
            members.extend(child.members.iter().cloned());
            tallest = tallest.max(child.height);
        }
        self.push(ClusterNode {
            id: format!("forest-{}", self.nodes.len()),
            members,
            kind: ClusterKind::Forest { children },
            distance: f64::INFINITY,
            height: tallest + 1,
        })
    }

    pub(crate) fn set_root(&mut self, root: ClusterIndex) {
        self.root = Some(root);
    }
}

/// Output of a hierarchical clustering engine.
///
/// # Examples
/// ```
/// use cohort_core::{Graph, HierarchyConfig, agglomerative_clustering};
///
/// let mut graph = Graph::new();
/// graph.insert_undirected_edge("a", "b", 1.0)?;
/// graph.insert_undirected_edge("b", "c", 1.0)?;
///
/// let hierarchy = agglomerative_clustering(&graph, &HierarchyConfig::default());
/// assert_eq!(hierarchy.dendrogram().len(), 5);
/// assert_eq!(hierarchy.clusters_at(0).map(Vec::len), Some(3));
/// assert_eq!(hierarchy.clusters_at(hierarchy.root_height()).map(Vec::len), Some(1));
/// # Ok::<(), cohort_core::GraphError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Hierarchy {
    dendrogram: Dendrogram,
    clusters: Vec<ClusterPartition>,
}

impl Hierarchy {
    pub(crate) fn new(dendrogram: Dendrogram) -> Self {
        let clusters = (0..=dendrogram.root_height())
            .map(|height| dendrogram.cut_at_height(height))
            .collect();
        Self {
            dendrogram,
            clusters,
        }
    }

    /// Returns the merge tree.
    #[must_use]
    pub fn dendrogram(&self) -> &Dendrogram {
        &self.dendrogram
    }

    /// Consumes the hierarchy, returning the merge tree.
    #[must_use]
    pub fn into_dendrogram(self) -> Dendrogram {
        self.dendrogram
    }

    /// Returns the root node, absent for an empty graph.
    #[must_use]
    pub fn root(&self) -> Option<&ClusterNode> {
        self.dendrogram.root()
    }

    /// Returns the root height, `0` for an empty graph.
    #[must_use]
    pub fn root_height(&self) -> usize {
        self.dendrogram.root_height()
    }

    /// Returns the precomputed partition at `height`.
    #[must_use]
    pub fn clusters_at(&self, height: usize) -> Option<&ClusterPartition> {
        self.clusters.get(height)
    }

    /// Returns the partitions for heights `0..=root_height`.
    #[must_use]
    pub fn clusters(&self) -> &[ClusterPartition] {
        &self.clusters
    }
}
