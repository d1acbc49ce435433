//! Flat partitions extracted from a dendrogram.

use super::{ClusterKind, ClusterPartition, Dendrogram};

impl Dendrogram {
    /// Cuts the tree at `height`.
    ///
    /// Walking down from the root, a node becomes one cluster when it is a
    /// leaf or its height is at most `height`. Forest roots never form a
    /// cluster themselves; their children are cut independently. Clusters are
    /// listed in traversal order, left before right.
    ///
    /// # Examples
    /// ```
    /// use cohort_core::{Graph, HierarchyConfig, agglomerative_clustering};
    ///
    /// let mut graph = Graph::new();
    /// graph.insert_undirected_edge("a", "b", 1.0)?;
    /// graph.insert_undirected_edge("x", "y", 1.0)?;
    ///
    /// let hierarchy = agglomerative_clustering(&graph, &HierarchyConfig::default());
    /// let dendrogram = hierarchy.dendrogram();
    /// assert_eq!(dendrogram.cut_at_height(0).len(), 4);
    /// assert_eq!(dendrogram.cut_at_height(dendrogram.root_height()).len(), 2);
    /// # Ok::<(), cohort_core::GraphError>(())
    /// ```
    #[must_use]
    pub fn cut_at_height(&self, height: usize) -> ClusterPartition {
        let mut partition = ClusterPartition::new();
        let Some(root) = self.root_index() else {
            return partition;
        };
        let mut pending = vec![root];
        while let Some(index) = pending.pop() {
            let node = self.node(index);
            match &node.kind {
                ClusterKind::Forest { children } => pending.extend(children.iter().rev()),
                ClusterKind::Leaf => partition.push(node.members.clone()),
                ClusterKind::Merge { .. } if node.height <= height => {
                    partition.push(node.members.clone());
                }
                ClusterKind::Merge { left, right } => pending.extend([*right, *left]),
            }
        }
        partition
    }

    /// Cuts the tree into `k` clusters, or the closest achievable count.
    ///
    /// `k == 0` yields an empty partition and `k == 1` the root members. For
    /// larger `k` the height range `0..=root_height` is binary searched.
    /// Without an exact match the cut with the most clusters not exceeding
    /// `k` is returned; if every height yields more than `k` clusters, as a
    /// forest root can, the cut at the root height is returned.
    ///
    /// # Examples
    /// ```
    /// use cohort_core::{Graph, HierarchyConfig, agglomerative_clustering};
    ///
    /// let mut graph = Graph::new();
    /// graph.insert_undirected_edge("a", "b", 1.0)?;
    /// graph.insert_undirected_edge("b", "c", 1.0)?;
    /// graph.insert_undirected_edge("c", "d", 1.0)?;
    ///
    /// let hierarchy = agglomerative_clustering(&graph, &HierarchyConfig::default());
    /// let dendrogram = hierarchy.dendrogram();
    /// assert!(dendrogram.cut_for_k_clusters(0).is_empty());
    /// assert_eq!(dendrogram.cut_for_k_clusters(1).len(), 1);
    /// assert_eq!(dendrogram.cut_for_k_clusters(4).len(), 4);
    /// # Ok::<(), cohort_core::GraphError>(())
    /// ```
    #[must_use]
    pub fn cut_for_k_clusters(&self, k: usize) -> ClusterPartition {
        if k == 0 || self.root_index().is_none() {
            return ClusterPartition::new();
        }
        if k == 1 {
            return vec![self.root_members().clone()];
        }

        let (mut low, mut high) = (0, self.root_height());
        let mut best: Option<ClusterPartition> = None;
        while low <= high {
            let middle = low + (high - low) / 2;
            let partition = self.cut_at_height(middle);
            if partition.len() == k {
                return partition;
            }
            if partition.len() > k {
                low = middle + 1;
            } else {
                if best.as_ref().is_none_or(|current| partition.len() >= current.len()) {
                    best = Some(partition);
                }
                let Some(lower) = middle.checked_sub(1) else {
                    break;
                };
                high = lower;
            }
        }
        best.unwrap_or_else(|| self.cut_at_height(self.root_height()))
    }
}
