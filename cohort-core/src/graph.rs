//! Weighted adjacency graph consumed by every clustering engine.
//!
//! A [`Graph`] maps each node identifier to the weights of its outgoing
//! adjacency entries. Undirected graphs are represented by symmetric entries;
//! the engines never infer reverse edges on their own. Nodes are iterated in
//! ascending identifier order so every algorithm observes the same stable
//! enumeration regardless of how the graph was assembled.
//!
//! Adjacency entries may reference identifiers that are not themselves keys of
//! the graph. Such entries are accepted and ignored by every engine.

use std::collections::{BTreeMap, HashMap};

use crate::error::GraphError;

/// Weighted adjacency mapping with validated, non-negative edge weights.
///
/// # Examples
/// ```
/// use cohort_core::Graph;
///
/// let mut graph = Graph::new();
/// graph.insert_undirected_edge("a", "b", 1.0)?;
/// graph.insert_node("c")?;
/// assert_eq!(graph.node_count(), 3);
/// assert_eq!(graph.neighbours("a").map(|n| n.len()), Some(1));
/// # Ok::<(), cohort_core::GraphError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    adjacency: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from a nested adjacency map, validating every entry.
    ///
    /// # Errors
    /// Returns [`GraphError::EmptyNodeId`] when any identifier is empty,
    /// [`GraphError::NegativeWeight`] for weights below zero and
    /// [`GraphError::NonFiniteWeight`] for `NaN` or infinite weights.
    ///
    /// # Examples
    /// ```
    /// use std::collections::BTreeMap;
    /// use cohort_core::Graph;
    ///
    /// let mut adjacency = BTreeMap::new();
    /// adjacency.insert("a".to_owned(), BTreeMap::from([("b".to_owned(), 2.0)]));
    /// adjacency.insert("b".to_owned(), BTreeMap::from([("a".to_owned(), 2.0)]));
    /// let graph = Graph::try_from_adjacency(adjacency)?;
    /// assert_eq!(graph.node_count(), 2);
    /// # Ok::<(), cohort_core::GraphError>(())
    /// ```
    pub fn try_from_adjacency<I, N, S>(adjacency: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (S, N)>,
        N: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut graph = Self::new();
        for (node, neighbours) in adjacency {
            let node = node.into();
            graph.insert_node(node.clone())?;
            for (neighbour, weight) in neighbours {
                graph.insert_edge(node.clone(), neighbour, weight)?;
            }
        }
        Ok(graph)
    }

    /// Ensures `id` is present, leaving existing adjacency untouched.
    ///
    /// # Errors
    /// Returns [`GraphError::EmptyNodeId`] when `id` is empty.
    pub fn insert_node(&mut self, id: impl Into<String>) -> Result<(), GraphError> {
        let id = validate_id(id.into())?;
        self.adjacency.entry(id).or_default();
        Ok(())
    }

    /// Adds or overwrites the directed adjacency entry `node -> neighbour`.
    ///
    /// `node` is created when missing; `neighbour` is not.
    ///
    /// # Errors
    /// Returns [`GraphError`] when either identifier is empty or the weight is
    /// negative or non-finite.
    pub fn insert_edge(
        &mut self,
        node: impl Into<String>,
        neighbour: impl Into<String>,
        weight: f64,
    ) -> Result<(), GraphError> {
        let node = validate_id(node.into())?;
        let neighbour = validate_id(neighbour.into())?;
        validate_weight(&node, &neighbour, weight)?;
        self.adjacency
            .entry(node)
            .or_default()
            .insert(neighbour, weight);
        Ok(())
    }

    /// Adds `a -> b` and `b -> a` with the same weight, creating both nodes.
    ///
    /// # Errors
    /// Returns [`GraphError`] under the same conditions as [`Self::insert_edge`].
    pub fn insert_undirected_edge(
        &mut self,
        a: impl Into<String>,
        b: impl Into<String>,
        weight: f64,
    ) -> Result<(), GraphError> {
        let a = a.into();
        let b = b.into();
        self.insert_edge(a.clone(), b.clone(), weight)?;
        self.insert_edge(b, a, weight)
    }

    /// Returns the number of nodes (adjacency keys).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Returns whether `id` is a node of the graph.
    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.adjacency.contains_key(id)
    }

    /// Iterates node identifiers in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.adjacency.keys().map(String::as_str)
    }

    /// Returns the adjacency entries of `id`, if it is a node.
    #[must_use]
    pub fn neighbours(&self, id: &str) -> Option<&BTreeMap<String, f64>> {
        self.adjacency.get(id)
    }

    pub(crate) fn indexed(&self) -> IndexedGraph<'_> {
        IndexedGraph::new(self)
    }
}

fn validate_id(id: String) -> Result<String, GraphError> {
    if id.is_empty() {
        return Err(GraphError::EmptyNodeId);
    }
    Ok(id)
}

fn validate_weight(node: &str, neighbour: &str, weight: f64) -> Result<(), GraphError> {
    if !weight.is_finite() {
        return Err(GraphError::NonFiniteWeight {
            node: node.to_owned(),
            neighbour: neighbour.to_owned(),
        });
    }
    if weight < 0.0 {
        return Err(GraphError::NegativeWeight {
            node: node.to_owned(),
            neighbour: neighbour.to_owned(),
            weight,
        });
    }
    Ok(())
}

/// Dense integer view of a [`Graph`].
///
/// Node `i` is the `i`-th identifier in iteration order. Adjacency entries
/// pointing at unknown identifiers are dropped here, once, so the engines can
/// work on plain indices.
#[derive(Debug)]
pub(crate) struct IndexedGraph<'a> {
    ids: Vec<&'a str>,
    edges: Vec<Vec<(usize, f64)>>,
}

impl<'a> IndexedGraph<'a> {
    fn new(graph: &'a Graph) -> Self {
        let ids: Vec<&'a str> = graph.nodes().collect();
        let lookup: HashMap<&str, usize> = ids
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();
        let edges = graph
            .adjacency
            .values()
            .map(|neighbours| {
                neighbours
                    .iter()
                    .filter_map(|(neighbour, weight)| {
                        lookup
                            .get(neighbour.as_str())
                            .map(|&index| (index, *weight))
                    })
                    .collect()
            })
            .collect();
        Self { ids, edges }
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub(crate) fn ids(&self) -> &[&'a str] {
        &self.ids
    }

    pub(crate) fn id(&self, node: usize) -> &'a str {
        self.ids[node]
    }

    pub(crate) fn neighbours(&self, node: usize) -> &[(usize, f64)] {
        &self.edges[node]
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.ids.binary_search(&id).ok()
    }
}
