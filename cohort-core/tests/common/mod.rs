use std::collections::BTreeMap;

use cohort_core::Graph;

/// Builds a graph from a nested adjacency listing.
pub fn adjacency(entries: Vec<(&str, Vec<(&str, f64)>)>) -> Graph {
    let map: BTreeMap<String, Vec<(String, f64)>> = entries
        .into_iter()
        .map(|(node, neighbours)| {
            (
                node.to_owned(),
                neighbours
                    .into_iter()
                    .map(|(neighbour, weight)| (neighbour.to_owned(), weight))
                    .collect(),
            )
        })
        .collect();
    Graph::try_from_adjacency(map).expect("fixture adjacency must be valid")
}

/// Two four-node cliques joined by one light bridge between `a3` and `b0`.
pub fn bridged_cliques() -> Graph {
    let mut graph = Graph::new();
    for prefix in ["a", "b"] {
        for i in 0..4 {
            for j in (i + 1)..4 {
                graph
                    .insert_undirected_edge(format!("{prefix}{i}"), format!("{prefix}{j}"), 3.0)
                    .expect("valid edge");
            }
        }
    }
    graph
        .insert_undirected_edge("a3", "b0", 0.5)
        .expect("valid edge");
    graph
}
