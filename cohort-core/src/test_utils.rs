//! Shared test utilities for `cohort-core`.

use cohort_test_support::ci::property_test_profile::ProptestRunProfile;
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use test_strategy::Arbitrary;

use crate::graph::Graph;

/// Builds a standard proptest configuration from the shared CI profile.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// Builds an undirected graph from `(a, b, weight)` triples.
pub(crate) fn undirected(edges: &[(&str, &str, f64)]) -> Graph {
    let mut graph = Graph::new();
    for &(a, b, weight) in edges {
        graph
            .insert_undirected_edge(a, b, weight)
            .expect("fixture edges must be valid");
    }
    graph
}

/// Two triangles `{a, b, c}` and `{d, e, f}` without connecting edges.
pub(crate) fn two_triangles() -> Graph {
    undirected(&[
        ("a", "b", 1.0),
        ("b", "c", 1.0),
        ("a", "c", 1.0),
        ("d", "e", 1.0),
        ("e", "f", 1.0),
        ("d", "f", 1.0),
    ])
}

/// The four-node path `a - b - c - d`.
pub(crate) fn path_of_four() -> Graph {
    undirected(&[("a", "b", 1.0), ("b", "c", 1.0), ("c", "d", 1.0)])
}

/// Shape of a generated graph.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Arbitrary)]
pub(crate) enum GraphTopology {
    /// Each pair is connected with a fixed probability.
    #[weight(3)]
    Random,
    /// Dense groups joined by a few bridge edges.
    #[weight(3)]
    Planted,
    /// Several components with no edges between them.
    #[weight(2)]
    Disconnected,
    /// Nodes with no adjacency entries at all.
    #[weight(1)]
    Isolated,
}

/// Generated graph together with the parameters that produced it.
#[derive(Clone, Debug)]
pub(crate) struct GraphFixture {
    pub(crate) graph: Graph,
    pub(crate) topology: GraphTopology,
}

const MIN_NODES: usize = 1;
const MAX_NODES: usize = 14;

/// Generates graph fixtures covering every [`GraphTopology`].
pub(crate) fn graph_fixture_strategy() -> impl Strategy<Value = GraphFixture> {
    (any::<GraphTopology>(), any::<u64>()).prop_map(|(topology, seed)| {
        let mut rng = SmallRng::seed_from_u64(seed);
        generate_fixture(topology, &mut rng)
    })
}

pub(crate) fn generate_fixture(topology: GraphTopology, rng: &mut SmallRng) -> GraphFixture {
    let node_count = rng.gen_range(MIN_NODES..=MAX_NODES);
    let mut graph = Graph::new();
    for node in 0..node_count {
        graph
            .insert_node(node_name(node))
            .expect("generated identifiers are non-empty");
    }

    match topology {
        GraphTopology::Random => connect_pairs(&mut graph, 0..node_count, 0.35, rng),
        GraphTopology::Planted => {
            let groups = rng.gen_range(1..=3_usize);
            let span = node_count.div_ceil(groups);
            for start in (0..node_count).step_by(span) {
                connect_pairs(&mut graph, start..(start + span).min(node_count), 0.9, rng);
            }
            if node_count > 1 {
                let a = rng.gen_range(0..node_count);
                let b = rng.gen_range(0..node_count);
                add_edge(&mut graph, a, b, rng);
            }
        }
        GraphTopology::Disconnected => {
            let middle = node_count / 2;
            connect_pairs(&mut graph, 0..middle, 0.6, rng);
            connect_pairs(&mut graph, middle..node_count, 0.6, rng);
        }
        GraphTopology::Isolated => {}
    }

    GraphFixture { graph, topology }
}

fn connect_pairs(
    graph: &mut Graph,
    range: std::ops::Range<usize>,
    probability: f64,
    rng: &mut SmallRng,
) {
    for a in range.clone() {
        for b in (a + 1)..range.end {
            if rng.gen_bool(probability) {
                add_edge(graph, a, b, rng);
            }
        }
    }
}

fn add_edge(graph: &mut Graph, a: usize, b: usize, rng: &mut SmallRng) {
    let weight = f64::from(rng.gen_range(1_u8..=4));
    graph
        .insert_undirected_edge(node_name(a), node_name(b), weight)
        .expect("generated edges are valid");
}

pub(crate) fn node_name(index: usize) -> String {
    format!("n{index:02}")
}
