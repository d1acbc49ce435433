//! Unit and property tests for label propagation.

use std::collections::{BTreeMap, HashMap};

use proptest::prelude::*;
use rstest::{fixture, rstest};

use super::*;
use crate::test_utils::{
    GraphFixture, graph_fixture_strategy, suite_proptest_config, two_triangles, undirected,
};

#[fixture]
fn weighted_path() -> Graph {
    undirected(&[
        ("a", "b", 10.0),
        ("b", "c", 5.0),
        ("c", "d", 1.0),
        ("d", "e", 5.0),
        ("e", "f", 10.0),
    ])
}

fn path_seeds() -> BTreeMap<String, usize> {
    BTreeMap::from([("a".to_owned(), 0), ("f".to_owned(), 1)])
}

#[rstest]
#[case::seed_42(42)]
#[case::seed_zero(0)]
#[case::seed_negative(-17)]
#[case::seed_large(9_876_543_210)]
fn synchronous_mode_separates_disjoint_triangles(#[case] seed: i64) {
    let graph = two_triangles();
    let outcome = propagate_labels(&graph, &PropagationConfig::new().with_random_seed(seed));

    assert!(outcome.converged());
    assert_eq!(outcome.community_count(), 2);
    assert_eq!(outcome.label("a"), outcome.label("b"));
    assert_eq!(outcome.label("b"), outcome.label("c"));
    assert_eq!(outcome.label("d"), outcome.label("e"));
    assert_eq!(outcome.label("e"), outcome.label("f"));
    assert_eq!(outcome.label("a"), Some(0), "first node seen gets label 0");
    assert_eq!(outcome.label("d"), Some(1));
}

#[rstest]
fn synchronous_mode_is_deterministic_for_a_seed() {
    let graph = two_triangles();
    let config = PropagationConfig::new().with_random_seed(7);
    assert_eq!(
        propagate_labels(&graph, &config),
        propagate_labels(&graph, &config)
    );
}

#[rstest]
fn caller_supplied_random_source_advances() {
    let graph = two_triangles();
    let config = PropagationConfig::new();
    let mut random = DeterministicRandom::new(config.random_seed());
    let threaded = propagate_labels_with(&graph, &config, &mut random);

    assert_eq!(threaded, propagate_labels(&graph, &config));
    assert_ne!(random, DeterministicRandom::new(config.random_seed()));
}

#[rstest]
fn single_edge_converges_on_second_pass() {
    let graph = undirected(&[("a", "b", 1.0)]);
    let outcome = propagate_labels(&graph, &PropagationConfig::default());
    assert!(outcome.converged());
    assert_eq!(outcome.iterations(), 2);
    assert_eq!(outcome.community_count(), 1);
}

#[rstest]
fn isolated_nodes_keep_distinct_labels() {
    let mut graph = Graph::new();
    for id in ["x", "y", "z"] {
        graph.insert_node(id).expect("valid id");
    }
    graph.insert_edge("z", "z", 4.0).expect("valid self-loop");

    let outcome = propagate_labels(&graph, &PropagationConfig::default());
    assert!(outcome.converged());
    assert_eq!(outcome.iterations(), 1);
    assert_eq!(
        outcome.labels().values().copied().collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[rstest]
fn unknown_neighbours_do_not_vote() {
    let mut graph = undirected(&[("a", "b", 1.0)]);
    graph.insert_edge("a", "ghost", 100.0).expect("valid edge");
    let outcome = propagate_labels(&graph, &PropagationConfig::default());
    assert_eq!(outcome.community_count(), 1);
    assert_eq!(outcome.label("ghost"), None);
}

#[rstest]
#[case::synchronous(Mode::Synchronous)]
#[case::asynchronous(Mode::Asynchronous)]
#[case::seeded(Mode::Seeded)]
fn empty_graph_yields_empty_converged_outcome(#[case] mode: Mode) {
    let outcome = mode.run(&Graph::new(), &PropagationConfig::default());
    assert!(outcome.labels().is_empty());
    assert_eq!(outcome.iterations(), 0);
    assert!(outcome.converged());
}

#[rstest]
fn zero_iteration_budget_reports_not_converged() {
    let graph = two_triangles();
    let outcome = propagate_labels(&graph, &PropagationConfig::new().with_max_iterations(0));
    assert_eq!(outcome.iterations(), 0);
    assert!(!outcome.converged());
    assert_eq!(outcome.community_count(), 6);
}

#[rstest]
fn asynchronous_mode_follows_lowest_label_rule() {
    let graph = two_triangles();
    let outcome = propagate_labels_async(&graph, &PropagationConfig::default());

    assert!(outcome.converged());
    assert_eq!(outcome.iterations(), 3);
    let expected: BTreeMap<String, usize> =
        [("a", 0), ("b", 0), ("c", 0), ("d", 1), ("e", 1), ("f", 1)]
            .into_iter()
            .map(|(id, label)| (id.to_owned(), label))
            .collect();
    assert_eq!(outcome.labels(), &expected);
}

#[rstest]
fn asynchronous_mode_stops_at_the_iteration_cap_when_oscillating() {
    let graph = undirected(&[("a", "b", 1.0)]);
    let outcome = propagate_labels_async(&graph, &PropagationConfig::new().with_max_iterations(9));
    assert_eq!(outcome.iterations(), 9);
    assert!(!outcome.converged());
}

#[rstest]
fn seeded_mode_pulls_nodes_towards_the_nearer_anchor(weighted_path: Graph) {
    for seed in [1, 42, 1_000] {
        let outcome = propagate_seeded_labels(
            &weighted_path,
            &path_seeds(),
            &PropagationConfig::new().with_random_seed(seed),
        );
        assert!(outcome.converged());
        let labels: Vec<usize> = outcome.labels().values().copied().collect();
        assert_eq!(labels, vec![0, 0, 0, 1, 1, 1], "seed {seed}");
    }
}

#[rstest]
fn seeded_mode_numbers_free_nodes_above_the_largest_seed(weighted_path: Graph) {
    let outcome = propagate_seeded_labels(
        &weighted_path,
        &path_seeds(),
        &PropagationConfig::new().with_max_iterations(0),
    );
    let labels: Vec<usize> = outcome.labels().values().copied().collect();
    assert_eq!(labels, vec![0, 2, 3, 4, 5, 1]);
}

#[rstest]
fn seeded_mode_ignores_seeds_for_unknown_nodes(weighted_path: Graph) {
    let seeds = BTreeMap::from([("ghost".to_owned(), 50), ("a".to_owned(), 3)]);
    let outcome = propagate_seeded_labels(
        &weighted_path,
        &seeds,
        &PropagationConfig::new().with_max_iterations(0),
    );
    assert_eq!(outcome.label("a"), Some(3));
    assert_eq!(outcome.label("b"), Some(4));
    assert_eq!(outcome.label("ghost"), None);
}

#[rstest]
fn seeded_mode_preserves_seed_values_verbatim() {
    let graph = undirected(&[
        ("a", "b", 2.0),
        ("a", "c", 2.0),
        ("b", "c", 1.0),
        ("d", "e", 2.0),
        ("d", "f", 2.0),
        ("e", "f", 1.0),
    ]);
    let seeds = BTreeMap::from([("a".to_owned(), 40), ("d".to_owned(), 90)]);
    let outcome = propagate_seeded_labels(&graph, &seeds, &PropagationConfig::default());
    assert!(outcome.converged());
    for id in ["a", "b", "c"] {
        assert_eq!(outcome.label(id), Some(40));
    }
    for id in ["d", "e", "f"] {
        assert_eq!(outcome.label(id), Some(90));
    }
}

#[rstest]
fn clique_settles_on_a_single_label() {
    let ids = ["p", "q", "r", "s", "t", "u"];
    let mut edges = Vec::new();
    for (i, a) in ids.iter().enumerate() {
        for b in &ids[i + 1..] {
            edges.push((*a, *b, 1.0));
        }
    }
    let graph = undirected(&edges);
    let outcome = propagate_labels(&graph, &PropagationConfig::default());
    assert!(outcome.converged());
    assert_eq!(outcome.community_count(), 1);
}

#[rstest]
fn communities_group_members_by_label() {
    let outcome = propagate_labels(&two_triangles(), &PropagationConfig::default());
    let groups = outcome.communities();
    assert_eq!(groups.len(), 2);
    assert_eq!(
        groups.get(&0).map(|members| members.iter().cloned().collect::<Vec<_>>()),
        Some(vec!["a".to_owned(), "b".to_owned(), "c".to_owned()])
    );
}

#[derive(Clone, Copy, Debug)]
enum Mode {
    Synchronous,
    Asynchronous,
    Seeded,
}

impl Mode {
    fn run(self, graph: &Graph, config: &PropagationConfig) -> PropagationOutcome {
        match self {
            Self::Synchronous => propagate_labels(graph, config),
            Self::Asynchronous => propagate_labels_async(graph, config),
            Self::Seeded => {
                let first = graph.nodes().next().map(ToOwned::to_owned);
                let seeds: BTreeMap<String, usize> = first.into_iter().map(|id| (id, 0)).collect();
                propagate_seeded_labels(graph, &seeds, config)
            }
        }
    }
}

/// Checks that every node with known neighbours holds a label of maximal weight.
fn assert_stable_labels(
    fixture: &GraphFixture,
    outcome: &PropagationOutcome,
) -> Result<(), TestCaseError> {
    let graph = &fixture.graph;
    for id in graph.nodes() {
        let mut totals: HashMap<usize, f64> = HashMap::new();
        for (neighbour, weight) in graph.neighbours(id).into_iter().flatten() {
            if let Some(label) = outcome.label(neighbour) {
                *totals.entry(label).or_insert(0.0) += weight;
            }
        }
        let Some(best) = totals.values().copied().reduce(f64::max) else {
            continue;
        };
        let own = outcome.label(id).and_then(|label| totals.get(&label).copied());
        prop_assert_eq!(
            own,
            Some(best),
            "{:?}: node {} is not on a maximal label",
            fixture.topology,
            id
        );
    }
    Ok(())
}

proptest! {
    #![proptest_config(suite_proptest_config(128))]

    #[test]
    fn synchronous_runs_are_reproducible(fixture in graph_fixture_strategy(), seed in any::<i64>()) {
        let config = PropagationConfig::new().with_random_seed(seed);
        prop_assert_eq!(
            propagate_labels(&fixture.graph, &config),
            propagate_labels(&fixture.graph, &config)
        );
    }

    #[test]
    fn seeded_runs_are_reproducible(fixture in graph_fixture_strategy(), seed in any::<i64>()) {
        let config = PropagationConfig::new().with_random_seed(seed);
        let seeds = fixture
            .graph
            .nodes()
            .step_by(3)
            .enumerate()
            .map(|(label, id)| (id.to_owned(), label))
            .collect::<BTreeMap<_, _>>();
        prop_assert_eq!(
            propagate_seeded_labels(&fixture.graph, &seeds, &config),
            propagate_seeded_labels(&fixture.graph, &seeds, &config)
        );
    }

    #[test]
    fn iteration_budget_is_respected(fixture in graph_fixture_strategy(), budget in 0_usize..6) {
        let config = PropagationConfig::new().with_max_iterations(budget);
        for outcome in [
            propagate_labels(&fixture.graph, &config),
            propagate_labels_async(&fixture.graph, &config),
        ] {
            prop_assert!(outcome.iterations() <= budget);
            prop_assert_eq!(outcome.labels().len(), fixture.graph.node_count());
        }
    }

    #[test]
    fn converged_synchronous_runs_are_stable(fixture in graph_fixture_strategy()) {
        let outcome = propagate_labels(&fixture.graph, &PropagationConfig::default());
        if outcome.converged() {
            assert_stable_labels(&fixture, &outcome)?;
        }
    }

    #[test]
    fn labels_are_dense_after_renumbering(fixture in graph_fixture_strategy()) {
        let outcome = propagate_labels(&fixture.graph, &PropagationConfig::default());
        let communities = outcome.community_count();
        prop_assert!(outcome.labels().values().all(|&label| label < communities));
    }
}
