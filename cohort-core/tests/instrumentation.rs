use std::collections::BTreeMap;

use cohort_core::{
    Graph, HierarchyConfig, Linkage, PropagationConfig, agglomerative_clustering, hop_distances,
    modularity_clustering, propagate_labels, propagate_labels_async, propagate_seeded_labels,
};
use cohort_test_support::tracing::{RecordingLayer, SpanRecord, capture};
use rstest::{fixture, rstest};
use tracing::Level;

mod common;

use common::{adjacency, bridged_cliques};

#[fixture]
fn split_graph() -> Graph {
    adjacency(vec![
        ("a", vec![("b", 1.0)]),
        ("b", vec![("a", 1.0)]),
        ("x", vec![("y", 1.0)]),
        ("y", vec![("x", 1.0)]),
    ])
}

fn span(layer: &RecordingLayer, name: &str) -> SpanRecord {
    layer
        .span(name)
        .unwrap_or_else(|| panic!("{name} span must exist"))
}

#[rstest]
fn synchronous_propagation_records_span_and_summary() {
    let graph = bridged_cliques();
    let config = PropagationConfig::new().with_max_iterations(25);
    let (outcome, layer) = capture(|| propagate_labels(&graph, &config));

    let run = span(&layer, "core.propagate_labels");
    assert_eq!(run.field("nodes"), Some("8"));
    assert_eq!(run.field("max_iterations"), Some("25"));

    let summaries = layer.events_with_message(Level::INFO, "label propagation completed");
    let [summary] = summaries.as_slice() else {
        panic!("expected one completion event, got {summaries:?}");
    };
    let communities = outcome.community_count().to_string();
    assert_eq!(summary.field("communities"), Some(communities.as_str()));
    assert_eq!(summary.field("converged"), Some("true"));

    let passes = layer.events_with_message(Level::TRACE, "propagation pass completed");
    assert_eq!(passes.len(), outcome.iterations());
}

#[rstest]
fn asynchronous_propagation_uses_its_own_span(split_graph: Graph) {
    let (_, layer) =
        capture(|| propagate_labels_async(&split_graph, &PropagationConfig::default()));
    assert_eq!(span(&layer, "core.propagate_labels_async").field("nodes"), Some("4"));
    assert!(layer.span("core.propagate_labels").is_none());
    assert!(
        !layer
            .events_with_message(Level::TRACE, "asynchronous pass completed")
            .is_empty()
    );
}

#[rstest]
fn seeded_propagation_logs_ignored_seeds(split_graph: Graph) {
    let seeds = BTreeMap::from([("a".to_owned(), 0), ("ghost".to_owned(), 3)]);
    let (outcome, layer) = capture(|| {
        propagate_seeded_labels(&split_graph, &seeds, &PropagationConfig::default())
    });
    assert_eq!(outcome.label("b"), Some(0));
    assert_eq!(span(&layer, "core.propagate_seeded_labels").field("seeds"), Some("2"));

    let ignored = layer.events_with_message(Level::DEBUG, "ignoring seed for unknown node");
    assert_eq!(ignored.len(), 1);
    assert_eq!(ignored[0].field("node"), Some("ghost"));
}

#[rstest]
fn agglomerative_clustering_warns_on_forest_fallback(split_graph: Graph) {
    let config = HierarchyConfig::new().with_linkage(Linkage::Ward);
    let (hierarchy, layer) = capture(|| agglomerative_clustering(&split_graph, &config));
    assert!(hierarchy.root().is_some_and(|root| root.is_forest()));

    let run = span(&layer, "core.agglomerative");
    assert_eq!(run.field("nodes"), Some("4"));
    assert_eq!(run.field("linkage"), Some("ward"));

    let warnings: Vec<_> = layer
        .events()
        .into_iter()
        .filter(|event| event.level == Level::WARN)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field("components"), Some("2"));
}

#[rstest]
fn connected_graphs_do_not_warn() {
    let graph = bridged_cliques();
    let (hierarchy, layer) =
        capture(|| agglomerative_clustering(&graph, &HierarchyConfig::default()));
    assert!(hierarchy.root().is_some_and(|root| !root.is_forest()));
    assert!(layer.events().iter().all(|event| event.level != Level::WARN));

    let merges = layer.events_with_message(Level::DEBUG, "merged clusters");
    assert_eq!(merges.len(), graph.node_count() - 1);
}

#[rstest]
fn distance_and_modularity_spans_carry_node_counts(split_graph: Graph) {
    let (_, layer) = capture(|| {
        let _ = hop_distances(&split_graph);
        modularity_clustering(&split_graph)
    });
    assert_eq!(span(&layer, "core.distance_oracle").field("nodes"), Some("4"));
    assert_eq!(span(&layer, "core.modularity").field("nodes"), Some("4"));
    assert_eq!(
        layer
            .events_with_message(Level::INFO, "modularity clustering completed")
            .len(),
        1
    );
}
