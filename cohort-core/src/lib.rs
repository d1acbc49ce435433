//! Cohort core library: community detection and hierarchical clustering over
//! weighted graphs.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod distance;
mod error;
mod graph;
mod hierarchy;
mod propagation;
mod quality;
mod random;
mod telemetry;

#[cfg(test)]
mod test_utils;

pub use crate::{
    distance::{DistanceMatrix, hop_distances},
    error::{
        CohortError, CohortErrorCode, GraphError, GraphErrorCode, QualityError, QualityErrorCode,
        Result,
    },
    graph::Graph,
    hierarchy::{
        ClusterIndex, ClusterKind, ClusterNode, ClusterPartition, Dendrogram, Hierarchy,
        HierarchyConfig, Linkage, agglomerative_clustering, modularity_clustering,
    },
    propagation::{
        PropagationConfig, PropagationOutcome, propagate_labels, propagate_labels_async,
        propagate_labels_with, propagate_seeded_labels, propagate_seeded_labels_with,
    },
    quality::{
        AgreementScore, LabelAssignment, labels_from_partition, modularity, partition_agreement,
    },
    random::DeterministicRandom,
};
