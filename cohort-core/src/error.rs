//! Error types for the Cohort core library.
//!
//! The clustering engines are total functions and never fail. Errors only
//! arise at the boundary: while building a [`crate::Graph`] from caller data,
//! while parsing configuration values such as linkage names, or when two
//! label assignments cannot be compared.

use std::fmt;

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? $( ( $($tuple:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? $( ( $($tuple)* ) )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced while assembling a [`crate::Graph`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GraphError {
    /// Node identifiers must contain at least one character.
    #[error("node identifiers must not be empty")]
    EmptyNodeId,
    /// Edge weights must be zero or positive.
    #[error("edge `{node}` -> `{neighbour}` has negative weight {weight}")]
    NegativeWeight {
        /// Node owning the adjacency entry.
        node: String,
        /// Neighbour referenced by the adjacency entry.
        neighbour: String,
        /// The rejected weight.
        weight: f64,
    },
    /// Edge weights must be finite.
    #[error("edge `{node}` -> `{neighbour}` has a non-finite weight")]
    NonFiniteWeight {
        /// Node owning the adjacency entry.
        node: String,
        /// Neighbour referenced by the adjacency entry.
        neighbour: String,
    },
}

define_error_codes! {
    /// Stable codes describing [`GraphError`] variants.
    enum GraphErrorCode for GraphError {
        /// Node identifiers must contain at least one character.
        EmptyNodeId => EmptyNodeId => "GRAPH_EMPTY_NODE_ID",
        /// Edge weights must be zero or positive.
        NegativeWeight => NegativeWeight { .. } => "GRAPH_NEGATIVE_WEIGHT",
        /// Edge weights must be finite.
        NonFiniteWeight => NonFiniteWeight { .. } => "GRAPH_NON_FINITE_WEIGHT",
    }
}

/// Error type surfaced by the fallible parts of the public API.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CohortError {
    /// The supplied graph failed boundary validation.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// A linkage name did not match any supported strategy.
    #[error("unknown linkage `{provided}`; expected one of single, complete, average, ward")]
    UnknownLinkage {
        /// Raw value supplied by the caller.
        provided: String,
    },
}

define_error_codes! {
    /// Stable codes describing [`CohortError`] variants.
    enum CohortErrorCode for CohortError {
        /// The supplied graph failed boundary validation.
        InvalidGraph => Graph(..) => "COHORT_INVALID_GRAPH",
        /// A linkage name did not match any supported strategy.
        UnknownLinkage => UnknownLinkage { .. } => "COHORT_UNKNOWN_LINKAGE",
    }
}

impl CohortError {
    /// Retrieve the inner [`GraphErrorCode`] when the error originated in graph validation.
    #[must_use]
    pub const fn graph_code(&self) -> Option<GraphErrorCode> {
        match self {
            Self::Graph(error) => Some(error.code()),
            Self::UnknownLinkage { .. } => None,
        }
    }
}

/// An error produced while comparing two label assignments.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QualityError {
    /// The assignments have no node identifier in common.
    #[error("label assignments share no nodes ({left} left, {right} right)")]
    NoSharedNodes {
        /// Number of labelled nodes on the left.
        left: usize,
        /// Number of labelled nodes on the right.
        right: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`QualityError`] variants.
    enum QualityErrorCode for QualityError {
        /// The assignments have no node identifier in common.
        NoSharedNodes => NoSharedNodes { .. } => "QUALITY_NO_SHARED_NODES",
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, CohortError>;
