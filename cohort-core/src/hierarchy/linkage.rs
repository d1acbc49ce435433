//! Inter-cluster distance policies.

use std::{fmt, str::FromStr};

use crate::error::CohortError;

/// Combines pairwise hop distances between two clusters into one distance.
///
/// Only finite cross pairs participate; clusters without any finite cross
/// pair are infinitely far apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Linkage {
    /// Minimum pairwise distance.
    #[default]
    Single,
    /// Maximum pairwise distance.
    Complete,
    /// Arithmetic mean of pairwise distances.
    Average,
    /// Mean pairwise distance scaled by `|A|·|B| / (|A| + |B|)`.
    ///
    /// This is a size-weighted average rather than the variance-based Ward
    /// criterion.
    Ward,
}

impl Linkage {
    /// Every supported policy in canonical order.
    pub const ALL: [Self; 4] = [Self::Single, Self::Complete, Self::Average, Self::Ward];

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Complete => "complete",
            Self::Average => "average",
            Self::Ward => "ward",
        }
    }

    /// Combines the finite `distances` between clusters of `left_size` and
    /// `right_size` members.
    pub(crate) fn combine(
        self,
        distances: impl Iterator<Item = f64>,
        left_size: usize,
        right_size: usize,
    ) -> f64 {
        let mut count = 0_usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for distance in distances.filter(|distance| distance.is_finite()) {
            count += 1;
            sum += distance;
            min = min.min(distance);
            max = max.max(distance);
        }
        if count == 0 {
            return f64::INFINITY;
        }

        let mean = sum / count as f64;
        match self {
            Self::Single => min,
            Self::Complete => max,
            Self::Average => mean,
            Self::Ward => {
                let (a, b) = (left_size as f64, right_size as f64);
                mean * (a * b) / (a + b)
            }
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Linkage {
    type Err = CohortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|linkage| linkage.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CohortError::UnknownLinkage {
                provided: value.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::single(Linkage::Single, 1.0)]
    #[case::complete(Linkage::Complete, 3.0)]
    #[case::average(Linkage::Average, 2.0)]
    #[case::ward(Linkage::Ward, 2.0 * 2.0 / 3.0)]
    fn combine_applies_formula(#[case] linkage: Linkage, #[case] expected: f64) {
        let distances = [1.0, 2.0, f64::INFINITY, 3.0];
        let combined = linkage.combine(distances.into_iter(), 1, 2);
        assert!(
            (combined - expected).abs() < 1e-12,
            "{linkage}: expected {expected}, got {combined}"
        );
    }

    #[rstest]
    fn combine_without_finite_pairs_is_infinite() {
        for linkage in Linkage::ALL {
            assert_eq!(
                linkage.combine([f64::INFINITY].into_iter(), 1, 1),
                f64::INFINITY
            );
            assert_eq!(linkage.combine(std::iter::empty(), 3, 4), f64::INFINITY);
        }
    }

    #[rstest]
    #[case::lowercase("average", Linkage::Average)]
    #[case::mixed_case("Complete", Linkage::Complete)]
    #[case::padded("  ward ", Linkage::Ward)]
    fn parses_known_names(#[case] raw: &str, #[case] expected: Linkage) {
        assert_eq!(raw.parse::<Linkage>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "centroid".parse::<Linkage>().expect_err("unknown linkage");
        assert_eq!(err.code().as_str(), "COHORT_UNKNOWN_LINKAGE");
        assert!(err.to_string().contains("centroid"));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for linkage in Linkage::ALL {
            assert_eq!(linkage.to_string().parse::<Linkage>(), Ok(linkage));
        }
    }
}
