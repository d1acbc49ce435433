//! Per-node vote accumulation.
//!
//! A [`LabelTally`] is reused across every node of a pass so the inner loop
//! does not allocate. Randomised modes choose uniformly among tied labels;
//! the asynchronous mode always takes the lowest tied label.

use std::collections::HashMap;

use crate::random::DeterministicRandom;

#[derive(Debug)]
pub(super) struct LabelTally {
    totals: HashMap<usize, f64>,
    best: f64,
    candidates: Vec<usize>,
}

impl Default for LabelTally {
    fn default() -> Self {
        Self {
            totals: HashMap::new(),
            best: f64::NEG_INFINITY,
            candidates: Vec::new(),
        }
    }
}

impl LabelTally {
    /// Accumulates the weight of every neighbour under its current label.
    ///
    /// Candidates are kept in the order their labels first reached the
    /// running maximum; a strictly larger total resets the list.
    pub(super) fn collect(&mut self, neighbours: &[(usize, f64)], labels: &[usize]) {
        self.totals.clear();
        self.candidates.clear();
        self.best = f64::NEG_INFINITY;

        for &(neighbour, weight) in neighbours {
            let label = labels[neighbour];
            let total = self.totals.entry(label).or_insert(0.0);
            *total += weight;
            let total = *total;

            if total > self.best {
                self.best = total;
                self.candidates.clear();
                self.candidates.push(label);
            } else if total == self.best && !self.candidates.contains(&label) {
                self.candidates.push(label);
            }
        }
    }

    /// Picks uniformly among the tied labels.
    ///
    /// Totals only grow, so the current label is already a candidate whenever
    /// its total ties the maximum. A node without neighbours keeps `current`.
    pub(super) fn pick_random(&self, current: usize, random: &mut DeterministicRandom) -> usize {
        match self.candidates.as_slice() {
            [] => current,
            [only] => *only,
            tied => tied[random.index(tied.len())],
        }
    }

    /// Picks the label with the largest total, preferring the lowest id on ties.
    ///
    /// The current label enters the comparison first with a zero total.
    pub(super) fn pick_lowest(&self, current: usize) -> usize {
        let (label, _) = self.totals.iter().fold(
            (current, 0.0_f64),
            |(best_label, best_total), (&label, &total)| {
                if total > best_total || (total == best_total && label < best_label) {
                    (label, total)
                } else {
                    (best_label, best_total)
                }
            },
        );
        label
    }
}
