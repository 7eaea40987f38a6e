//! Binary-tree reduction of per-chunk tables into a single table.

use std::time::Instant;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::is_power_of_two;
use crate::error::{Result, WordFreqError};
use crate::metrics::RoundMetrics;
use crate::table::{FrequencyTable, MergeOutcome};

/// One synchronized step of the reduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRound {
    /// Sequential round number (1-indexed).
    pub round: usize,
    /// Number of live tables entering the round.
    pub live: usize,
    /// `(survivor, consumed)` slot pairs; the consumed table is merged into the survivor.
    pub pairs: Vec<(usize, usize)>,
}

/// Pairing structure for reducing `n` tables in `log2(n)` rounds.
///
/// Round `r` pairs slot `i` with slot `i + live / 2` for every `i` in the
/// lower half, so after the last round the result sits in slot 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePlan {
    rounds: Vec<MergeRound>,
}

impl MergePlan {
    /// Computes the plan for `tables` inputs, which must be a power of two.
    pub fn new(tables: usize) -> Result<Self> {
        if !is_power_of_two(tables) {
            return Err(WordFreqError::InvalidConfig(format!(
                "cannot reduce {tables} tables: count must be a power of two greater than zero"
            )));
        }
        let mut rounds = Vec::new();
        let mut live = tables;
        while live > 1 {
            let half = live / 2;
            rounds.push(MergeRound {
                round: rounds.len() + 1,
                live,
                pairs: (0..half).map(|i| (i, i + half)).collect(),
            });
            live = half;
        }
        Ok(Self { rounds })
    }

    /// Rounds in execution order.
    #[must_use]
    pub fn rounds(&self) -> &[MergeRound] {
        &self.rounds
    }

    /// Number of rounds, i.e. `log2(n)`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    /// Returns true when a single table needs no merging.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

/// Reduces `tables` to one table following [`MergePlan`].
///
/// Pairs within a round are merged concurrently on the Rayon pool.  A round
/// finishes only when all of its merges have, and the next round then works
/// on the halved set of survivors.
pub fn reduce_tables(
    tables: Vec<FrequencyTable>,
    show_progress: bool,
) -> Result<(FrequencyTable, Vec<RoundMetrics>)> {
    let plan = MergePlan::new(tables.len())?;
    let mut live = tables;
    let mut metrics = Vec::with_capacity(plan.len());

    for round in plan.rounds() {
        let started = Instant::now();
        let half = round.pairs.len();
        debug_assert_eq!(live.len(), round.live);
        debug_assert!(round
            .pairs
            .iter()
            .enumerate()
            .all(|(i, &(survivor, consumed))| survivor == i && consumed == i + half));

        // Slot `i + half` ends up at `consumed[i]`.
        let consumed = live.split_off(half);
        let outcomes: Vec<MergeOutcome> = live
            .par_iter_mut()
            .zip(consumed.into_par_iter())
            .map(|(survivor, other)| survivor.merge_from(other))
            .collect();

        let round_metrics = RoundMetrics {
            round: round.round,
            pairs: outcomes.len(),
            matched: outcomes.iter().map(|outcome| outcome.matched).sum(),
            transferred: outcomes.iter().map(|outcome| outcome.transferred).sum(),
            largest_table: live.iter().map(FrequencyTable::len).max().unwrap_or(0),
            elapsed: started.elapsed(),
        };
        if show_progress {
            debug!(
                "merge round {:>3} pairs {:>5} matched {:>10} transferred {:>10} largest {:>10} in {:.2?}",
                round_metrics.round,
                round_metrics.pairs,
                round_metrics.matched,
                round_metrics.transferred,
                round_metrics.largest_table,
                round_metrics.elapsed
            );
        }
        metrics.push(round_metrics);
    }

    match (live.pop(), live.is_empty()) {
        (Some(table), true) => Ok((table, metrics)),
        _ => Err(WordFreqError::Internal(
            "reduction did not converge to a single table".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::WordEntry;

    fn table(words: &[(&str, u64)]) -> FrequencyTable {
        words
            .iter()
            .map(|(word, count)| WordEntry::new(word.as_bytes(), *count))
            .collect()
    }

    #[test]
    fn plan_pairs_lower_half_with_upper_half() {
        let plan = MergePlan::new(8).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.rounds()[0].pairs, vec![(0, 4), (1, 5), (2, 6), (3, 7)]);
        assert_eq!(plan.rounds()[1].pairs, vec![(0, 2), (1, 3)]);
        assert_eq!(plan.rounds()[2].pairs, vec![(0, 1)]);
        assert_eq!(
            plan.rounds().iter().map(|r| r.live).collect::<Vec<_>>(),
            vec![8, 4, 2]
        );
    }

    #[test]
    fn single_table_plan_is_empty() {
        let plan = MergePlan::new(1).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn plan_rejects_non_power_of_two() {
        for tables in [0, 3, 10] {
            assert!(matches!(
                MergePlan::new(tables),
                Err(WordFreqError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn reduces_four_tables_into_slot_zero() {
        let tables = vec![
            table(&[("a", 1), ("c", 1)]),
            table(&[("b", 2)]),
            table(&[("a", 2), ("d", 1)]),
            table(&[("c", 4), ("e", 1)]),
        ];
        let (merged, rounds) = reduce_tables(tables, false).unwrap();
        assert_eq!(
            merged.into_entries(),
            vec![
                WordEntry::new("a", 3),
                WordEntry::new("b", 2),
                WordEntry::new("c", 5),
                WordEntry::new("d", 1),
                WordEntry::new("e", 1),
            ]
        );
        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[0].pairs, 2);
        assert_eq!(rounds[0].matched, 1);
        assert_eq!(rounds[1].matched, 1);
        assert_eq!(rounds[1].pairs, 1);
    }

    #[test]
    fn single_table_is_returned_unchanged() {
        let only = table(&[("x", 9)]);
        let (merged, rounds) = reduce_tables(vec![only.clone()], false).unwrap();
        assert_eq!(merged, only);
        assert!(rounds.is_empty());
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(reduce_tables(Vec::new(), false).is_err());
    }

    #[test]
    fn reduction_matches_sequential_merge() {
        let tables: Vec<FrequencyTable> = (0..16u64)
            .map(|i| {
                let words: Vec<(String, u64)> =
                    (0..=i).map(|j| (format!("w{:02}", (i * 7 + j) % 23), j + 1)).collect();
                words
                    .iter()
                    .map(|(word, count)| WordEntry::new(word.as_bytes(), *count))
                    .collect()
            })
            .collect();
        let mut sequential = FrequencyTable::new();
        for t in tables.clone() {
            sequential.merge_from(t);
        }
        let (reduced, _) = reduce_tables(tables, false).unwrap();
        assert_eq!(reduced, sequential);
    }
}
