//! Result Aggregator
//!
//! Pure computation of per-option counts and percentages from grouped
//! vote counts. Safe to call at any time, open or closed poll.

use super::types::{OptionTally, PollResults};
use std::collections::HashMap;

/// Aggregate grouped vote counts into per-option tallies.
///
/// Percent is count / total * 100 when the poll has votes, else 0.0
/// for every option. Options with no votes tally at zero.
pub fn tally(
    poll_id: &str,
    options: &[String],
    counts_by_option: &HashMap<usize, u64>,
) -> PollResults {
    let total_votes: u64 = counts_by_option.values().sum();

    let options = options
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let count = counts_by_option.get(&index).copied().unwrap_or(0);
            let percent = if total_votes > 0 {
                count as f64 / total_votes as f64 * 100.0
            } else {
                0.0
            };
            OptionTally {
                label: label.clone(),
                count,
                percent,
            }
        })
        .collect();

    PollResults {
        poll_id: poll_id.to_string(),
        total_votes,
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tally_no_votes() {
        let results = tally("p1", &labels(&["Tea", "Coffee"]), &HashMap::new());

        assert_eq!(results.total_votes, 0);
        assert_eq!(results.options.len(), 2);
        for opt in &results.options {
            assert_eq!(opt.count, 0);
            assert_eq!(opt.percent, 0.0);
        }
    }

    #[test]
    fn test_tally_percentages_sum_to_100() {
        let counts = HashMap::from([(0, 1), (1, 1), (2, 1)]);
        let results = tally("p1", &labels(&["A", "B", "C"]), &counts);

        assert_eq!(results.total_votes, 3);
        let sum: f64 = results.options.iter().map(|o| o.percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_tally_preserves_option_order() {
        let counts = HashMap::from([(1, 5)]);
        let results = tally("p1", &labels(&["Tea", "Coffee"]), &counts);

        assert_eq!(results.options[0].label, "Tea");
        assert_eq!(results.options[0].count, 0);
        assert_eq!(results.options[0].percent, 0.0);
        assert_eq!(results.options[1].label, "Coffee");
        assert_eq!(results.options[1].count, 5);
        assert_eq!(results.options[1].percent, 100.0);
    }

    #[test]
    fn test_tally_ignores_out_of_range_counts() {
        // A stale count for an index past the option list must not
        // panic or produce a phantom option.
        let counts = HashMap::from([(0, 1), (7, 3)]);
        let results = tally("p1", &labels(&["A", "B"]), &counts);

        assert_eq!(results.options.len(), 2);
        assert_eq!(results.total_votes, 4);
        assert_eq!(results.options[0].count, 1);
    }
}
