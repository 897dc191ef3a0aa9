//! Aggregation of a node's check results and health classification.
//!
//! Percentages are taken over every result except INFO. Statuses the server
//! invented are tallied in `unknown_count` and still count towards the
//! denominator, so they pull the three percentages down together.

use serde::{Deserialize, Serialize};

use super::check::{CheckResult, CheckStatus};

/// A node whose skipped share exceeds this is `Undetermined`.
pub const UNDETERMINED_SKIP_PCT: u8 = 50;

/// Derived tallies for one node's results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub passed_pct: u8,
    pub warned_pct: u8,
    pub skipped_pct: u8,
    pub info_count: usize,
    pub unknown_count: usize,
    pub total: usize,
}

/// Overall health bucket of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Passing,
    Failing,
    Undetermined,
}

impl Classification {
    pub fn label(self) -> &'static str {
        match self {
            Self::Passing => "passed",
            Self::Failing => "failed",
            Self::Undetermined => "undetermined",
        }
    }
}

/// Reduce a result sequence to percentages and counts.
///
/// When every result is INFO the denominator is zero and all three
/// percentages are 0.
pub fn aggregate(results: &[CheckResult]) -> AggregateStats {
    let (mut passed, mut warned, mut skipped, mut info, mut unknown) = (0, 0, 0, 0, 0);
    for result in results {
        match result.status {
            CheckStatus::Pass => passed += 1,
            CheckStatus::Warn => warned += 1,
            CheckStatus::Skip => skipped += 1,
            CheckStatus::Info => info += 1,
            CheckStatus::Other(_) => unknown += 1,
        }
    }

    let denominator = results.len() - info;
    AggregateStats {
        passed_pct: percent(passed, denominator),
        warned_pct: percent(warned, denominator),
        skipped_pct: percent(skipped, denominator),
        info_count: info,
        unknown_count: unknown,
        total: results.len(),
    }
}

/// Rounded `100 * count / denominator`, ties rounding up.
fn percent(count: usize, denominator: usize) -> u8 {
    if denominator == 0 {
        return 0;
    }
    let rounded = (200 * count + denominator) / (2 * denominator);
    rounded.min(100) as u8
}

/// Classify a node from its stats. Skip dominance is checked first.
pub fn classify(stats: &AggregateStats) -> Classification {
    if stats.skipped_pct > UNDETERMINED_SKIP_PCT {
        Classification::Undetermined
    } else if stats.passed_pct < stats.warned_pct {
        Classification::Failing
    } else {
        Classification::Passing
    }
}
