//! NodeState: per-node lifecycle record for one swarm member.
//!
//! A `NodeState` is owned by the task driving that node through
//! discovery → polling → fetch → aggregation. Everything else only ever sees
//! cloned snapshots of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::check::{CheckResult, NodeId};
use super::stats::{self, AggregateStats, Classification};

/// Lifecycle phase. Ordered: a node only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovered,
    Polling,
    /// Server reports the node's data is ready; not fetched yet.
    Ready,
    ResultsAvailable,
    Aggregated,
    Failed,
}

/// Why a node has not (yet) reached `Aggregated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeProblem {
    /// A readiness probe failed and polling was not resumed.
    PollStopped { message: String },
    PollTimeout { attempts: u32 },
    FetchFailed { message: String },
    /// No access token; the fetch was never attempted.
    AuthMissing,
    Cancelled,
}

impl NodeProblem {
    pub fn describe(&self) -> String {
        match self {
            Self::PollStopped { message } => format!("stuck polling: {message}"),
            Self::PollTimeout { attempts } => format!("not ready after {attempts} probes"),
            Self::FetchFailed { message } => format!("unresolved: {message}"),
            Self::AuthMissing => "unresolved: no access token".to_string(),
            Self::Cancelled => "cancelled".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeState {
    pub id: NodeId,
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<CheckResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<AggregateStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<NodeProblem>,
    pub updated_at: DateTime<Utc>,
}

impl NodeState {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            phase: Phase::Discovered,
            results: None,
            stats: None,
            classification: None,
            problem: None,
            updated_at: Utc::now(),
        }
    }

    /// Move to `next`. Regressions and moves out of `Failed` are refused.
    pub fn advance(&mut self, next: Phase) -> bool {
        if self.phase == Phase::Failed || next < self.phase {
            return false;
        }
        self.phase = next;
        self.updated_at = Utc::now();
        true
    }

    /// Store fetched results; the node becomes `ResultsAvailable`.
    pub fn set_results(&mut self, results: Vec<CheckResult>) -> bool {
        if !self.advance(Phase::ResultsAvailable) {
            return false;
        }
        self.results = Some(results);
        true
    }

    /// Aggregate and classify the stored results, exactly once.
    pub fn aggregate(&mut self) -> Option<Classification> {
        if self.phase != Phase::ResultsAvailable {
            return self.classification;
        }
        let computed = stats::aggregate(self.results.as_deref().unwrap_or_default());
        let classification = stats::classify(&computed);
        self.stats = Some(computed);
        self.classification = Some(classification);
        self.advance(Phase::Aggregated);
        Some(classification)
    }

    /// Record a problem. `fail` also moves the node to `Failed`.
    pub fn record(&mut self, problem: NodeProblem, fail: bool) {
        self.problem = Some(problem);
        self.updated_at = Utc::now();
        if fail {
            self.advance(Phase::Failed);
        }
    }
}
