pub mod check;
pub mod node;
pub mod stats;

pub use check::{CheckResult, CheckStatus, NodeId};
pub use node::{NodeProblem, NodeState, Phase};
pub use stats::{aggregate, classify, AggregateStats, Classification};
