//! The seam between the polling pipeline and the audit server.

use async_trait::async_trait;

use crate::domain::{CheckResult, NodeId};
use crate::error::Result;
use crate::token::Token;

#[async_trait]
pub trait AuditApi: Send + Sync {
    /// Authoritative node set of the swarm, in server order.
    async fn list_nodes(&self) -> Result<Vec<NodeId>>;

    /// Single readiness probe for one node.
    async fn check_ready(&self, node: &NodeId) -> Result<bool>;

    /// Full list of check outcomes for a node that is ready.
    async fn fetch_results(&self, node: &NodeId, token: &Token) -> Result<Vec<CheckResult>>;
}
