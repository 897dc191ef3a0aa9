//! Swarm pipeline: one independent task per node.
//!
//! Implements the per-node chain:
//!   NodeDirectory → ReadinessPoller → ResultsFetcher → aggregate/classify
//!
//! Each task owns its `NodeState` and publishes a snapshot after every
//! transition. Errors stop at the task boundary: one node failing never
//! touches another node or the directory.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{NodeId, NodeProblem, NodeState, Phase};
use crate::error::{Result, WatchError};
use crate::fetcher::ResultsFetcher;
use crate::poller::{PollPolicy, ReadinessPoller};
use crate::token::Token;
use crate::transport::AuditApi;

#[derive(Debug, Clone, Default)]
pub struct SwarmOptions {
    pub policy: PollPolicy,
    pub token: Option<Token>,
}

/// Snapshot of a node after a transition. `finished` marks the last
/// event its task will ever send.
#[derive(Debug, Clone)]
pub struct NodeEvent {
    pub state: NodeState,
    pub finished: bool,
}

struct NodeTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct Swarm {
    nodes: Vec<NodeId>,
    tasks: HashMap<NodeId, NodeTask>,
    cancel: CancellationToken,
    events: mpsc::UnboundedReceiver<NodeEvent>,
}

impl Swarm {
    /// Resolve the node set once and start one task per node.
    ///
    /// A directory failure is fatal and returned as-is. Duplicate ids from
    /// the server are collapsed so each node gets exactly one task.
    pub async fn discover<A>(api: Arc<A>, options: SwarmOptions) -> Result<Self>
    where
        A: AuditApi + ?Sized + 'static,
    {
        let mut nodes = api.list_nodes().await?;
        let mut seen = HashSet::new();
        nodes.retain(|id| seen.insert(id.clone()));
        info!(count = nodes.len(), "swarm discovered");

        let (tx, events) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let options = Arc::new(options);

        let tasks = nodes
            .iter()
            .map(|id| {
                let node_cancel = cancel.child_token();
                let handle = tokio::spawn(run_node(
                    api.clone(),
                    options.clone(),
                    id.clone(),
                    node_cancel.clone(),
                    tx.clone(),
                ));
                (
                    id.clone(),
                    NodeTask {
                        cancel: node_cancel,
                        handle,
                    },
                )
            })
            .collect();

        Ok(Self {
            nodes,
            tasks,
            cancel,
            events,
        })
    }

    /// Node ids in directory order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Next per-node event, in arrival order. `None` once every task is done.
    pub async fn next_event(&mut self) -> Option<NodeEvent> {
        self.events.recv().await
    }

    /// Number of node tasks still running.
    pub fn active_tasks(&self) -> usize {
        self.tasks
            .values()
            .filter(|task| !task.handle.is_finished())
            .count()
    }

    /// Stop one node's task. Returns false for an unknown id.
    pub fn cancel_node(&self, id: &NodeId) -> bool {
        match self.tasks.get(id) {
            Some(task) => {
                task.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Stop every node task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Wait for every node task to exit.
    pub async fn join(mut self) {
        for (id, task) in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.handle.await {
                warn!(node = %id, error = %e, "node task panicked");
            }
        }
    }
}

impl Drop for Swarm {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_node<A>(
    api: Arc<A>,
    options: Arc<SwarmOptions>,
    id: NodeId,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<NodeEvent>,
) where
    A: AuditApi + ?Sized,
{
    let mut state = NodeState::new(id);

    let cancelled = tokio::select! {
        _ = cancel.cancelled() => true,
        _ = drive(&*api, &options, &mut state, &tx) => false,
    };
    if cancelled {
        debug!(node = %state.id, phase = ?state.phase, "node task cancelled");
        state.record(NodeProblem::Cancelled, false);
    }

    publish(&tx, &state, true);
}

async fn drive<A>(
    api: &A,
    options: &SwarmOptions,
    state: &mut NodeState,
    tx: &mpsc::UnboundedSender<NodeEvent>,
) where
    A: AuditApi + ?Sized,
{
    let id = state.id.clone();
    state.advance(Phase::Polling);
    publish(tx, state, false);

    let mut poller = ReadinessPoller::new(api, &id, &options.policy);
    match poller.run().await {
        Ok(()) => {}
        Err(WatchError::PollTimeout { attempts, .. }) => {
            warn!(node = %id, attempts, "node never became ready");
            state.record(NodeProblem::PollTimeout { attempts }, true);
            return;
        }
        Err(e) => {
            warn!(node = %id, kind = e.kind(), error = %e, "polling stopped, node left pending");
            state.record(
                NodeProblem::PollStopped {
                    message: e.to_string(),
                },
                false,
            );
            return;
        }
    }

    state.advance(Phase::Ready);
    publish(tx, state, false);

    let fetcher = ResultsFetcher::new(api, options.token.as_ref());
    match fetcher.fetch(&id).await {
        Ok(results) => {
            state.set_results(results);
            publish(tx, state, false);
            if let Some(classification) = state.aggregate() {
                info!(node = %id, classification = classification.label(), "node aggregated");
            }
        }
        Err(WatchError::AuthMissing) => {
            warn!(node = %id, "no access token, result fetch skipped");
            state.record(NodeProblem::AuthMissing, false);
        }
        Err(e) => {
            warn!(node = %id, kind = e.kind(), error = %e, "result fetch failed");
            state.record(
                NodeProblem::FetchFailed {
                    message: e.to_string(),
                },
                true,
            );
        }
    }
}

fn publish(tx: &mpsc::UnboundedSender<NodeEvent>, state: &NodeState, finished: bool) {
    // The receiver is gone once the swarm is dropped; nothing left to tell.
    let _ = tx.send(NodeEvent {
        state: state.clone(),
        finished,
    });
}
