mod common;

use std::sync::Arc;
use std::time::Duration;

use audit_watch::config::DirectoryEndpoint;
use audit_watch::dashboard::{self, NodeFilter, SwarmView, ViewState};
use audit_watch::domain::{Classification, NodeId, NodeProblem, Phase};
use audit_watch::poller::PollPolicy;
use audit_watch::token::Token;
use audit_watch::{AuditClient, Swarm, SwarmOptions};

use common::{Stub, TOKEN};

fn fast_policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(10),
        max_attempts: Some(50),
        max_backoff: Duration::from_millis(50),
        ..Default::default()
    }
}

async fn settle(swarm: &mut Swarm) -> SwarmView {
    let mut view = SwarmView::new(swarm.nodes());
    while !view.is_settled() {
        let event = tokio::time::timeout(Duration::from_secs(10), swarm.next_event())
            .await
            .expect("swarm did not settle")
            .expect("event stream closed early");
        view.apply(event);
    }
    view
}

#[tokio::test]
async fn classifies_every_node_against_live_server() {
    let stub = Stub::new(&["node-a", "failing-node", "garbled"]).not_ready_for("node-a", 3);
    let url = stub.clone().spawn().await;
    let client = Arc::new(AuditClient::new(&url, DirectoryEndpoint::Current).unwrap());

    let mut swarm = Swarm::discover(
        client,
        SwarmOptions {
            policy: fast_policy(),
            token: Token::new(TOKEN),
        },
    )
    .await
    .unwrap();
    let view = settle(&mut swarm).await;

    let node_a = view.get(&NodeId::from("node-a")).unwrap();
    assert_eq!(node_a.phase, Phase::Aggregated);
    assert_eq!(node_a.classification, Some(Classification::Passing));
    let stats = node_a.stats.unwrap();
    assert_eq!((stats.passed_pct, stats.warned_pct, stats.skipped_pct), (50, 25, 25));
    assert_eq!(stub.probes("node-a"), 4);
    assert_eq!(stub.fetch_count("node-a"), 1);

    let failing = view.get(&NodeId::from("failing-node")).unwrap();
    assert_eq!(failing.classification, Some(Classification::Failing));

    let garbled = view.get(&NodeId::from("garbled")).unwrap();
    assert_eq!(garbled.phase, Phase::Failed);
    assert!(matches!(garbled.problem, Some(NodeProblem::FetchFailed { .. })));

    let tally = view.tally();
    assert_eq!((tally.passing, tally.failing, tally.unresolved), (1, 1, 1));

    colored::control::set_override(false);
    let out = dashboard::render(
        &view,
        &ViewState {
            filter: NodeFilter::Passing,
            detail: None,
        },
    );
    assert!(out.starts_with("3 nodes\n"));
    assert!(out.contains("node-a  50% passed  25% failed  25% skipped  1 info only tests"));
    assert!(!out.contains("failing-node  "));
}

#[tokio::test]
async fn no_token_never_hits_result_endpoint() {
    let stub = Stub::new(&["node-a"]);
    let url = stub.clone().spawn().await;
    let client = Arc::new(AuditClient::new(&url, DirectoryEndpoint::Current).unwrap());

    let mut swarm = Swarm::discover(
        client,
        SwarmOptions {
            policy: fast_policy(),
            token: None,
        },
    )
    .await
    .unwrap();
    let view = settle(&mut swarm).await;

    let node = view.get(&NodeId::from("node-a")).unwrap();
    assert_eq!(node.problem, Some(NodeProblem::AuthMissing));
    assert_eq!(stub.fetch_count("node-a"), 0);
}

#[tokio::test]
async fn empty_swarm_settles_immediately() {
    let url = Stub::new(&[]).spawn().await;
    let client = Arc::new(AuditClient::new(&url, DirectoryEndpoint::Current).unwrap());

    let swarm = Swarm::discover(client, SwarmOptions::default()).await.unwrap();
    assert_eq!(swarm.active_tasks(), 0);

    let view = SwarmView::new(swarm.nodes());
    assert!(view.is_settled());
    assert_eq!(view.tally().nodes, 0);
}
