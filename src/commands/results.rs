//! `audit-watch results <node>`: wait for one node and show its checks.

use anyhow::{anyhow, bail, Result};
use tracing::info;

use audit_watch::config::Config;
use audit_watch::dashboard::{render_detail, render_node, ResultTab};
use audit_watch::domain::{NodeId, NodeState, Phase};
use audit_watch::fetcher::ResultsFetcher;
use audit_watch::poller::ReadinessPoller;
use audit_watch::{AuditClient, WatchError};

use super::{print_structured, resolve_token, OutputFormat};

pub fn run(cfg: Config, node: &str, tab: ResultTab, format: OutputFormat) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(cfg, NodeId::new(node), tab, format))
}

async fn run_async(cfg: Config, node: NodeId, tab: ResultTab, format: OutputFormat) -> Result<()> {
    let token = resolve_token(&cfg)?;
    let client = AuditClient::from_config(&cfg)?;
    let policy = cfg.poll.policy();

    info!(node = %node, "waiting for node results");
    let mut poller = ReadinessPoller::new(&client, &node, &policy);
    tokio::select! {
        outcome = poller.run() => outcome?,
        _ = tokio::signal::ctrl_c() => bail!("interrupted while waiting for node {}", node),
    }

    let results = ResultsFetcher::new(&client, token.as_ref())
        .fetch(&node)
        .await
        .map_err(|e| match e {
            WatchError::AuthMissing => {
                anyhow!("no access token: pass --token, --token-file or --cookie")
            }
            other => other.into(),
        })?;

    let mut state = NodeState::new(node);
    state.advance(Phase::Ready);
    state.set_results(results);
    state.aggregate();

    match format {
        OutputFormat::Table => {
            println!("{}", render_node(&state));
            println!();
            print!("{}", render_detail(&state, tab));
        }
        format => print_structured(format, &state)?,
    }
    Ok(())
}
