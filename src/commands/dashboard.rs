//! `audit-watch dashboard`: poll the whole swarm and show classified nodes.

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{info, warn};

use audit_watch::config::Config;
use audit_watch::dashboard::{self, NodeFilter, ResultTab, SwarmView, ViewState};
use audit_watch::domain::NodeId;
use audit_watch::{AuditClient, Swarm, SwarmOptions};

use super::{print_structured, resolve_token, OutputFormat};

pub struct DashboardArgs {
    pub filter: NodeFilter,
    pub node: Option<String>,
    pub tab: ResultTab,
    pub watch: bool,
    pub format: OutputFormat,
}

pub fn run(cfg: Config, args: DashboardArgs) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(cfg, args))
}

async fn run_async(cfg: Config, args: DashboardArgs) -> Result<()> {
    let token = resolve_token(&cfg)?;
    if token.is_none() {
        warn!("no access token configured, node results will not be fetched");
    }

    let client = Arc::new(AuditClient::from_config(&cfg)?);
    let options = SwarmOptions {
        policy: cfg.poll.policy(),
        token,
    };

    let mut swarm = Swarm::discover(client, options)
        .await
        .with_context(|| format!("resolving swarm nodes from {}", cfg.server_url))?;

    let mut view = SwarmView::new(swarm.nodes());
    let view_state = ViewState {
        filter: args.filter,
        detail: args.node.map(|id| (NodeId::new(id), args.tab)),
    };
    let live = args.watch && args.format == OutputFormat::Table;

    if args.format == OutputFormat::Table {
        print!("{}", frame(&view, &view_state, live));
    }

    while !view.is_settled() {
        tokio::select! {
            event = swarm.next_event() => match event {
                Some(event) => {
                    view.apply(event);
                    if live {
                        print!("{}", frame(&view, &view_state, true));
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, cancelling node tasks");
                swarm.shutdown();
            }
        }
    }
    swarm.join().await;

    match args.format {
        OutputFormat::Table => {
            print!("{}", frame(&view, &view_state, live));
            let tally = view.tally();
            if tally.unresolved > 0 {
                println!(
                    "{} {} node(s) could not be resolved",
                    "!!".red().bold(),
                    tally.unresolved
                );
            }
        }
        format => print_structured(format, &view.snapshot())?,
    }
    Ok(())
}

/// One table frame. A live frame clears the terminal first.
fn frame(view: &SwarmView, state: &ViewState, live: bool) -> String {
    let body = dashboard::render(view, state);
    if live {
        format!("\x1b[2J\x1b[H{body}")
    } else {
        body
    }
}
