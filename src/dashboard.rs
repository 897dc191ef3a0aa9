//! Terminal presenter for the swarm dashboard.
//!
//! `SwarmView` collects the latest snapshot per node from swarm events.
//! What to show is decided by an explicit `ViewState`, passed to every
//! render call.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::domain::{CheckResult, CheckStatus, Classification, NodeId, NodeState};
use crate::swarm::NodeEvent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum NodeFilter {
    #[default]
    All,
    Passing,
    Failing,
    Undetermined,
}

impl NodeFilter {
    pub fn matches(self, state: &NodeState) -> bool {
        match self {
            Self::All => true,
            Self::Passing => state.classification == Some(Classification::Passing),
            Self::Failing => state.classification == Some(Classification::Failing),
            Self::Undetermined => state.classification == Some(Classification::Undetermined),
        }
    }

    fn heading(self) -> &'static str {
        match self {
            Self::All => "All Nodes by ID:",
            Self::Passing => "All Passing Nodes by ID:",
            Self::Failing => "All Failing Nodes by ID:",
            Self::Undetermined => "All Undetermined Nodes by ID:",
        }
    }
}

/// Which slice of one node's checks to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ResultTab {
    #[default]
    All,
    Passed,
    Failed,
    Skipped,
    Info,
}

impl ResultTab {
    pub fn matches(self, status: &CheckStatus) -> bool {
        match self {
            Self::All => true,
            Self::Passed => *status == CheckStatus::Pass,
            Self::Failed => *status == CheckStatus::Warn,
            Self::Skipped => *status == CheckStatus::Skip,
            Self::Info => *status == CheckStatus::Info,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub filter: NodeFilter,
    pub detail: Option<(NodeId, ResultTab)>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub nodes: usize,
    pub passing: usize,
    pub failing: usize,
    pub undetermined: usize,
    pub unresolved: usize,
    pub loading: usize,
}

/// Serializable dashboard contents for `--format json|yaml`.
#[derive(Debug, Serialize)]
pub struct DashboardSnapshot<'a> {
    pub tally: Tally,
    pub nodes: Vec<&'a NodeState>,
}

pub struct SwarmView {
    order: Vec<NodeId>,
    nodes: HashMap<NodeId, NodeState>,
    finished: HashSet<NodeId>,
}

impl SwarmView {
    pub fn new(ids: &[NodeId]) -> Self {
        Self {
            order: ids.to_vec(),
            nodes: ids
                .iter()
                .map(|id| (id.clone(), NodeState::new(id.clone())))
                .collect(),
            finished: HashSet::new(),
        }
    }

    /// Replace a node's snapshot. Events for unknown ids are ignored.
    pub fn apply(&mut self, event: NodeEvent) {
        let Some(slot) = self.nodes.get_mut(&event.state.id) else {
            return;
        };
        if event.finished {
            self.finished.insert(event.state.id.clone());
        }
        *slot = event.state;
    }

    /// True once every node task has sent its final event.
    pub fn is_settled(&self) -> bool {
        self.finished.len() == self.order.len()
    }

    pub fn get(&self, id: &NodeId) -> Option<&NodeState> {
        self.nodes.get(id)
    }

    /// Node snapshots in directory order.
    pub fn states(&self) -> impl Iterator<Item = &NodeState> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn tally(&self) -> Tally {
        let mut tally = Tally {
            nodes: self.order.len(),
            ..Default::default()
        };
        for state in self.states() {
            match (state.classification, &state.problem) {
                (Some(Classification::Passing), _) => tally.passing += 1,
                (Some(Classification::Failing), _) => tally.failing += 1,
                (Some(Classification::Undetermined), _) => tally.undetermined += 1,
                (None, Some(_)) => tally.unresolved += 1,
                (None, None) => tally.loading += 1,
            }
        }
        tally
    }

    pub fn snapshot(&self) -> DashboardSnapshot<'_> {
        DashboardSnapshot {
            tally: self.tally(),
            nodes: self.states().collect(),
        }
    }
}

pub fn render(view: &SwarmView, state: &ViewState) -> String {
    let mut out = String::new();
    render_header(&mut out, &view.tally());

    let _ = writeln!(out, "{}", state.filter.heading().bold());
    for node in view.states().filter(|n| state.filter.matches(n)) {
        let _ = writeln!(out, "  {}", render_node(node));
    }

    if let Some((id, tab)) = &state.detail {
        if let Some(node) = view.get(id) {
            out.push('\n');
            out.push_str(&render_detail(node, *tab));
        }
    }
    out
}

fn render_header(out: &mut String, tally: &Tally) {
    let noun = if tally.nodes == 1 { "node" } else { "nodes" };
    let _ = writeln!(out, "{}", format!("{} {}", tally.nodes, noun).bold());
    let _ = writeln!(
        out,
        "  {} passed  {} failed  {} undetermined",
        tally.passing.to_string().green(),
        tally.failing.to_string().red(),
        tally.undetermined.to_string().yellow()
    );
    if tally.unresolved > 0 || tally.loading > 0 {
        let _ = writeln!(
            out,
            "  {} unresolved  {} loading",
            tally.unresolved.to_string().dimmed(),
            tally.loading
        );
    }
    out.push('\n');
}

fn colored_id(node: &NodeState) -> ColoredString {
    let id = node.id.as_str().bold();
    match node.classification {
        Some(Classification::Passing) => id.green(),
        Some(Classification::Failing) => id.red(),
        Some(Classification::Undetermined) => id.yellow(),
        None => id,
    }
}

/// One line per node: id, then stats, or why there are none.
pub fn render_node(node: &NodeState) -> String {
    let body = match (&node.stats, &node.problem) {
        (Some(stats), _) => format!(
            "{}% passed  {}% failed  {}% skipped  {} info only tests",
            stats.passed_pct, stats.warned_pct, stats.skipped_pct, stats.info_count
        ),
        (None, Some(problem)) => problem.describe().red().to_string(),
        (None, None) => "Loading...".dimmed().to_string(),
    };
    format!("{}  {}", colored_id(node), body)
}

pub fn render_detail(node: &NodeState, tab: ResultTab) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", format!("Test Details for {}:", node.id).bold());

    let Some(results) = &node.results else {
        let _ = writeln!(out, "  {}", "no results received".dimmed());
        return out;
    };

    let shown: Vec<&CheckResult> = results.iter().filter(|r| tab.matches(&r.status)).collect();
    if shown.is_empty() {
        let _ = writeln!(out, "  {}", "no matching checks".dimmed());
    }
    for result in shown {
        let _ = writeln!(out, "  {} - {}", result.name, status_label(&result.status));
        for line in result.output.lines() {
            let _ = writeln!(out, "      {}", line.italic());
        }
    }
    out
}

fn status_label(status: &CheckStatus) -> ColoredString {
    match status {
        CheckStatus::Pass => "PASS".green().bold(),
        CheckStatus::Warn => "WARN".red().bold(),
        CheckStatus::Skip => "SKIP".yellow().bold(),
        CheckStatus::Info => "INFO".blue().bold(),
        CheckStatus::Other(s) => s.as_str().dimmed(),
    }
}
