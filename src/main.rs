mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use audit_watch::dashboard::{NodeFilter, ResultTab};
use audit_watch::logging;
use commands::{ConnectArgs, OutputFormat};

#[derive(Parser)]
#[command(
    name = "audit-watch",
    version,
    about = "Poll a swarm audit server and classify each node's results"
)]
struct Cli {
    #[command(flatten)]
    connect: ConnectArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll every node and print the classified swarm
    Dashboard {
        /// Only list nodes in this bucket
        #[arg(long, value_enum, default_value = "all")]
        filter: NodeFilter,

        /// Show check details for this node
        #[arg(long)]
        node: Option<String>,

        /// Which checks to show with --node
        #[arg(long, value_enum, default_value = "all")]
        tab: ResultTab,

        /// Redraw after every node update
        #[arg(long)]
        watch: bool,

        /// Output format (table, json or yaml)
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// List the swarm's node ids
    Nodes {
        /// Output format (table, json or yaml)
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Wait for one node and show its check results
    Results {
        /// Node id
        node: String,

        /// Which checks to show
        #[arg(long, value_enum, default_value = "all")]
        tab: ResultTab,

        /// Output format (table, json or yaml)
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = cli.connect.load_config()?;
    logging::init(&cfg.log);

    match cli.command {
        Commands::Dashboard {
            filter,
            node,
            tab,
            watch,
            format,
        } => commands::dashboard::run(
            cfg,
            commands::dashboard::DashboardArgs {
                filter,
                node,
                tab,
                watch,
                format,
            },
        ),
        Commands::Nodes { format } => commands::nodes::run(cfg, format),
        Commands::Results { node, tab, format } => {
            commands::results::run(cfg, &node, tab, format)
        }
    }
}
