#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]

mod commands;
mod logging;

use clap::Parser;
use commands::serve::ServeAction;
use commands::tree::TreeAction;
use commands::workitems::View;
use miette::{IntoDiagnostic, Result};
use qaboard_core::workitems::QaScope;
use qaboard_core::Config;
use std::time::Duration;
use tracing::Instrument;

#[derive(Parser, Debug)]
#[command(name = "qaboard")]
#[command(author, version, about = "Test-plan trees and QA work-item views from Azure DevOps", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted logs
    #[arg(long, global = true)]
    json: bool,

    /// Maximum concurrent remote requests
    #[arg(long, global = true, value_name = "N")]
    concurrency: Option<usize>,

    /// Deadline for one aggregation, in seconds (0 for none)
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Serve the HTTP API
    Serve {
        /// Port to listen on
        #[arg(long, short = 'p', env = "PORT", default_value_t = 5050)]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Allowed CORS origin ("*" for any)
        #[arg(long, env = "CORS_ORIGIN")]
        cors_origin: Option<String>,
    },

    /// Print the suite tree of a test plan
    Tree {
        /// Test plan id
        plan_id: i64,

        /// Organization (defaults to ADO_ORG_NAME)
        #[arg(long)]
        org: Option<String>,

        /// Project (defaults to ADO_DEFAULT_PROJECT)
        #[arg(long)]
        project: Option<String>,

        /// Fetch extra fields for every test case
        #[arg(long)]
        include_details: bool,

        /// Comma-separated field reference names
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Comma-separated top-level suite names to keep
        #[arg(long, value_delimiter = ',')]
        roots: Vec<String>,
    },

    /// Bugs of an iteration assigned to a QA engineer
    Bugs(QaArgs),

    /// Product backlog items of an iteration assigned to a QA engineer
    Pbis(QaArgs),

    /// Tasks of an iteration assigned to a QA engineer
    Tasks(QaArgs),

    /// Count open bugs by severity
    Severity {
        /// Project (defaults to ADO_DEFAULT_PROJECT)
        #[arg(long)]
        project: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct QaArgs {
    /// Iteration path, e.g. "Project\Sprint 12"
    #[arg(long)]
    iteration_path: String,

    /// QA engineer display name
    #[arg(long)]
    qa_name: String,
}

impl From<QaArgs> for QaScope {
    fn from(args: QaArgs) -> Self {
        QaScope::new(args.iteration_path, args.qa_name)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);
    if let Some(n) = cli.concurrency {
        config = config.with_concurrency(n);
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    logging::init(config.verbosity, config.json_logs);

    let command = match cli.command {
        Some(Commands::Version) | None => return commands::version::run(),
        Some(command) => command,
    };

    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    runtime.block_on(async {
        match command {
            Commands::Version => commands::version::run(),
            Commands::Serve {
                port,
                host,
                cors_origin,
            } => {
                let action = ServeAction {
                    host,
                    port,
                    cors_origin,
                };
                commands::serve::run(config, action)
                    .instrument(tracing::info_span!("serve", cmd = "serve", port))
                    .await
            }
            Commands::Tree {
                plan_id,
                org,
                project,
                include_details,
                fields,
                roots,
            } => {
                let action = TreeAction {
                    plan_id,
                    org,
                    project,
                    include_details,
                    fields,
                    roots,
                };
                commands::tree::run(&config, action).await
            }
            Commands::Bugs(args) => commands::workitems::run(&config, View::Bugs, args.into()).await,
            Commands::Pbis(args) => {
                commands::workitems::run(&config, View::BacklogItems, args.into()).await
            }
            Commands::Tasks(args) => commands::workitems::run(&config, View::Tasks, args.into()).await,
            Commands::Severity { project } => {
                commands::workitems::severity(&config, project.as_deref()).await
            }
        }
    })
}
