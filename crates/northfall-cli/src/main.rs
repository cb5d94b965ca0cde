mod cmd;
mod output;
mod root;
mod transport;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "winter",
    about = "Northfall terminal: build, test, and deploy contracts from the winter shell",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .northfall/ or .git/)
    #[arg(long, global = true, env = "NORTHFALL_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Defaults to `shell`
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Northfall in the current project
    Init {
        /// User id sent with every job (default: $USER)
        #[arg(long)]
        user_id: Option<String>,
        /// Contract id sent with every job (default: directory name)
        #[arg(long)]
        contract_id: Option<String>,
        /// Human-readable contract name (default: directory name)
        #[arg(long)]
        contract_name: Option<String>,
    },

    /// Open the interactive winter shell
    Shell {
        /// Don't connect to the job server; action commands are not submitted
        #[arg(long)]
        offline: bool,
    },

    /// Run terminal input lines non-interactively
    Exec {
        /// Input lines, one per argument (use `--` before lines starting with `-`)
        #[arg(required = true, value_name = "LINE")]
        lines: Vec<String>,

        /// Submit action commands and wait for their jobs to finish
        #[arg(long)]
        wait: bool,

        /// Seconds to wait for jobs with --wait
        #[arg(long, default_value = "300")]
        timeout: u64,
    },

    /// Show or validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Run the job server
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Some(Commands::Serve { .. }) => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    // Logs go to stderr so stdout stays clean for rendered lines and JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let command = cli.command.unwrap_or(Commands::Shell { offline: false });
    let result = match command {
        Commands::Init {
            user_id,
            contract_id,
            contract_name,
        } => cmd::init::run(
            &root,
            user_id.as_deref(),
            contract_id.as_deref(),
            contract_name.as_deref(),
        ),
        Commands::Shell { offline } => cmd::shell::run(&root, offline),
        Commands::Exec {
            lines,
            wait,
            timeout,
        } => cmd::exec::run(&root, &lines, wait, timeout, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Serve { port } => cmd::serve::run(&root, port),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
