mod cmd;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "bugfix",
    about = "Browser control panel for a three-phase agent bugfix workflow: analyze a log, plan, fix",
    version,
    propagate_version = true
)]
struct Cli {
    /// Workspace root (default: auto-detect from bugfix.yaml or .git/)
    #[arg(long, global = true, env = "BUGFIX_ROOT")]
    root: Option<PathBuf>,

    /// Settings file (default: <root>/bugfix.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    serve: cmd::serve::ServeArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved configuration instead of serving
    Config,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let root = root::resolve_root(cli.root.as_deref());
    let config = cmd::resolve_config_path(&cwd, cli.config.as_deref());

    let result = match cli.command {
        None => cmd::serve::run(&root, config.as_deref(), cli.serve),
        Some(Commands::Config) => cmd::config::run(&root, config.as_deref(), cli.serve.model),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
