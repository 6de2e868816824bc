use anyhow::{anyhow, Context, Result};
use bugfix_server::config::{self, ServerConfig, API_KEY_ENV};
use bugfix_server::state::AppState;
use claude_agent::Dispatcher;
use clap::Args;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (0 = OS-assigned)
    #[arg(long, default_value = "8000", env = "BUGFIX_PORT")]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Don't open the browser
    #[arg(long)]
    pub no_open: bool,

    /// Model identifier for every agent task
    #[arg(long, env = "BUGFIX_MODEL")]
    pub model: Option<String>,
}

/// Startup: validate configuration, build the agent once, then serve until
/// Ctrl-C. Any configuration problem aborts before the port is bound.
///
/// `config_path` must already be absolute; the process changes into `root`.
pub fn run(root: &Path, config_path: Option<&Path>, args: ServeArgs) -> Result<()> {
    let root = root
        .canonicalize()
        .with_context(|| format!("workspace {} not found", root.display()))?;
    std::env::set_current_dir(&root)?;
    tracing::info!(workspace = %root.display(), "workspace");

    let file = super::load_file_config(&root, config_path)?;
    super::load_dotenv(&root);
    let api_key = config::require_env(API_KEY_ENV)?;
    let agent = config::agent_config(&root, &file, api_key, args.model)?;
    check_agent_executable(agent.executable.as_deref())?;

    let server = ServerConfig::from_file(&root, &file);
    std::fs::create_dir_all(root.join(&server.log_dir))
        .with_context(|| format!("cannot create log directory {}", server.log_dir.display()))?;

    tracing::info!(
        model = %agent.model,
        branch = %server.branch,
        report = %server.report_path,
        "agent initialized"
    );
    let state = AppState::new(server, Dispatcher::new(agent));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port))
            .await
            .with_context(|| format!("cannot bind {}:{}", args.host, args.port))?;

        tokio::select! {
            res = bugfix_server::serve_on(state, listener, !args.no_open) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    })
}

/// The agent binary must be resolvable before any request can use it.
pub fn check_agent_executable(configured: Option<&str>) -> Result<()> {
    let exe = configured.unwrap_or("claude");
    which::which(exe).map(|_| ()).map_err(|_| {
        anyhow!(
            "agent executable '{exe}' not found; install the Claude CLI or set claude_path in bugfix.yaml"
        )
    })
}
