mod actions;
mod local_commands;
mod serve_command;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "chatops", about = "chatops: chat command bot", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Config file (default: discover chatops.{toml,yaml,yml,json}).
    #[arg(long, global = true, env = "CHATOPS_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway and Slack sessions (default when no subcommand is provided).
    Serve,
    /// Show how a message is split into an action name and arguments.
    Parse {
        /// Message text, quoted as a single shell argument.
        text: String,
    },
    /// Dispatch a message locally, printing every reply to stdout.
    Run {
        /// Name the action sees as the invoking user.
        #[arg(long, default_value = "local")]
        user: String,
        /// Message text, quoted as a single shell argument.
        text: String,
    },
}

/// Initialise tracing. Logs go to stderr so command output stays clean.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "chatops starting");

    match &cli.command {
        // Default: serve when no subcommand is provided
        None | Some(Commands::Serve) => serve_command::serve(&cli).await,
        Some(Commands::Parse { text }) => local_commands::print_parse(text),
        Some(Commands::Run { user, text }) => local_commands::run_local(user, text).await,
    }
}
