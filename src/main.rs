// Entrypoint for the `logbook` CLI.
// - Parses flags into an explicit `Config`, builds the client for the chosen
//   transport and hands both to the command handler.
// - Failures are printed on stdout by the handlers; the exit status reports
//   whether the command succeeded.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use logbook_cli::api;
use logbook_cli::config::{Config, Transport};
use logbook_cli::ui::{self, Outcome, TerminalPasswordReader};

#[derive(Parser)]
#[command(name = "logbook")]
#[command(about = "Log in to the logbook server and send it messages")]
#[command(version)]
struct Cli {
    /// Wire transport used to reach the server
    #[arg(long, value_enum, global = true, env = "LOGBOOK_TRANSPORT", default_value_t = Transport::Http)]
    transport: Transport,

    /// Server address (defaults depend on the transport)
    #[arg(long, global = true, env = "LOGBOOK_SERVER")]
    server: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "LOGBOOK_TIMEOUT_SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    /// Where the session token is kept
    #[arg(long, global = true, env = "LOGBOOK_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with username and password
    Login {
        /// Username
        #[arg(short, long, value_parser = NonEmptyStringValueParser::new())]
        username: String,
    },
    /// Send message to server
    Run {
        /// Message to send
        #[arg(short, long, value_parser = NonEmptyStringValueParser::new())]
        name: String,
    },
}

/// Logs go to stderr; RUST_LOG controls the level (default: warn).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match execute(cli) {
        Ok(Outcome::Succeeded) => ExitCode::SUCCESS,
        Ok(Outcome::Failed) => ExitCode::FAILURE,
        Err(e) => {
            println!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<Outcome> {
    let config = Config::from_options(cli.transport, cli.server, cli.timeout_secs, cli.token_file);
    debug!(transport = %config.transport, server = %config.server, "configured");

    let client = api::connect(&config).context("Failed to create client")?;
    let store = config.session_store();
    let mut out = io::stdout().lock();

    let outcome = match cli.command {
        Commands::Login { username } => ui::login(
            &username,
            client.as_ref(),
            &store,
            &TerminalPasswordReader,
            &mut out,
        ),
        Commands::Run { name } => ui::run(&name, client.as_ref(), &store, &mut out),
    }
    .context("Failed to write output")?;
    Ok(outcome)
}
