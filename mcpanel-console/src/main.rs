//! mcpanel console: line-oriented operator front end.
//!
//! ```text
//! mcpanel-console                       Connect with defaults
//! mcpanel-console --config <path>       Use custom config TOML
//! mcpanel-console --host h --port p     Override the peer address
//! mcpanel-console --gen-config          Dump default config and exit
//! ```

mod commands;
mod render;

use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mcpanel_core::{Dashboard, Input, PanelConfig};

use crate::commands::{HELP, Line, parse_line};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "mcpanel-console", about = "Game server management console")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "mcpanel.toml")]
    config: PathBuf,

    /// Peer host (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Peer port (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        println!("{}", PanelConfig::default_toml()?);
        return Ok(());
    }

    let mut config = PanelConfig::load(&cli.config);
    if let Some(host) = cli.host {
        config.network.host = host;
    }
    if let Some(port) = cli.port {
        config.network.port = port;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("mcpanel-console v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Dashboard ────────────────────────────────────────────

    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let mut dashboard = Dashboard::websocket(&config, input_tx.clone())?;
    let mut view_rx = dashboard.subscribe();
    let driver = tokio::spawn(dashboard.run(input_rx));

    // ── 2. View printer ─────────────────────────────────────────

    let printer = tokio::spawn(async move {
        while let Some(event) = view_rx.recv().await {
            println!("{}", render::render(&event));
        }
    });

    // ── 3. Operator input ───────────────────────────────────────

    println!("type 'help' for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(&line) {
                    Ok(Line::Action(action)) => input_tx.send(Input::User(action))?,
                    Ok(Line::Help) => println!("{HELP}"),
                    Ok(Line::Quit) => break,
                    Ok(Line::Empty) => {}
                    Err(e) => println!("! {e}"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    input_tx.send(Input::Shutdown)?;
    driver.await?;
    printer.abort();
    info!("bye");
    Ok(())
}
