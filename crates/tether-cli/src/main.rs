//! Tether host binary
//!
//! Drives the portal switch, access gate and funnels against simulated
//! backends. Commands are read line by line from stdin, so a session can be
//! scripted:
//!
//! ```text
//! echo -e "user\ngo rental-home\ngo user-profile\nback" | tether --user kim
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tether_app::TetherConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod commands;
mod shell;

use commands::Command;
use shell::{Reply, Shell};

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Tether - navigation and access controller shell", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, default_value = "tether.toml")]
    config: PathBuf,

    /// Startup query string, e.g. `portal=admin`
    #[arg(short, long)]
    query: Option<String>,

    /// Start signed in as this user
    #[arg(short, long)]
    user: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = TetherConfig::load(&cli.config)?;
    tracing::debug!(?config, "configuration loaded");

    let mut shell = Shell::new(config);
    if let Some(user) = &cli.user {
        shell = shell.with_user(user);
    }
    println!("{}", shell.bootstrap(cli.query.as_deref()).await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(error) => {
                println!("error: {error}");
                continue;
            }
        };
        match shell.execute(command).await {
            Ok(Reply::Output(out)) => println!("{out}"),
            Ok(Reply::Quit) => break,
            Err(error) => println!("error: {error:#}"),
        }
    }

    Ok(())
}
