mod commands;
mod config;
mod present;

use std::io;

use anyhow::Context;
use tracing::info;

use crate::commands::Session;
use crate::config::Config;

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries the command replies
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatlog=warn,chatlog_db=warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let config = Config::from_env()?;

    let mut store = config.store();
    let transition = store
        .connect()
        .with_context(|| format!("cannot open chat storage at {}", config.medium()))?;
    println!("{}", transition);
    info!("Using {:?} backend at {}", config.backend, config.medium());

    let stdin = io::stdin();
    let stdout = io::stdout();
    Session::new(&mut store, stdin.lock(), stdout.lock(), &config).run()?;

    Ok(())
}
