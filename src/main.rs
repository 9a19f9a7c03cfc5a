use anyhow::Context;
use set_store::commands::{split_args, CommandDispatcher};
use set_store::{SetStore, StoreConfig};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => StoreConfig::from_file(&path)?,
        None => StoreConfig::default(),
    };

    // Initialize logging; stdout carries replies only
    let filter = EnvFilter::try_from_env("SET_STORE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    info!("Set-Store starting...");
    info!("Lock stripes: {}", config.lock_stripes);

    let store = Arc::new(SetStore::with_stripes(config.lock_stripes));
    let dispatcher = CommandDispatcher::new(store);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        let args = match split_args(&line) {
            Ok(args) if args.is_empty() => continue,
            Ok(args) => args,
            Err(e) => {
                warn!("Rejected request: {}", e);
                stdout.write_all(format!("(error) ERR {}\n", e).as_bytes()).await?;
                continue;
            }
        };

        if args[0].eq_ignore_ascii_case(b"QUIT") || args[0].eq_ignore_ascii_case(b"EXIT") {
            break;
        }

        let reply = dispatcher.dispatch(args);
        stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
        stdout.flush().await?;
    }

    stdout.flush().await?;
    info!("Set-Store shutting down, {} keys in memory", dispatcher.store().len());
    Ok(())
}
