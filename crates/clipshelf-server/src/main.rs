//! The clipshelf server binary.

use anyhow::Context;
use clipshelf_server::{demo_seed, Server, ServerConfig};
use clipshelf_store::MemoryStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from_env();
    let store = Arc::new(MemoryStore::with_seed(demo_seed()));

    Server::new(config, store)
        .run()
        .await
        .context("server terminated")?;
    Ok(())
}
