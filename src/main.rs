use std::sync::Arc;

use controller::config::Config;
use controller::server;
use controller::store::ConfigStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cfg.log_level()?)
        .init();

    let store = Arc::new(ConfigStore::bootstrap()?);

    tokio::select! {
        res = server::listener::run(&cfg, store) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
