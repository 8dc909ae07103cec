use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{Instrument, info, info_span, warn};

use crate::config::Config;
use crate::http::connection::{Connection, ConnectionId};
use crate::http::state::{CloseReason, Settings};
use crate::store::ConfigStore;

pub async fn run(cfg: &Config, store: Arc<ConfigStore>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    serve(listener, store, cfg.connection_settings()).await
}

/// Accepts connections forever, one task per connection.
pub async fn serve(
    listener: TcpListener,
    store: Arc<ConfigStore>,
    settings: Settings,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "Failed to accept connection");
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };

        let id = ConnectionId::new();
        let span = info_span!("conn", %id, %peer);
        let store = store.clone();
        let settings = settings.clone();

        tokio::spawn(
            async move {
                tracing::debug!("Accepted connection");

                let mut conn = Connection::new(socket, store, settings);
                match conn.run().await {
                    CloseReason::Completed => tracing::debug!("Connection closed"),
                    CloseReason::TimedOut => info!("Connection timed out"),
                    reason => info!(?reason, "Connection aborted"),
                }
            }
            .instrument(span),
        );
    }
}
