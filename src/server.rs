use std::{future::Future, sync::Arc};

use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info};

use crate::{
    app_state::AppState,
    assets::AssetStore,
    config::Config,
    error::Result,
    handle_connection,
    storage::{MessageStore, SqliteStore},
};

/// Opens the store, binds the listener and serves until `shutdown` resolves.
pub async fn run<F>(config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    info!("Opening database...");
    let store = SqliteStore::open(&config.data_path).await?;
    store.initialize().await?;
    let store: Arc<dyn MessageStore> = Arc::new(store);

    let state = Arc::new(AppState::new(
        Arc::clone(&store),
        AssetStore::new(&config.static_dir),
    ));

    let listener = TcpListener::bind(config.addr()).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    serve(listener, state, shutdown).await;

    info!("Shutting down...");
    store.close().await;
    info!("Database connection closed.");
    Ok(())
}

/// Accepts connections until `shutdown` resolves, one task per connection.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        debug!("Accepted connection from {}", peer);
                        let state = Arc::clone(&state);
                        tokio::spawn(handle_connection(stream, state));
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    },
                }
            }
            _ = &mut shutdown => {
                break;
            }
        }
    }
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    // wait for any of the termination signals
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
