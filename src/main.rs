use std::net::SocketAddr;
use sync_dashboard::{AppState, Config, refresh_modules, router, spawn_ticker};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(
        backend = %config.api_base_url,
        weekday = %config.anchor.describe_weekday(),
        time = %config.anchor.describe_time(),
        timezone = config.anchor.timezone.name(),
        "starting sync dashboard"
    );

    let state = AppState::new(config)?;
    if let Err(err) = refresh_modules(&state).await {
        warn!("initial module load failed: {err}");
    }
    let ticker = spawn_ticker(state.clone()).await;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{addr}");

    let signal_state = state.clone();
    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutdown requested");
            signal_state.teardown();
        })
        .await?;

    state.teardown();
    ticker.await?;
    info!("dashboard stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
