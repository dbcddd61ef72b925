//! rota-server - HTTP server binary.

use std::net::SocketAddr;

use rota_core::RotaConfig;
use rota_server::{create_app, create_server, create_server_with_auth};
use tokio::signal;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("rota_server=debug".parse()?)
                .add_directive("rota_core=debug".parse()?),
        )
        .init();

    // Load and check configuration
    let config = RotaConfig::load()?;
    config.validate()?;

    let host = std::env::var("ROTA_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("ROTA_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .map_err(|e| format!("ROTA_PORT must be a valid port number: {}", e))?;
    let require_auth = std::env::var("ROTA_REQUIRE_AUTH").is_ok();

    // Build the application and start the background jobs
    let (state, runtime) = create_app(&config).await?;
    runtime.start().await?;
    info!(
        pairs = state.engine.pair_count()?,
        channel = %config.bot.reminder_channel,
        "Rotation jobs started"
    );
    let state = state.with_runtime(runtime);

    // Create server with or without auth
    let app = if require_auth {
        let api_key = std::env::var("ROTA_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            warn!("ROTA_REQUIRE_AUTH is set but ROTA_API_KEY is empty; requests are not checked");
        }
        info!("Authentication enabled");
        create_server_with_auth(state.clone(), api_key)
    } else {
        info!("Authentication disabled");
        create_server(state.clone())
    };

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting rota-server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received, stopping jobs...");
        })
        .await?;

    // Explicit shutdown of runtime
    if let Some(mut runtime) = state.take_runtime().await {
        runtime.shutdown().await?;
    }

    info!("Server stopped cleanly");
    Ok(())
}
