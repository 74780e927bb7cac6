use anyhow::Result;
use std::sync::Arc;

use spotify_relay::{auth, config, http_client, middleware, routes};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let config = config::Config::load()?;
    config.validate()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Spotify Relay starting...");
    tracing::info!(
        "Server configured: {}:{}",
        config.server_host,
        config.server_port
    );

    let http_client = Arc::new(http_client::SpotifyHttpClient::new(&config)?);
    tracing::info!(
        "HTTP client initialized (accounts: {}, api: {})",
        config.accounts_url,
        config.api_url
    );

    let credential_cache = Arc::new(auth::CredentialCache::new(
        http_client.clone(),
        config.token_refresh_threshold,
    ));

    // Check the client credentials by getting a token up front
    match credential_cache.acquire().await {
        Ok(token) => {
            tracing::info!(
                "Client credentials valid (token: {}...)",
                auth::token_prefix(&token)
            );
        }
        Err(e) => {
            tracing::error!("Client credentials check failed: {}", e);
            tracing::warn!(
                "Server will start but tempo lookups will fail until Spotify accepts the credentials"
            );
        }
    }

    let app_state = routes::AppState {
        credential_cache,
        http_client,
        config: Arc::new(config.clone()),
    };

    let app = build_app(app_state);

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    print_startup_banner(&config);

    tracing::info!("Spotify token server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Build the application with all routes and middleware
fn build_app(state: routes::AppState) -> axum::Router {
    use axum::Router;

    Router::new()
        .merge(routes::health_routes(state.clone()))
        .merge(routes::token_routes(state.clone()))
        .merge(routes::data_routes(state))
        // Middleware stack: CORS → request logging
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(middleware::cors_layer())
}

/// Print startup banner
fn print_startup_banner(config: &config::Config) {
    println!();
    println!("  Spotify Relay {}", env!("CARGO_PKG_VERSION"));
    println!(
        "  Server:       http://{}:{}",
        config.server_host, config.server_port
    );
    println!("  Accounts:     {}", config.accounts_url);
    println!("  Web API:      {}", config.api_url);
    println!("  Redirect URI: {}", config.redirect_uri);
    println!("  Log Level:    {}", config.log_level);
    println!();
}

/// Handle graceful shutdown signal
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
