use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tablebot_conversation::Script;
use tablebot_integration::WeatherClient;
use tablebot_server::{
    api::{self, AppState},
    config::ServerConfig,
    session::SessionRegistry,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        provider = %config.llm.provider,
        model = config.llm.model(),
        after_booking = ?config.booking.after_booking,
        "Loaded configuration"
    );

    let script = match Script::restaurant() {
        Ok(script) => Arc::new(script),
        Err(report) => {
            tracing::error!(error = %report, "dialogue script is invalid");
            return ExitCode::FAILURE;
        }
    };

    let backend = match tablebot_ai::build_backend(&config.llm) {
        Ok(backend) => backend,
        Err(report) => {
            tracing::error!(error = %report, "failed to set up LLM backend");
            return ExitCode::FAILURE;
        }
    };

    let weather = match WeatherClient::new(config.weather.clone()) {
        Ok(client) => Arc::new(client),
        Err(report) => {
            tracing::error!(error = %report, "failed to set up weather client");
            return ExitCode::FAILURE;
        }
    };

    let sessions = SessionRegistry::new(
        script,
        tablebot_ai::capabilities(backend),
        config.booking.clone(),
        Duration::from_secs(config.session.idle_timeout_minutes.saturating_mul(60)),
    );
    let state = Arc::new(AppState::new(sessions, weather));

    // Spawn periodic session cleanup task
    let cleanup_state = Arc::clone(&state);
    let cleanup_interval_secs = config.session.cleanup_interval_seconds.max(1);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(cleanup_interval_secs));
        loop {
            interval.tick().await;
            cleanup_state.sessions.evict_idle().await;
        }
    });

    let app = api::router(state, &config.cors);

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %config.bind_addr, error = %e, "failed to bind to address");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("listening on http://{}", config.bind_addr);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        tracing::info!("shutting down");
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
