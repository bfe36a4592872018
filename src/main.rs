use std::sync::Arc;

use eshoku::{api::HttpBackend, build_app, config::Config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "eshoku=debug,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = Config::from_env()?;
    let backend = HttpBackend::new(&config.api_base_url, config.api_timeout)?;
    let addr = config.addr()?;
    tracing::info!(api = %config.api_base_url, date_style = %config.date_style, "configured");

    let app_state = AppState::new(config, Arc::new(backend)).map_err(|e| e.0)?;
    let app = build_app(app_state);

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
