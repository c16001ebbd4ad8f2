use std::sync::Arc;

use car_rental::{app, config::AppConfig, db, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "car_rental=debug,axum=info,tower_http=info".to_string());
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

    let config = Arc::new(AppConfig::from_env()?);
    if config.webhook_token.is_none() {
        tracing::warn!("WEBHOOK_TOKEN not set; payment webhooks will be rejected");
    }

    let pool = db::connect(&config).await?;
    db::migrate(&pool).await;

    let state = AppState::from_pg(config.clone(), pool);
    app::serve(app::build_app(state), &config.host, config.port).await
}
