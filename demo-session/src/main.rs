use axum::{Router, routing::get};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alo_session::SessionConfig;

mod handlers;
mod server;
mod state;

use crate::{
    handlers::{form, index, logout, submit_form},
    server::spawn_http_server,
    state::{AppState, connect_store},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(SessionConfig::from_env()?);
    let store_url = std::env::var("SESSION_STORE_URL").unwrap_or_else(|_| "memory".to_string());
    let store = connect_store(&store_url, &config).await?;

    let state = AppState { store, config };

    let app = Router::new()
        .route("/", get(index))
        .route("/form", get(form).post(submit_form))
        .route("/logout", get(logout))
        .with_state(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(3001);

    spawn_http_server(port, app).await.await??;
    Ok(())
}
