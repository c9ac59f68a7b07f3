use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::task;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chrono::Utc;
use ticketgate::{
    config::Config,
    models::{user::password_digest, Role, User},
    services::reaper::ReaperService,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ticketgate booking engine");

    let reaper_interval = config.booking.reaper_interval_seconds;
    let admin_email = config.auth.admin_email.clone();
    let admin_password = config.auth.admin_password.clone();
    let app_state = AppState::new(config);

    // Bootstrap admin so the service is operable from a cold start.
    app_state
        .store
        .insert_user(User {
            user_id: 1,
            email: admin_email,
            password_digest: password_digest(&admin_password),
            first_name: "Admin".to_string(),
            surname: "User".to_string(),
            role: Role::Admin,
            is_active: true,
            registered_at: Utc::now(),
        })
        .await;

    // --- Start background tasks ---

    // Reaper: sweep abandoned pending bookings on a fixed interval.
    let reaper = ReaperService::new(app_state.store.clone(), app_state.lifecycle.clone());
    task::spawn(async move {
        loop {
            reaper.run_sweep().await;
            tokio::time::sleep(Duration::from_secs(reaper_interval)).await;
        }
    });

    // --- Start the web server ---

    let app = Router::new()
        .route("/", get(|| async { "ticketgate v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", ticketgate::controllers::routes())
        .with_state(app_state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], app_state.config.app.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
