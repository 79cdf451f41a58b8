//! HomeFinder API - real-estate listings
//!
//! Realtors list homes, buyers browse them and send inquiries, and admins
//! issue the product keys realtors and admins sign up with. Every route
//! declares the roles it accepts; the access guard checks the bearer token
//! and the user behind it before the handler runs.

mod auth;
mod config;
mod db;
mod error;
mod models;
mod routes;
mod state;
#[cfg(test)]
mod users;

use crate::auth::TokenService;
use crate::config::Settings;
use crate::routes::create_router;
use crate::state::AppState;
use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    info!("🚀 Starting HomeFinder API...");

    // Missing secrets stop startup here
    let settings = Settings::load().context("Invalid configuration")?;
    info!("📋 Configuration loaded successfully");

    let tokens = TokenService::new(&settings.auth.token_secret, settings.auth.token_ttl_secs)
        .context("Cannot build token service")?;
    info!("🔑 Identity tokens valid for {}s", tokens.ttl_secs());

    let pool = db::create_pool(&settings.database)
        .await
        .context("Cannot connect to database")?;
    db::init_schema(&pool)
        .await
        .context("Cannot initialize database schema")?;
    info!("✅ Database ready");

    let state = Arc::new(AppState::new(pool, tokens, &settings.auth));
    let app = create_router(state, &settings);

    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   ─── Authentication ───");
    info!("   POST   /auth/signup/{{userType}}  - Register (REALTOR/ADMIN need a product key)");
    info!("   POST   /auth/signin              - Sign in with email/password");
    info!("   POST   /auth/key                 - Issue a product key (Admin only)");
    info!("   GET    /auth/me                  - Get current user");
    info!("");
    info!("   ─── Homes ───");
    info!("   GET    /home                     - Search listings");
    info!("   GET    /home/{{id}}                - Listing details");
    info!("   POST   /home                     - Create listing (Realtor/Admin)");
    info!("   PUT    /home/{{id}}                - Update own listing (Realtor/Admin)");
    info!("   DELETE /home/{{id}}                - Delete own listing (Realtor/Admin)");
    info!("   POST   /home/{{id}}/inquire        - Message the realtor (Buyer)");
    info!("   GET    /home/{{id}}/messages       - Inquiries for own listing (Realtor/Admin)");
    info!("");
    info!("   ─── Users ───");
    info!("   GET    /user                     - List users (Admin only)");
    info!("   GET    /user/{{id}}                - Get user (Admin only)");
    info!("");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
///
/// `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,homefinder_api=debug,tower_http=debug"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let json_layer = json.then(|| fmt::layer().json().with_target(true).with_current_span(true));
    let compact_layer = (!json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(compact_layer)
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
