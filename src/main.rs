use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use axum_booking_api::{
    app::build_router,
    config::AppConfig,
    db::{create_pool, run_migrations},
    identity::AppleIdentityVerifier,
    notifications::ExpoNotifier,
    state::AppState,
    storage::LocalBlobStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,axum_booking_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let blobs = LocalBlobStore::new(&config.upload_dir, &config.public_base_url);
    let notifier = ExpoNotifier::new(&config.expo_push_url, config.expo_access_token.clone())?;
    let identity = AppleIdentityVerifier::new(config.apple_client_id.clone())?;
    if config.apple_client_id.is_none() {
        tracing::warn!("APPLE_CLIENT_ID is not set; Apple sign-in is disabled");
    }

    let state = AppState::new(
        pool,
        &config,
        Arc::new(notifier),
        Arc::new(blobs),
        Arc::new(identity),
    );
    let app = build_router(state, &config);

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
