use std::net::SocketAddr;
use std::sync::Arc;

use meridian_api::{app, state::AuthConfig, AppState};
use meridian_store::{
    DbClient, PostgresCalendarStore, PostgresInventory, PostgresPaymentMethodStore,
    PostgresTripStore, RedisClient, RedisIdempotencyStore,
};
use meridian_trip::checkout::CheckoutService;
use meridian_trip::draft::DraftService;
use meridian_trip::manager::TripManager;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meridian_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = meridian_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Meridian API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let redis = RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");

    let trips = Arc::new(PostgresTripStore::new(db.pool.clone()));
    let calendar = Arc::new(PostgresCalendarStore::new(db.pool.clone()));
    let payments = Arc::new(PostgresPaymentMethodStore::new(db.pool.clone()));
    let inventory = Arc::new(PostgresInventory::new(db.pool.clone()));
    let ledger = Arc::new(RedisIdempotencyStore::new(redis));

    let checkout = Arc::new(CheckoutService::new(
        trips.clone(),
        calendar.clone(),
        payments.clone(),
        ledger,
    ));
    let drafts = Arc::new(DraftService::new(
        trips.clone(),
        inventory.clone(),
        inventory.clone(),
        inventory,
        config.heuristics.clone().into_rules(),
    ));
    let manager = Arc::new(TripManager::new(trips.clone()));

    let app_state = AppState {
        trips,
        calendar,
        payments,
        checkout,
        drafts,
        manager,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
