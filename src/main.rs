use experience_booking::adapter::driven::{
    MySqlAvailabilityStore, MySqlBookingRepository, MySqlExperienceCatalog, TracingEventPublisher,
};
use experience_booking::adapter::driver::rest_api::{create_router, AppState};
use experience_booking::adapter::{BookingConfig, DatabaseConfig, DatabaseMigration};
use experience_booking::application::service::{
    AvailabilityApplicationService, BookingAdmissionService, BookingQueryService,
};

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("experience_booking=info,tower_http=info")),
        )
        .init();

    // 設定を読み込む
    let config = DatabaseConfig::from_env()?;
    let booking_config = BookingConfig::from_env()?;
    info!(
        host = %config.host,
        port = config.port,
        store_timeout_ms = booking_config.store_timeout.as_millis() as u64,
        "configuration loaded"
    );

    // 接続プールを作成
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.connection_string())
        .await?;

    // マイグレーションを実行
    DatabaseMigration::new(pool.clone()).run().await?;

    // ポートの実装を作成
    let catalog = Arc::new(MySqlExperienceCatalog::new(pool.clone()));
    let availability = Arc::new(MySqlAvailabilityStore::new(pool.clone()));
    let bookings = Arc::new(MySqlBookingRepository::new(pool.clone()));
    let publisher = Arc::new(TracingEventPublisher::new());

    // アプリケーションサービスを作成
    let admission_service = BookingAdmissionService::new(
        catalog.clone(),
        availability.clone(),
        bookings.clone(),
        publisher,
        booking_config.store_timeout,
    );
    let availability_service =
        AvailabilityApplicationService::new(catalog, availability, booking_config.store_timeout);
    let query_service = BookingQueryService::new(bookings, booking_config.store_timeout);

    let app_state = AppState {
        admission_service: Arc::new(admission_service),
        availability_service: Arc::new(availability_service),
        query_service: Arc::new(query_service),
        seed_days: booking_config.seed_days,
    };

    let app = create_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(booking_config.bind_address).await?;
    info!(address = %booking_config.bind_address, "REST API server started");

    axum::serve(listener, app).await?;

    Ok(())
}
