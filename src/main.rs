//! PropBazaar billing service entry point.

use std::sync::Arc;

use axum::{middleware, routing::get, Json, Router};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use propbazaar::adapters::http::middleware::{auth_middleware, AuthState, TokenValidator};
use propbazaar::adapters::http::{payments_router, PaymentsAppState};
use propbazaar::adapters::postgres::{
    PostgresAddonRepository, PostgresPaymentRepository, PostgresPlanRepository,
    PostgresSubscriptionRepository,
};
use propbazaar::adapters::razorpay::{FallbackGateway, RazorpayAdapter};
use propbazaar::config::AppConfig;
use propbazaar::domain::billing::PaymentSignatureVerifier;
use propbazaar::ports::PaymentGateway;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.server.log_level))
        .init();

    info!(
        environment = ?config.server.environment,
        "starting propbazaar billing service"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database migrations applied");
    }

    // Gateway: real adapter, optionally wrapped so an unreachable gateway
    // degrades to synthetic orders outside production.
    let razorpay = Arc::new(RazorpayAdapter::new(&config.payment));
    let gateway: Arc<dyn PaymentGateway> =
        if config.payment.allow_mock_fallback && !config.is_production() {
            info!("gateway fallback enabled; outages will mint synthetic orders");
            Arc::new(FallbackGateway::new(razorpay))
        } else {
            razorpay
        };

    let verifier = Arc::new(PaymentSignatureVerifier::new(
        config.payment.razorpay_key_secret.clone(),
        config.payment.razorpay_webhook_secret.clone(),
    ));

    let state = PaymentsAppState {
        plans: Arc::new(PostgresPlanRepository::new(pool.clone())),
        addons: Arc::new(PostgresAddonRepository::new(pool.clone())),
        subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        payments: Arc::new(PostgresPaymentRepository::new(pool)),
        gateway,
        verifier,
        amount_tolerance: config.payment.amount_tolerance,
        key_id: config.payment.razorpay_key_id.clone(),
    };

    let auth_state: AuthState = Arc::new(TokenValidator::new(&config.auth.jwt_secret));

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", payments_router())
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(config.server.request_timeout()))
                .layer(cors_layer(&config)),
        )
        .with_state(state);

    let addr = config.server.socket_addr()?;
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<axum::http::HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    }
}
