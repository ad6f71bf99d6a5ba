// Agri Advisor API v0.1
use axum::routing::{get, post};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod errors;
mod helpers;
mod routes;
mod services;

use config::AppConfig;
use db::store::PgStore;
use routes::health::HealthState;
use routes::recommendations::AppState;
use services::geocoding::CoordinateResolver;
use services::live_weather::LiveWeatherClient;
use services::prediction::PredictionClient;
use services::recommendation::RecommendationPipeline;

/// Maximum number of connections in the database pool.
const DB_POOL_MAX_CONNECTIONS: u32 = 10;
/// Minimum number of connections kept alive in the database pool.
const DB_POOL_MIN_CONNECTIONS: u32 = 2;

/// Agri Advisor API OpenAPI specification.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agri Advisor API",
        version = "0.1.0",
        description = "Crop recommendations for Indian districts. Combines stored soil and \
            weather aggregates (or live weather from Open-Meteo) with an external prediction \
            service, matches the ranked crops against the catalog and keeps an auditable \
            record of every run.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Recommendations", description = "Crop recommendation runs and history"),
        (name = "Locations", description = "Processed district data"),
        (name = "Crops", description = "Crop catalog"),
    ),
    paths(
        routes::health::health_check,
        routes::recommendations::create_recommendation,
        routes::recommendations::generate_recommendation,
        routes::recommendations::list_recommendations,
        routes::recommendations::get_recommendation,
        routes::locations::list_states,
        routes::locations::list_districts,
        routes::locations::get_location,
        routes::crops::list_crops,
        routes::crops::get_crop,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::recommendations::RecommendationBody,
            routes::recommendations::RecommendationRecord,
            services::recommendation::RecommendationOutcome,
            services::reconcile::RecommendationEntry,
            services::prediction::YieldPrediction,
            services::prediction::EnvironmentalFactors,
            services::snapshot::EnvironmentalSnapshot,
            services::snapshot::SoilSnapshot,
            services::snapshot::WeatherSnapshot,
            routes::locations::LocationResponse,
            db::models::SoilData,
            db::models::WeatherData,
            db::models::StatSummary,
            db::models::YieldRecord,
            db::models::Season,
            routes::crops::CropResponse,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agri_advisor_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Starting in {} environment", config.app_env);

    // Set up database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(DB_POOL_MAX_CONNECTIONS)
        .min_connections(DB_POOL_MIN_CONNECTIONS)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Outbound clients, each with its own timeout
    let resolver = CoordinateResolver::new(
        &config.geocoding_api_url,
        &config.geocoding_country_code,
        &config.geocoding_language,
        config.geocoding_timeout,
    )
    .expect("Failed to build geocoding client");
    let weather = LiveWeatherClient::new(&config.weather_api_url, config.weather_timeout)
        .expect("Failed to build weather client");
    let predictor = PredictionClient::new(&config.ml_service_url, config.prediction_timeout)
        .expect("Failed to build prediction client");

    tracing::info!("Prediction service at {}", config.ml_service_url);

    let store = Arc::new(PgStore::new(pool.clone()));
    let app_state = AppState {
        pipeline: RecommendationPipeline::new(
            store.clone(),
            store.clone(),
            store.clone(),
            resolver,
            weather,
            predictor.clone(),
        ),
        records: store,
    };

    // CORS: browser clients read and submit recommendations
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    // Build router
    // Catalog and location routes use PgPool state directly; recommendation
    // routes go through the pipeline and store traits.
    let recommendation_routes = Router::new()
        .route(
            "/api/v1/recommendations",
            post(routes::recommendations::create_recommendation)
                .get(routes::recommendations::list_recommendations),
        )
        .route(
            "/api/v1/recommendations/generate",
            post(routes::recommendations::generate_recommendation),
        )
        .route(
            "/api/v1/recommendations/:id",
            get(routes::recommendations::get_recommendation),
        )
        .with_state(app_state);

    let location_routes = Router::new()
        .route(
            "/api/v1/locations/states",
            get(routes::locations::list_states),
        )
        .route(
            "/api/v1/locations/districts/:state",
            get(routes::locations::list_districts),
        )
        .route(
            "/api/v1/locations/:state/:district",
            get(routes::locations::get_location),
        )
        .with_state(pool.clone());

    let crop_routes = Router::new()
        .route("/api/v1/crops", get(routes::crops::list_crops))
        .route("/api/v1/crops/:id", get(routes::crops::get_crop))
        .with_state(pool.clone());

    // Health check covers the database and the prediction service
    let health_routes = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .with_state(HealthState { pool, predictor });

    let app = Router::new()
        .merge(health_routes)
        .merge(recommendation_routes)
        .merge(location_routes)
        .merge(crop_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
