use axum::{routing::get, Router};
use std::net::SocketAddr;
use talent_pool_backend::{
    config::{get_config, init_config},
    database::{pool::create_pool, seed::seed_candidates},
    middleware::cors::cors_layer,
    routes, AppState,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    if config.seed_on_start {
        seed_candidates(&pool).await?;
    }

    let app_state = AppState::new(pool);

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let candidate_api = Router::new()
        .route(
            "/candidates",
            get(routes::candidate_routes::list_candidates),
        )
        .route(
            "/candidates/:id",
            get(routes::candidate_routes::get_candidate)
                .patch(routes::candidate_routes::update_candidate),
        )
        .route(
            "/candidates/:id/related",
            get(routes::candidate_routes::related_candidates),
        )
        .layer(axum::middleware::from_fn(
            talent_pool_backend::middleware::auth::require_api_key,
        ))
        .layer(axum::middleware::from_fn_with_state(
            talent_pool_backend::middleware::rate_limit::new_rps_state(config.api_rps),
            talent_pool_backend::middleware::rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(candidate_api)
        .with_state(app_state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
