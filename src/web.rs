use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::Result;
use crate::config::ServerConfig;
use crate::orchestrator::AirQualityOrchestrator;
use crate::report::SearchView;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub city: String,
}

pub fn router(orchestrator: Arc<AirQualityOrchestrator>, static_dir: Option<&str>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/search", post(search))
        .route("/state", get(current_state))
        .with_state(orchestrator);

    let mut app = Router::new().nest("/api", api);
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(cors)
}

pub async fn run(config: &ServerConfig, orchestrator: Arc<AirQualityOrchestrator>) -> Result<()> {
    let app = router(orchestrator, config.static_dir.as_deref());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server running at http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn search(
    State(orchestrator): State<Arc<AirQualityOrchestrator>>,
    Json(request): Json<SearchRequest>,
) -> Json<SearchView> {
    let outcome = orchestrator.search_city(&request.city).await;
    tracing::debug!(?outcome, "Search finished");
    Json(SearchView::from_outcome(&request.city, &outcome))
}

async fn current_state(
    State(orchestrator): State<Arc<AirQualityOrchestrator>>,
) -> Json<SearchView> {
    Json(SearchView::from_state(&orchestrator.state()))
}
