//! orinmap-api: REST API for orinmap.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/api/map-upload` | Multipart upload: `orinId`, `measuredAt`, `yamlFile`, `pgmFile` |
//! | GET | `/api/map-data/{orinId}/latest` | Latest map view with signed URLs |
//! | GET | `/healthz` | Liveness probe |

pub mod handlers;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use orinmap_pipeline::{MapQueryService, UploadPipeline};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub upload: UploadPipeline,
    pub query: MapQueryService,
}

/// Build the API router. `max_body_bytes` caps the multipart upload size.
pub fn build_router(state: ApiState, max_body_bytes: usize) -> Router {
    let api_routes = Router::new()
        .route("/map-upload", post(handlers::upload_map))
        .route("/map-data/{orin_id}/latest", get(handlers::latest_map_view))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .route("/healthz", get(handlers::healthz))
}
