//! REST API handlers.
//!
//! Handlers delegate to the upload pipeline and query service. Failures are
//! mapped to a status code by kind and reported as a JSON error body.

use axum::Json;
use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use orinmap_pipeline::{MapUpload, PipelineError, UploadedFile};

use crate::ApiState;

/// Body returned by a successful upload.
pub const UPLOAD_CONFIRMATION: &str = "map files uploaded and saved";

/// Error body shape.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
        .into_response()
}

/// Status code for a pipeline failure.
pub fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::InvalidRequest(_)
        | PipelineError::Descriptor(_)
        | PipelineError::Timestamp(_) => StatusCode::BAD_REQUEST,
        PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
        PipelineError::Blob(_) => StatusCode::BAD_GATEWAY,
        PipelineError::State(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn pipeline_error_response(err: &PipelineError) -> Response {
    let status = status_for(err);
    if status.is_server_error() {
        warn!(error = %err, %status, "request failed");
    }
    error_response(&err.to_string(), status)
}

// ── Upload ─────────────────────────────────────────────────────

/// POST /api/map-upload
pub async fn upload_map(State(state): State<ApiState>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(resp) => return resp,
    };

    match state.upload.handle_upload(upload).await {
        Ok(_) => (StatusCode::OK, UPLOAD_CONFIRMATION).into_response(),
        Err(e) => pipeline_error_response(&e),
    }
}

/// Collect the four expected parts. Unknown parts are skipped; a repeated
/// part is rejected.
async fn read_upload(mut multipart: Multipart) -> Result<MapUpload, Response> {
    let mut orin_id = None;
    let mut measured_at = None;
    let mut yaml_file = None;
    let mut pgm_file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "orinId" => set_once(&mut orin_id, &name, field.text().await.map_err(multipart_error)?)?,
            "measuredAt" => {
                set_once(&mut measured_at, &name, field.text().await.map_err(multipart_error)?)?
            }
            "yamlFile" => set_once(&mut yaml_file, &name, read_file(field).await?)?,
            "pgmFile" => set_once(&mut pgm_file, &name, read_file(field).await?)?,
            _ => {}
        }
    }

    Ok(MapUpload {
        orin_id: orin_id.ok_or_else(|| missing("orinId"))?,
        measured_at: measured_at.ok_or_else(|| missing("measuredAt"))?,
        yaml_file: yaml_file.ok_or_else(|| missing("yamlFile"))?,
        pgm_file: pgm_file.ok_or_else(|| missing("pgmFile"))?,
    })
}

async fn read_file(field: Field<'_>) -> Result<UploadedFile, Response> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(multipart_error)?;
    Ok(UploadedFile {
        file_name,
        content_type,
        bytes,
    })
}

/// Keeps axum's status (400, or 413 past the body limit).
fn multipart_error(err: MultipartError) -> Response {
    warn!(error = %err, "rejected multipart body");
    error_response(&err.body_text(), err.status())
}

fn set_once<T>(slot: &mut Option<T>, field: &str, value: T) -> Result<(), Response> {
    if slot.is_some() {
        return Err(error_response(
            &format!("duplicate multipart field `{field}`"),
            StatusCode::BAD_REQUEST,
        ));
    }
    *slot = Some(value);
    Ok(())
}

fn missing(field: &str) -> Response {
    error_response(
        &format!("missing multipart field `{field}`"),
        StatusCode::BAD_REQUEST,
    )
}

// ── Latest view ────────────────────────────────────────────────

/// GET /api/map-data/:orin_id/latest
pub async fn latest_map_view(
    State(state): State<ApiState>,
    Path(orin_id): Path<String>,
) -> Response {
    match state.query.latest_view(&orin_id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => pipeline_error_response(&e),
    }
}

// ── Health ─────────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
