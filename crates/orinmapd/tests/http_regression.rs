//! HTTP regression tests.
//!
//! Drives the assembled router end to end: multipart upload into an
//! in-memory object store and state store, then the latest-view query.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use orinmap_api::{ApiState, build_router};
use orinmap_blob::BlobStore;
use orinmap_pipeline::{MapQueryService, Reconciler, UploadPipeline};
use orinmap_state::StateStore;
use tower::ServiceExt;

const BOUNDARY: &str = "orinmap-test-boundary";

const DESCRIPTOR: &[u8] = b"image: map.pgm\nresolution: 0.05\norigin: [-10.0, -10.0, 0.0]\noccupied_thresh: 0.65\nfree_thresh: 0.196\nnegate: 0\n";

const RASTER: &[u8] = b"P5\n2 2\n255\n\x00\xff\xff\x00";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(name, file_name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/map-upload")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn full_upload<'a>(orin_id: &'a str, measured_at: &'a str, descriptor: &'a [u8]) -> Vec<Part<'a>> {
    vec![
        Part::Text("orinId", orin_id),
        Part::Text("measuredAt", measured_at),
        Part::File("yamlFile", "map.yaml", descriptor),
        Part::File("pgmFile", "map.pgm", RASTER),
    ]
}

fn latest_request(orin_id: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/api/map-data/{orin_id}/latest"))
        .body(Body::empty())
        .unwrap()
}

struct Harness {
    router: Router,
    blobs: BlobStore,
    state: StateStore,
}

fn harness_with_limit(max_body_bytes: usize) -> Harness {
    let blobs = BlobStore::in_memory("http://maps.test/blobs/").unwrap();
    let state = StateStore::open_in_memory().unwrap();
    let api_state = ApiState {
        upload: UploadPipeline::new(blobs.clone(), state.clone()),
        query: MapQueryService::new(blobs.clone(), state.clone(), Duration::from_secs(600)),
    };
    Harness {
        router: build_router(api_state, max_body_bytes),
        blobs,
        state,
    }
}

fn harness() -> Harness {
    harness_with_limit(1024 * 1024)
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

#[tokio::test]
async fn upload_then_fetch_latest_view() {
    let h = harness();

    let resp = h
        .router
        .clone()
        .oneshot(upload_request(&full_upload("orin-1", "2025-07-24T15:00:00", DESCRIPTOR)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, b"map files uploaded and saved");

    let resp = h.router.oneshot(latest_request("orin-1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;

    assert_eq!(json["resolution"], 0.05);
    assert_eq!(json["originX"], -10.0);
    assert_eq!(json["originY"], -10.0);
    assert_eq!(json["originTheta"], 0.0);
    assert_eq!(json["occupiedThresh"], 0.65);
    assert_eq!(json["freeThresh"], 0.196);
    assert_eq!(json["negate"], false);

    let pgm_url = json["pgmUrl"].as_str().unwrap();
    let yaml_url = json["yamlUrl"].as_str().unwrap();
    assert!(pgm_url.starts_with("http://maps.test/blobs/maps/orin-1/"));
    assert!(pgm_url.contains("_map.pgm?"));
    assert!(yaml_url.contains("_map.yaml?"));

    let record = h.state.latest_map_data("orin-1").unwrap().unwrap();
    assert_eq!(h.blobs.get(&record.pgm_key).await.unwrap().as_ref(), RASTER);
}

#[tokio::test]
async fn latest_view_tracks_newest_measurement() {
    let h = harness();
    let older = b"resolution: 0.1\norigin: [0, 0, 0]\noccupied_thresh: 0.65\nfree_thresh: 0.2\n";

    for (measured_at, descriptor) in [
        ("2025-07-24T15:00:00", DESCRIPTOR),
        ("2025-07-23T15:00:00", older.as_slice()),
    ] {
        let resp = h
            .router
            .clone()
            .oneshot(upload_request(&full_upload("orin-1", measured_at, descriptor)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let json = body_json(h.router.oneshot(latest_request("orin-1")).await.unwrap()).await;
    assert_eq!(json["resolution"], 0.05);
    assert_eq!(h.state.list_devices().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_device_is_404_with_error_body() {
    let h = harness();
    let resp = h.router.oneshot(latest_request("never-seen")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let json = body_json(resp).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("never-seen"));
}

#[tokio::test]
async fn missing_part_is_400() {
    let h = harness();
    let parts = [
        Part::Text("orinId", "orin-1"),
        Part::Text("measuredAt", "2025-07-24T15:00:00"),
        Part::File("yamlFile", "map.yaml", DESCRIPTOR),
    ];

    let resp = h.router.oneshot(upload_request(&parts)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].as_str().unwrap().contains("pgmFile"));
    assert!(h.state.list_orphans().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_part_is_400() {
    let h = harness();
    let mut parts = full_upload("orin-1", "2025-07-24T15:00:00", DESCRIPTOR);
    parts.push(Part::Text("orinId", "orin-2"));

    let resp = h.router.oneshot(upload_request(&parts)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].as_str().unwrap().contains("duplicate"));
    assert!(h.state.list_devices().unwrap().is_empty());
}

#[tokio::test]
async fn bad_descriptor_is_400_and_orphans_are_swept() {
    let h = harness();
    let descriptor = b"origin: [0, 0, 0]\noccupied_thresh: 0.65\nfree_thresh: 0.196\n";

    let resp = h
        .router
        .clone()
        .oneshot(upload_request(&full_upload("orin-1", "2025-07-24T15:00:00", descriptor)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].as_str().unwrap().contains("resolution"));

    // Nothing reached the database; both objects stay until a sweep.
    assert!(h.state.get_device("orin-1").unwrap().is_none());
    let orphans = h.state.list_orphans().unwrap();
    assert_eq!(orphans.len(), 2);
    for orphan in &orphans {
        assert!(h.blobs.exists(&orphan.key).await.unwrap());
    }

    let resp = h.router.oneshot(latest_request("orin-1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let reconciler = Reconciler::new(h.blobs.clone(), h.state.clone(), Duration::ZERO);
    let report = reconciler.sweep().await.unwrap();
    assert_eq!(report.removed, 2);
    for orphan in &orphans {
        assert!(!h.blobs.exists(&orphan.key).await.unwrap());
    }
}

#[tokio::test]
async fn non_finite_descriptor_is_400_and_latest_still_serves() {
    let h = harness();
    let resp = h
        .router
        .clone()
        .oneshot(upload_request(&full_upload("orin-1", "2025-07-24T15:00:00", DESCRIPTOR)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let nan = b"resolution: .nan\norigin: [0, 0, 0]\noccupied_thresh: 0.65\nfree_thresh: 0.196\n";
    let resp = h
        .router
        .clone()
        .oneshot(upload_request(&full_upload("orin-1", "2025-07-24T16:00:00", nan)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = h.router.oneshot(latest_request("orin-1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["resolution"], 0.05);
}

#[tokio::test]
async fn malformed_measured_at_is_400() {
    let h = harness();
    let resp = h
        .router
        .oneshot(upload_request(&full_upload("orin-1", "July 24th", DESCRIPTOR)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(h.state.list_devices().unwrap().is_empty());
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let h = harness_with_limit(64);
    let resp = h
        .router
        .oneshot(upload_request(&full_upload("orin-1", "2025-07-24T15:00:00", DESCRIPTOR)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(h.state.list_orphans().unwrap().is_empty());
}

#[tokio::test]
async fn healthz_ok() {
    let h = harness();
    let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let resp = h.router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, b"ok");
}
