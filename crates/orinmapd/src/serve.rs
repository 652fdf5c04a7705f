//! Serve and sweep modes.
//!
//! In serve mode, the daemon:
//! 1. Opens the state store under `server.data_dir`
//! 2. Connects the object store named in `[storage]`
//! 3. Starts the orphan reconciler loop
//! 4. Serves the REST API until Ctrl-C

use std::net::SocketAddr;
use std::time::Duration;

use orinmap_api::{ApiState, build_router};
use orinmap_blob::BlobStore;
use orinmap_core::OrinmapConfig;
use orinmap_pipeline::{MapQueryService, Reconciler, UploadPipeline};
use orinmap_state::StateStore;
use tokio::sync::watch;
use tracing::{error, info};

fn open_stores(config: &OrinmapConfig) -> anyhow::Result<(StateStore, BlobStore)> {
    std::fs::create_dir_all(&config.server.data_dir)?;
    let db_path = config.db_path();
    let state = StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    let blobs = BlobStore::from_config(&config.storage)?;
    info!(
        backend = ?config.storage.backend,
        bucket = ?config.storage.bucket,
        "object store ready"
    );
    Ok((state, blobs))
}

/// Run the API server with the background reconciler.
pub async fn run_serve(config: OrinmapConfig) -> anyhow::Result<()> {
    info!("orinmap daemon starting");

    let (state, blobs) = open_stores(&config)?;

    let upload = UploadPipeline::new(blobs.clone(), state.clone());
    let query = MapQueryService::new(blobs.clone(), state.clone(), config.presign_ttl());
    let reconciler = Reconciler::new(
        blobs,
        state,
        Duration::from_secs(config.reconcile.interval_secs),
    );

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let reconcile_handle = tokio::spawn(async move {
        reconciler.run(shutdown_rx).await;
    });

    // ── Start API server ───────────────────────────────────────

    let router = build_router(ApiState { upload, query }, config.upload.max_body_bytes);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));

    info!(%addr, presign_ttl_secs = config.upload.presign_ttl_secs, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    if let Err(e) = reconcile_handle.await {
        error!(error = %e, "orphan reconciler task failed");
    }

    info!("orinmap daemon stopped");
    Ok(())
}

/// Run one reconciler sweep and exit.
pub async fn run_sweep(config: OrinmapConfig) -> anyhow::Result<()> {
    let (state, blobs) = open_stores(&config)?;
    let reconciler = Reconciler::new(blobs, state, Duration::ZERO);

    let report = reconciler.sweep().await?;
    info!(
        removed = report.removed,
        retained = report.retained,
        failed = report.failed,
        "sweep complete"
    );
    if report.failed > 0 {
        anyhow::bail!("{} orphaned objects could not be deleted", report.failed);
    }
    Ok(())
}
