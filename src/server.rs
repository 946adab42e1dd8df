use crate::cli::ServeArgs;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use kolective::config::{AppConfig, ConfigError};
use kolective::enrich::KolCatalog;
use kolective::error::AppError;
use kolective::routes::{router, AppState};
use kolective::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let catalog = KolCatalog::new(config.catalog.clone()).map_err(ConfigError::Matching)?;
    let state = AppState::new(catalog);
    let readiness_flag = state.readiness.clone();

    let app = router(state)
        .route("/metrics", get(metrics_endpoint))
        .layer(Extension(Arc::new(prometheus_handle)))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        roster = %config.catalog.roster_path.display(),
        photos = %config.catalog.photo_dir().display(),
        "kol catalog ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics_endpoint(Extension(metrics): Extension<Arc<PrometheusHandle>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics.render(),
    )
}
