use crate::enrich::{EnrichedKol, KolCatalog};
use crate::error::AppError;
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub readiness: Arc<AtomicBool>,
    pub catalog: Arc<KolCatalog>,
}

impl AppState {
    pub fn new(catalog: KolCatalog) -> Self {
        Self {
            readiness: Arc::new(AtomicBool::new(false)),
            catalog: Arc::new(catalog),
        }
    }

    fn static_dir(&self) -> &Path {
        &self.catalog.config().static_dir
    }
}

/// Catalog API, front end and static assets.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/kols", get(kols_endpoint))
        .route("/static/*path", get(static_asset))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .with_state(state)
}

pub async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

/// Enriched roster. Each call reads the roster and photo directory afresh and
/// matches against its own pool.
pub async fn kols_endpoint(
    State(state): State<AppState>,
) -> Result<Json<Vec<EnrichedKol>>, AppError> {
    let catalog = state.catalog.clone();
    let kols = tokio::task::spawn_blocking(move || catalog.load()).await??;
    Ok(Json(kols))
}

pub async fn index(State(state): State<AppState>) -> Response {
    serve_file(state.static_dir().join("index.html")).await
}

pub async fn static_asset(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
) -> Response {
    match resolve_static(state.static_dir(), &path) {
        Some(full_path) => serve_file(full_path).await,
        None => not_found(),
    }
}

/// Joins a request path onto `root`, refusing anything but plain segments.
fn resolve_static(root: &Path, requested: &str) -> Option<PathBuf> {
    let relative = Path::new(requested);
    let plain = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if !plain || requested.is_empty() {
        return None;
    }
    Some(root.join(relative))
}

async fn serve_file(path: PathBuf) -> Response {
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                bytes,
            )
                .into_response()
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => not_found(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to read static file");
            AppError::Io(err).into_response()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;

    fn state_for(static_dir: &Path) -> AppState {
        let config = CatalogConfig {
            static_dir: static_dir.to_path_buf(),
            roster_path: static_dir.join("List.csv"),
            ..CatalogConfig::default()
        };
        AppState::new(KolCatalog::new(config).expect("valid catalog config"))
    }

    #[test]
    fn resolve_static_rejects_traversal() {
        let root = Path::new("/srv/static");
        assert_eq!(
            resolve_static(root, "KOL_Picture/Jane Doe.png"),
            Some(PathBuf::from("/srv/static/KOL_Picture/Jane Doe.png"))
        );
        assert_eq!(resolve_static(root, "../secrets.env"), None);
        assert_eq!(resolve_static(root, "KOL_Picture/../../etc/passwd"), None);
        assert_eq!(resolve_static(root, "/etc/passwd"), None);
        assert_eq!(resolve_static(root, ""), None);
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state_for(dir.path());

        let response = readiness_endpoint(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let response = readiness_endpoint(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn kols_endpoint_reports_missing_roster() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = kols_endpoint(State(state_for(dir.path())))
            .await
            .expect_err("roster is missing");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
