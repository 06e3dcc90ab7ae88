use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode as HttpStatus,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use h5attr::acquisition;
use h5attr::{AttributeBackend, AttributeStore, NativeBackend, StatusCode};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub struct AppState<B: AttributeBackend = NativeBackend> {
    pub store: AttributeStore<B>,
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
}

impl<B: AttributeBackend> AppState<B> {
    pub fn new(
        store: AttributeStore<B>,
        data_dir: impl Into<PathBuf>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            store,
            data_dir: data_dir.into(),
            request_timeout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

impl From<StatusCode> for Outcome {
    fn from(code: StatusCode) -> Self {
        if code.is_success() {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    pub status: Outcome,
    pub file_list: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IonModeResponse {
    pub status: Outcome,
    pub ion_mode: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NbrSamplesResponse {
    pub status: Outcome,
    pub nbr_samples: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleIntervalResponse {
    pub status: Outcome,
    pub sample_interval: Option<f64>,
}

/// 200 on Success, 404 on FileNotFound, 400 for everything else.
pub fn http_status(code: StatusCode) -> HttpStatus {
    match code {
        StatusCode::Success => HttpStatus::OK,
        StatusCode::FileNotFound => HttpStatus::NOT_FOUND,
        _ => HttpStatus::BAD_REQUEST,
    }
}

/// Drop the value unless the store call fully succeeded.
fn payload<T>(code: StatusCode, value: T) -> Option<T> {
    code.is_success().then_some(value)
}

/// Only plain file names inside the data directory are served.
pub fn validate_file_name(name: &str) -> Result<&str, StatusCode> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || FsPath::new(name).is_absolute();
    if bad {
        Err(StatusCode::InvalidParameter)
    } else {
        Ok(name)
    }
}

/// Run one blocking store call under the request timeout.
async fn blocking<B, T, F>(state: &Arc<AppState<B>>, what: &'static str, f: F) -> (StatusCode, T)
where
    B: AttributeBackend + 'static,
    T: Default + Send + 'static,
    F: FnOnce(&AppState<B>) -> (StatusCode, T) + Send + 'static,
{
    let st = Arc::clone(state);
    let task = tokio::task::spawn_blocking(move || f(&*st));
    match tokio::time::timeout(state.request_timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            tracing::error!(what, error = %e, "store task aborted");
            (StatusCode::Aborted, T::default())
        }
        Err(_) => {
            tracing::warn!(what, timeout = ?state.request_timeout, "store call timed out");
            (StatusCode::Timeout, T::default())
        }
    }
}

/// Validate `file`, read through `get`, then close the handle.
async fn read_attribute<B, T>(
    state: &Arc<AppState<B>>,
    file: String,
    what: &'static str,
    get: fn(&AttributeStore<B>, &FsPath) -> (StatusCode, T),
) -> (StatusCode, T)
where
    B: AttributeBackend + 'static,
    T: Default + Send + 'static,
{
    if let Err(code) = validate_file_name(&file) {
        tracing::warn!(file = %file, "rejected file name");
        return (code, T::default());
    }
    let (code, value) = blocking(state, what, move |st| {
        let path = PathBuf::from(&file);
        let result = get(&st.store, &path);
        st.store.close(&path);
        result
    })
    .await;
    tracing::debug!(what, %code, "handled");
    (code, value)
}

async fn health_handler() -> impl IntoResponse {
    (HttpStatus::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn list_files<B: AttributeBackend + 'static>(
    State(state): State<Arc<AppState<B>>>,
) -> Response {
    let (code, files) = blocking(&state, "h5files", |st| match h5attr::list_h5_files(&st.data_dir) {
        Ok(files) => (StatusCode::Success, files),
        Err(e) => {
            tracing::warn!(error = %e, "listing data directory failed");
            (e.status(), Vec::new())
        }
    })
    .await;
    let body = FileListResponse {
        status: code.into(),
        file_list: payload(code, files),
    };
    (http_status(code), Json(body)).into_response()
}

async fn ion_mode<B: AttributeBackend + 'static>(
    State(state): State<Arc<AppState<B>>>,
    Path(file): Path<String>,
) -> Response {
    let (code, mode) =
        read_attribute(&state, file, "ion_mode", |s, p| acquisition::ion_mode(s, p)).await;
    let body = IonModeResponse {
        status: code.into(),
        ion_mode: payload(code, mode),
    };
    (http_status(code), Json(body)).into_response()
}

async fn nbr_samples<B: AttributeBackend + 'static>(
    State(state): State<Arc<AppState<B>>>,
    Path(file): Path<String>,
) -> Response {
    let (code, n) =
        read_attribute(&state, file, "nbr_samples", |s, p| acquisition::nbr_samples(s, p)).await;
    let body = NbrSamplesResponse {
        status: code.into(),
        nbr_samples: payload(code, n),
    };
    (http_status(code), Json(body)).into_response()
}

async fn sample_interval<B: AttributeBackend + 'static>(
    State(state): State<Arc<AppState<B>>>,
    Path(file): Path<String>,
) -> Response {
    let (code, dt) = read_attribute(&state, file, "sample_interval", |s, p| {
        acquisition::sample_interval(s, p)
    })
    .await;
    let body = SampleIntervalResponse {
        status: code.into(),
        sample_interval: payload(code, dt),
    };
    (http_status(code), Json(body)).into_response()
}

pub fn router<B: AttributeBackend + 'static>(state: Arc<AppState<B>>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/h5files", get(list_files::<B>))
        .route("/ion_mode/:file", get(ion_mode::<B>))
        .route("/nbr_samples/:file", get(nbr_samples::<B>))
        .route("/sample_interval/:file", get(sample_interval::<B>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let store = AttributeStore::initialize(&config.store)?;
    let state = Arc::new(AppState::new(
        store,
        config.store.data_dir.clone(),
        config.request_timeout(),
    ));
    let app = router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.store.close_all();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_mapping() {
        assert_eq!(http_status(StatusCode::Success), HttpStatus::OK);
        assert_eq!(http_status(StatusCode::FileNotFound), HttpStatus::NOT_FOUND);
        for code in StatusCode::ALL {
            if !matches!(code, StatusCode::Success | StatusCode::FileNotFound) {
                assert_eq!(http_status(code), HttpStatus::BAD_REQUEST, "{code}");
            }
        }
    }

    #[test]
    fn file_name_validation() {
        assert_eq!(validate_file_name("a.h5"), Ok("a.h5"));
        assert_eq!(validate_file_name("run..1.h5"), Ok("run..1.h5"));
        assert_eq!(validate_file_name(".hidden.h5"), Ok(".hidden.h5"));
        for bad in ["", ".", "..", "../a.h5", "dir/a.h5", "/etc/passwd", "a\\b.h5"] {
            assert_eq!(validate_file_name(bad), Err(StatusCode::InvalidParameter), "{bad}");
        }
    }

    #[test]
    fn failure_bodies_carry_null() {
        let body = NbrSamplesResponse {
            status: StatusCode::NoData.into(),
            nbr_samples: payload(StatusCode::NoData, 0),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "failure", "nbrSamples": null }));

        let body = NbrSamplesResponse {
            status: StatusCode::Success.into(),
            nbr_samples: payload(StatusCode::Success, 0),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "success", "nbrSamples": 0 }));
    }
}
