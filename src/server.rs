//! HTTP front end: `POST /translate` and `GET /supported-languages`.

use crate::error::{RelayError, Result};
use crate::language::SupportedLanguage;
use crate::orchestrator::{TranslationJob, TranslationOrchestrator, DEFAULT_CALLER_ADDRESS};
use axum::{
    extract::{Json as ExtractJson, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Header carrying the original client address behind a proxy.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub input_text: String,
    pub source_language: String,
    pub target_language: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    pub translated_text: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// A [`RelayError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub RelayError);

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RelayError::LanguageNotFound { .. }
            | RelayError::InvalidInput(_)
            | RelayError::ProviderAccess(_) => StatusCode::BAD_REQUEST,
            RelayError::ProviderRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            RelayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Http(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Http(_) => StatusCode::BAD_GATEWAY,
            RelayError::Storage(_)
            | RelayError::PoolClosed
            | RelayError::Config(_)
            | RelayError::Io(_)
            | RelayError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.0.kind().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// First address in `X-Forwarded-For`, or loopback when absent.
pub fn caller_address(headers: &HeaderMap) -> String {
    headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .unwrap_or(DEFAULT_CALLER_ADDRESS)
        .to_string()
}

async fn translate(
    State(orchestrator): State<Arc<TranslationOrchestrator>>,
    headers: HeaderMap,
    ExtractJson(request): ExtractJson<TranslateRequest>,
) -> std::result::Result<Json<TranslateResponse>, ApiError> {
    let job = TranslationJob::new(
        request.input_text,
        request.source_language,
        request.target_language,
    )
    .with_caller(caller_address(&headers));

    debug!(
        "Translate request from {}: {} -> {}",
        job.caller_address, job.source_language, job.target_language
    );

    let translated_text = orchestrator.translate(&job).await?;
    Ok(Json(TranslateResponse { translated_text }))
}

async fn supported_languages(
    State(orchestrator): State<Arc<TranslationOrchestrator>>,
) -> std::result::Result<Json<Vec<SupportedLanguage>>, ApiError> {
    let mut languages: Vec<SupportedLanguage> =
        orchestrator.supported_languages().await?.into_iter().collect();
    languages.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(Json(languages))
}

pub fn router(orchestrator: Arc<TranslationOrchestrator>) -> Router {
    Router::new()
        .route("/translate", post(translate))
        .route("/supported-languages", get(supported_languages))
        .with_state(orchestrator)
}

/// Serve until `shutdown` resolves, then close the worker pool.
pub async fn serve<S>(
    listener: TcpListener,
    orchestrator: Arc<TranslationOrchestrator>,
    shutdown: S,
) -> Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(
        "Listening on http://{} (provider: {}, concurrency: {})",
        addr,
        orchestrator.provider_name(),
        orchestrator.pool().capacity()
    );

    axum::serve(listener, router(orchestrator.clone()))
        .with_graceful_shutdown(shutdown)
        .await?;

    orchestrator.shutdown();
    info!("Server stopped");
    Ok(())
}
