use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Every terminal outcome of the resolver other than upstream pass-through.
///
/// The `Display` text of each variant is the exact plain-text body sent to
/// the caller.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Only GET supported; read-only")]
    MethodNotAllowed,

    #[error("url parameter required")]
    MissingUrl,

    #[error("Invalid url")]
    InvalidUrl,

    #[error("Request and url hostnames must match")]
    HostMismatch,

    #[error("Only JSON oEmbed implemented")]
    UnsupportedFormat,

    #[error("Upstream fetch failed")]
    UpstreamFetch(#[source] reqwest::Error),

    #[error("Upstream JSON could not be parsed")]
    UpstreamJson(String),

    #[error("Upstream HTML could not be read")]
    UpstreamHtml(String),

    #[error("JSON-LD Schema could not be parsed")]
    JsonLd(#[source] serde_json::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed
            | AppError::MissingUrl
            | AppError::InvalidUrl
            | AppError::HostMismatch => StatusCode::BAD_REQUEST,
            AppError::UnsupportedFormat => StatusCode::NOT_IMPLEMENTED,
            AppError::UpstreamFetch(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamJson(_) | AppError::UpstreamHtml(_) | AppError::JsonLd(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::UpstreamFetch(e) => {
                tracing::warn!(error = ?e, "Upstream fetch failed");
            }
            AppError::UpstreamJson(detail) => {
                tracing::warn!(detail = %detail, "Upstream JSON body could not be parsed");
            }
            AppError::UpstreamHtml(detail) => {
                tracing::error!(detail = %detail, "Upstream HTML stream failed");
            }
            AppError::JsonLd(e) => {
                tracing::warn!(error = %e, "JSON-LD block could not be parsed");
            }
            _ => {}
        }

        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain")],
            self.to_string(),
        )
            .into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
