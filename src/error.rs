use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the bridge can surface, from configuration through the vendor API,
/// the telemetry broker and inbound request validation.
#[derive(Debug, Error)]
pub enum Error {
    /// Required configuration (client id / secret) is missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// Token exchange failed or the vendor rejected our credentials.
    #[error("authentication required: {0}")]
    Auth(String),

    /// HTTP transport failure talking to the vendor.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The broker client refused a request (event loop gone, queue closed).
    #[error("broker error: {0}")]
    Broker(#[from] rumqttc::ClientError),

    /// Malformed JSON, with the raw body for debugging.
    #[error("{message}, body: {body}")]
    Parse { message: String, body: String },

    /// Well-formed envelope carrying a non-success code.
    #[error("API error: {desc} (code: {code})")]
    Vendor { code: String, desc: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// Missing or empty request parameters.
    #[error("{0}")]
    Validation(String),
}

impl Error {
    pub fn parse(context: &str, err: serde_json::Error, body: &str) -> Self {
        Error::Parse {
            message: format!("failed to parse {}: {}", context, err),
            body: body.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}
