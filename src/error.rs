//! Error taxonomy for panel API calls.
//!
//! DESIGN
//! ======
//! Every unsuccessful HTTP response is classified into an [`ApiError`]. The
//! 422 and 429 shapes are carried as [`ApiErrorKind`] variants on the same
//! struct, so a validation or rate-limit failure is always also a generic API
//! failure with the status, code, message and raw entries available.
//!
//! Transport-level problems (DNS, TLS, undecodable envelopes) are separate
//! variants of the crate-wide [`Error`].

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::net::channel::ChannelError;

/// Code used when the server sent no usable error entry.
pub const UNKNOWN_ERROR_CODE: &str = "UnknownError";

/// Retry-after fallback, in seconds, when a 429 carries no usable header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The panel answered with a non-success status.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The HTTP request could not be sent or its body could not be read.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// A success body did not match the expected envelope.
    #[error("invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),
    /// The API key could not be encoded as a header value.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    /// The configured base URL is not an `http(s)` URL.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    /// A write that should answer with a resource came back empty.
    #[error("panel returned no content for `{0}`")]
    EmptyResponse(String),
    /// A required configuration value was not provided.
    #[error("missing configuration value `{0}`")]
    MissingConfig(&'static str),
    /// The real-time channel failed to establish a session.
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

impl Error {
    /// The classified API failure, if this error came from a panel response.
    #[must_use]
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(error) => Some(error),
            _ => None,
        }
    }
}

// =============================================================================
// ERROR ENTRIES
// =============================================================================

/// One element of the `errors` array in a failure body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
}

/// Field annotation attached to validation entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSource {
    #[serde(default)]
    pub field: Option<String>,
}

impl ErrorEntry {
    /// Name of the request field this entry refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.source
            .as_ref()
            .and_then(|source| source.field.as_deref())
            .filter(|field| !field.is_empty())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    errors: Vec<ErrorEntry>,
}

/// Parse a failure body into its error entries.
///
/// Bodies that are not `{ "errors": [...] }` collapse into a single
/// `UnknownError` entry whose detail is the status reason, or `HTTP <status>`.
#[must_use]
pub fn parse_error_body(body: &[u8], status: u16, reason: Option<&str>) -> Vec<ErrorEntry> {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        return parsed.errors;
    }

    let detail = reason
        .filter(|reason| !reason.is_empty())
        .map_or_else(|| format!("HTTP {status}"), ToOwned::to_owned);
    vec![ErrorEntry {
        code: UNKNOWN_ERROR_CODE.to_owned(),
        status: status.to_string(),
        detail,
        source: None,
    }]
}

/// Parse a `Retry-After` header value in whole seconds.
#[must_use]
pub fn parse_retry_after(value: Option<&str>) -> u64 {
    value
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

// =============================================================================
// API ERROR
// =============================================================================

/// Shape-specific data of a classified failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Any unsuccessful status other than 422 and 429.
    Generic,
    /// 422: details grouped by the field they refer to, in arrival order.
    Validation {
        field_errors: BTreeMap<String, Vec<String>>,
    },
    /// 429: seconds the server asked us to wait.
    RateLimited { retry_after: u64 },
}

/// A classified panel failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message} (HTTP {status}, {code})")]
pub struct ApiError {
    status: u16,
    code: String,
    message: String,
    errors: Vec<ErrorEntry>,
    kind: ApiErrorKind,
}

impl ApiError {
    /// Build a generic failure for `status`.
    #[must_use]
    pub fn new(status: u16, errors: Vec<ErrorEntry>) -> Self {
        Self::with_kind(status, errors, ApiErrorKind::Generic)
    }

    /// Build a 422 failure, grouping entry details by their source field.
    #[must_use]
    pub fn validation(errors: Vec<ErrorEntry>) -> Self {
        let mut field_errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entry in &errors {
            if let Some(field) = entry.field() {
                field_errors
                    .entry(field.to_owned())
                    .or_default()
                    .push(entry.detail.clone());
            }
        }
        Self::with_kind(422, errors, ApiErrorKind::Validation { field_errors })
    }

    /// Build a 429 failure.
    #[must_use]
    pub fn rate_limited(errors: Vec<ErrorEntry>, retry_after: u64) -> Self {
        Self::with_kind(429, errors, ApiErrorKind::RateLimited { retry_after })
    }

    /// Pick the failure shape for `status`.
    #[must_use]
    pub fn classify(status: u16, errors: Vec<ErrorEntry>, retry_after: Option<&str>) -> Self {
        match status {
            422 => Self::validation(errors),
            429 => Self::rate_limited(errors, parse_retry_after(retry_after)),
            _ => Self::new(status, errors),
        }
    }

    fn with_kind(status: u16, errors: Vec<ErrorEntry>, kind: ApiErrorKind) -> Self {
        let (code, message) = match errors.first() {
            Some(first) => (first.code.clone(), first.detail.clone()),
            None => (UNKNOWN_ERROR_CODE.to_owned(), format!("API error {status}")),
        };
        Self {
            status,
            code,
            message,
            errors,
            kind,
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Machine code of the first entry, or `UnknownError`.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Detail of the first entry, or `API error <status>`.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    #[must_use]
    pub fn kind(&self) -> &ApiErrorKind {
        &self.kind
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self.kind, ApiErrorKind::Validation { .. })
    }

    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.kind, ApiErrorKind::RateLimited { .. })
    }

    /// Field-grouped details of a validation failure.
    #[must_use]
    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match &self.kind {
            ApiErrorKind::Validation { field_errors } => Some(field_errors),
            _ => None,
        }
    }

    /// Seconds to wait before retrying a rate-limited call.
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self.kind {
            ApiErrorKind::RateLimited { retry_after } => Some(retry_after),
            _ => None,
        }
    }

    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after_secs().map(Duration::from_secs)
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
