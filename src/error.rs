//! Error types for Drycc controller operations.

use std::fmt;

use thiserror::Error;

use crate::compat::ApiMismatch;
use crate::time::TimeParseError;

/// Errors that can occur while talking to a Drycc controller.
#[derive(Debug, Error)]
pub enum DryccError {
    /// Configuration is missing or incomplete.
    #[error("Drycc configuration required: {0}")]
    ConfigMissing(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// A credential or header value contains characters HTTP cannot carry.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// HTTP transport error. No response was received.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The controller answered with a failure status.
    #[error("{kind} (HTTP {status}): {body}")]
    Api {
        kind: ApiErrorKind,
        status: u16,
        body: String,
    },

    /// Server and client API versions disagree.
    #[error(transparent)]
    ApiMismatch(#[from] ApiMismatch),

    /// The URL answered, but not like a Drycc controller would.
    #[error(
        "{url} does not appear to be a valid Drycc controller. \
         Make sure that the controller URL is correct, the server is running \
         and your client version is correct."
    )]
    InvalidController { url: String },

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// A paginated response was valid JSON but not a list envelope.
    #[error("Invalid list envelope: {0}")]
    InvalidEnvelope(String),

    /// Timestamp text matched none of the accepted layouts.
    #[error(transparent)]
    TimeParse(#[from] TimeParseError),

    /// Local I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DryccError {
    /// Returns true for the advisory API version mismatch.
    pub fn is_api_mismatch(&self) -> bool {
        matches!(self, Self::ApiMismatch(_))
    }

    /// Returns true when the controller reported that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.api_kind() == Some(ApiErrorKind::NotFound)
    }

    /// The application error kind, if this is an application error.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Self::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Classification of a controller failure status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// 400 with no more specific field message.
    BadRequest,
    /// 400: an app with the requested id already exists.
    DuplicateApp,
    /// 400: the app id is rejected by the controller.
    InvalidAppName,
    /// 400: the username is taken.
    DuplicateUser,
    /// 400: the email is taken.
    DuplicateEmail,
    /// 400: the username is rejected by the controller.
    InvalidUsername,
    /// 400: a tag does not match any node label in the cluster.
    TagNotFound,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 405
    MethodNotAllowed,
    /// 409
    Conflict,
    /// 422
    Unprocessable,
    /// 500
    ServerError,
    /// Any other failure status.
    Unexpected,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::BadRequest => "Bad request",
            Self::DuplicateApp => "This app name is already taken",
            Self::InvalidAppName => "App name can only contain a-z (lowercase), 0-9 and hyphens",
            Self::DuplicateUser => "A user with this username already exists",
            Self::DuplicateEmail => "A user with this email already exists",
            Self::InvalidUsername => "Username can only contain letters, digits and @/./+/-/_",
            Self::TagNotFound => "No nodes matched the provided labels",
            Self::Unauthorized => "Unauthorized: Missing or Invalid Token",
            Self::Forbidden => "You do not have permission to perform this action",
            Self::NotFound => "Not found",
            Self::MethodNotAllowed => "Method not allowed",
            Self::Conflict => "This action could not be completed due to a conflict",
            Self::Unprocessable => "Unable to process your request",
            Self::ServerError => "Internal server error",
            Self::Unexpected => "Unexpected controller response",
        };
        f.write_str(text)
    }
}

/// Result type alias for Drycc operations.
pub type Result<T> = core::result::Result<T, DryccError>;
