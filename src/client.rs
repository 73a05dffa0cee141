//! Drycc controller client.
//!
//! Low-level HTTP client that every controller call funnels through. It
//! builds URLs, authenticates requests, classifies failure statuses and
//! checks the controller's API version on every response.

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncRead;
use url::Url;

use crate::compat::{check_api_compatibility, Checked, API_VERSION};
use crate::config::ClientConfig;
use crate::error::{ApiErrorKind, DryccError, Result};
use crate::multipart::{self, StreamedForm};
use crate::pagination::{self, Page, RawPage};

/// Response header carrying the controller API version.
pub const API_VERSION_HEADER: &str = "drycc_api_version";

/// Response header carrying the platform release.
pub const PLATFORM_VERSION_HEADER: &str = "drycc_platform_version";

/// Request header carrying the service credential.
pub const SERVICE_KEY_HEADER: &str = "x-drycc-service-key";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Known 400 field messages and the error kind each one means.
const FIELD_ERRORS: &[(&str, &str, ApiErrorKind)] = &[
    ("id", "Application with this id already exists.", ApiErrorKind::DuplicateApp),
    (
        "id",
        "App name can only contain a-z (lowercase), 0-9 and hyphens",
        ApiErrorKind::InvalidAppName,
    ),
    ("username", "A user with that username already exists.", ApiErrorKind::DuplicateUser),
    ("username", "Enter a valid username.", ApiErrorKind::InvalidUsername),
    ("email", "user with this email address already exists.", ApiErrorKind::DuplicateEmail),
    ("tags", "No nodes matched the provided labels", ApiErrorKind::TagNotFound),
];

/// Versions last reported by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerVersions {
    /// Value of the `DRYCC_API_VERSION` header, empty when absent.
    pub api_version: String,
    /// Value of the `DRYCC_PLATFORM_VERSION` header, empty when absent.
    pub platform_version: String,
}

/// Low-level Drycc controller client.
///
/// This struct is cheaply cloneable; clones share the underlying HTTP
/// client and the record of observed controller versions. That record is
/// last-write-wins across concurrent calls and is only diagnostic.
///
/// # Example
///
/// ```no_run
/// use drycc_client::{ClientConfig, DryccClient};
/// use reqwest::Method;
///
/// # async fn example() -> drycc_client::Result<()> {
/// let client = DryccClient::new(ClientConfig::new("https://drycc.example.com").with_token("t"))?;
///
/// let checked = client.request(Method::GET, "/v2/apps/", Vec::new()).await?;
/// if let Some(mismatch) = checked.mismatch() {
///     eprintln!("warning: {mismatch}");
/// }
/// let apps: serde_json::Value = checked.into_inner().json().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DryccClient {
    http: Client,
    base_url: Arc<Url>,
    token: Option<HeaderValue>,
    service_key: Option<HeaderValue>,
    user_agent: HeaderValue,
    versions: Arc<RwLock<ControllerVersions>>,
}

impl std::fmt::Debug for DryccClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DryccClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl DryccClient {
    /// Create a client from environment variables.
    ///
    /// See [`ClientConfig::from_env`].
    ///
    /// # Errors
    ///
    /// Returns an error if `DRYCC_CONTROLLER_URL` is not set or invalid.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller URL is invalid or a credential
    /// cannot be sent as a header.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.controller_url)?;

        let mut builder = Client::builder()
            .danger_accept_invalid_certs(!config.ssl_verify)
            // One connection per request, no keep-alive.
            .pool_max_idle_per_host(0)
            .brotli(true)
            .gzip(true)
            .deflate(true);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(DryccError::HttpError)?;

        let token = if config.token.is_empty() {
            None
        } else {
            Some(sensitive(&format!("token {}", config.token))?)
        };
        let service_key = if config.service_key.is_empty() {
            None
        } else {
            Some(sensitive(&config.service_key)?)
        };

        Ok(Self {
            http,
            base_url: Arc::new(base_url),
            token,
            service_key,
            user_agent: HeaderValue::from_str(&config.user_agent)?,
            versions: Arc::default(),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Versions reported by the last successful controller response.
    pub fn controller_versions(&self) -> ControllerVersions {
        self.versions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Absolute URL for a controller path.
    ///
    /// Text after a `?` is used as the query string as-is, so query
    /// parameters must already be percent-encoded.
    pub fn url_for(&self, path: &str) -> Url {
        let mut url = (*self.base_url).clone();
        match path.split_once('?') {
            Some((path, query)) => {
                url.set_path(path);
                url.set_query(Some(query));
            }
            None => url.set_path(path),
        }
        url
    }

    /// Send a request with a raw body.
    ///
    /// # Errors
    ///
    /// Returns [`DryccError::HttpError`] on transport failure and
    /// [`DryccError::Api`] when the controller answers with a failure status.
    /// An API version mismatch is not an error here; it is carried in the
    /// returned [`Checked`].
    #[tracing::instrument(skip(self, body), fields(body_len = body.len()))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Vec<u8>,
    ) -> Result<Checked<Response>> {
        let request = self
            .http
            .request(method, self.url_for(path))
            .body(body)
            .build()?;
        self.execute(request).await
    }

    /// Make a GET request.
    pub async fn get(&self, path: &str) -> Result<Checked<Response>> {
        self.request(Method::GET, path, Vec::new()).await
    }

    /// Make a POST request with JSON body.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Checked<Response>> {
        self.request(Method::POST, path, serde_json::to_vec(body)?)
            .await
    }

    /// Make a PUT request with JSON body.
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Checked<Response>> {
        self.request(Method::PUT, path, serde_json::to_vec(body)?)
            .await
    }

    /// Make a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<Checked<Response>> {
        self.request(Method::DELETE, path, Vec::new()).await
    }

    /// Authenticate and send a prepared request.
    ///
    /// A `Content-Type` already set on the request is kept; otherwise JSON
    /// is assumed.
    ///
    /// # Errors
    ///
    /// See [`DryccClient::request`].
    #[tracing::instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn execute(&self, mut request: Request) -> Result<Checked<Response>> {
        self.authorize(request.headers_mut());

        let response = self.http.execute(request).await?;
        let response = check_response(response).await?;

        let observed = self.record_versions(response.headers());
        Ok(checked(response, &observed.api_version))
    }

    /// Fetch one page of a list endpoint, asking for at most `limit` results.
    ///
    /// A version mismatch does not prevent the envelope from being read.
    ///
    /// # Errors
    ///
    /// Returns transport and application errors from the request, and
    /// decode errors when the body is not a list envelope.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_page(&self, path: &str, limit: u32) -> Result<Checked<RawPage>> {
        let path = pagination::with_limit(path, limit);
        let (response, mismatch) = self.get(&path).await?.into_parts();

        let body = response.bytes().await?;
        let page = pagination::parse_envelope(&body)?;
        tracing::debug!(count = page.count, "fetched page");

        Ok(Checked::new(page, mismatch))
    }

    /// Fetch one page of a list endpoint and decode its results.
    ///
    /// # Errors
    ///
    /// See [`DryccClient::fetch_page`]; also fails if the results do not
    /// decode as `T`.
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        limit: u32,
    ) -> Result<Checked<Page<T>>> {
        let (raw, mismatch) = self.fetch_page(path, limit).await?.into_parts();
        Ok(Checked::new(Page::from_raw(&raw)?, mismatch))
    }

    /// Upload a file as a multipart form with a `path` field and a `file` part.
    ///
    /// The content is streamed from `reader` while the request is sent. A
    /// read error fails the request, and the controller discards the partial
    /// upload.
    ///
    /// # Errors
    ///
    /// Returns [`DryccError::HttpError`] when the transport or the reader
    /// fails, and [`DryccError::Api`] for failure statuses.
    #[tracing::instrument(skip(self, reader))]
    pub async fn upload<R>(
        &self,
        path: &str,
        remote_path: &str,
        file_name: &str,
        reader: R,
    ) -> Result<Checked<Response>>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let StreamedForm {
            form,
            producer: _producer,
        } = multipart::stream_form(remote_path, file_name, reader)?;

        let request = self
            .http
            .post(self.url_for(path))
            .multipart(form)
            .build()?;
        self.execute(request).await
    }

    /// Check that the URL points at a Drycc controller.
    ///
    /// Sends an unauthenticated request to `/v2/`, which a controller must
    /// refuse with 401.
    ///
    /// # Errors
    ///
    /// Returns [`DryccError::InvalidController`] for any other status and
    /// [`DryccError::HttpError`] on transport failure.
    #[tracing::instrument(skip(self))]
    pub async fn check_connection(&self) -> Result<Checked<()>> {
        let response = self
            .http
            .get(self.probe_url("v2/"))
            .header(USER_AGENT, self.user_agent.clone())
            .send()
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Err(DryccError::InvalidController {
                url: self.base_url.to_string(),
            });
        }

        let observed = self.record_versions(response.headers());
        Ok(checked((), &observed.api_version))
    }

    /// Check that the controller reports itself healthy.
    ///
    /// # Errors
    ///
    /// Returns [`DryccError::Api`] for a failure status and
    /// [`DryccError::HttpError`] on transport failure.
    #[tracing::instrument(skip(self))]
    pub async fn healthcheck(&self) -> Result<Checked<()>> {
        let response = self
            .http
            .get(self.probe_url("healthz"))
            .header(USER_AGENT, self.user_agent.clone())
            .send()
            .await?;
        let response = check_response(response).await?;

        let observed = self.record_versions(response.headers());
        Ok(checked((), &observed.api_version))
    }

    /// URL below the base URL's own path.
    fn probe_url(&self, suffix: &str) -> Url {
        let mut url = (*self.base_url).clone();
        let path = format!("{}/{}", url.path().trim_end_matches('/'), suffix);
        url.set_path(&path);
        url
    }

    fn authorize(&self, headers: &mut HeaderMap) {
        if let Some(token) = &self.token {
            headers.insert(AUTHORIZATION, token.clone());
        }
        if let Some(key) = &self.service_key {
            headers.insert(SERVICE_KEY_HEADER, key.clone());
        }
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        }
        headers.insert(USER_AGENT, self.user_agent.clone());
    }

    fn record_versions(&self, headers: &HeaderMap) -> ControllerVersions {
        let observed = ControllerVersions {
            api_version: header_text(headers, API_VERSION_HEADER),
            platform_version: header_text(headers, PLATFORM_VERSION_HEADER),
        };
        tracing::debug!(
            api_version = %observed.api_version,
            platform_version = %observed.platform_version,
            "controller versions"
        );

        *self.versions.write().unwrap_or_else(PoisonError::into_inner) = observed.clone();
        observed
    }
}

fn sensitive(value: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value)?;
    header.set_sensitive(true);
    Ok(header)
}

fn header_text(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn checked<T>(value: T, server_version: &str) -> Checked<T> {
    let mismatch = check_api_compatibility(server_version, API_VERSION).err();
    if let Some(mismatch) = &mismatch {
        tracing::warn!(
            server = %mismatch.server_version,
            client = %mismatch.client_version,
            "controller API version mismatch"
        );
    }
    Checked::new(value, mismatch)
}

/// Check response status and convert failures.
async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();

    if (200..400).contains(&status.as_u16()) {
        return Ok(response);
    }

    let body = error_body(response.text().await, status);
    let kind = classify(status, &body);
    tracing::debug!(status = status.as_u16(), %kind, "controller returned an error");

    Err(DryccError::Api {
        kind,
        status: status.as_u16(),
        body,
    })
}

/// The error body, or `HTTP <status>` when it could not be read.
fn error_body<E: std::fmt::Display>(
    read: std::result::Result<String, E>,
    status: StatusCode,
) -> String {
    match read {
        Ok(body) => body,
        Err(err) => {
            tracing::debug!(error = %err, "failed to read error body");
            format!("HTTP {}", status.as_u16())
        }
    }
}

fn classify(status: StatusCode, body: &str) -> ApiErrorKind {
    match status.as_u16() {
        400 => classify_bad_request(body),
        401 => ApiErrorKind::Unauthorized,
        403 => ApiErrorKind::Forbidden,
        404 => ApiErrorKind::NotFound,
        405 => ApiErrorKind::MethodNotAllowed,
        409 => ApiErrorKind::Conflict,
        422 => ApiErrorKind::Unprocessable,
        500 => ApiErrorKind::ServerError,
        _ => ApiErrorKind::Unexpected,
    }
}

/// Match field messages such as `{"id": ["Application with this id already exists."]}`.
fn classify_bad_request(body: &str) -> ApiErrorKind {
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) else {
        return ApiErrorKind::BadRequest;
    };

    for (field, message, kind) in FIELD_ERRORS {
        let mentioned = match fields.get(*field) {
            Some(Value::String(text)) => text.contains(message),
            Some(Value::Array(texts)) => texts
                .iter()
                .filter_map(Value::as_str)
                .any(|text| text.contains(message)),
            _ => false,
        };
        if mentioned {
            return *kind;
        }
    }

    ApiErrorKind::BadRequest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> DryccClient {
        DryccClient::new(ClientConfig::new(url).with_token("test-token")).unwrap()
    }

    #[test]
    fn test_client_debug() {
        let client = client("https://drycc.example.com");
        let debug = format!("{:?}", client);
        assert!(debug.contains("DryccClient"));
        assert!(debug.contains("base_url"));
        // Token should not be in debug output
        assert!(!debug.contains("test-token"));
    }

    #[test]
    fn test_invalid_url() {
        let err = DryccClient::new(ClientConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, DryccError::UrlError(_)));
    }

    #[test]
    fn test_invalid_token() {
        let err = DryccClient::new(ClientConfig::new("http://x").with_token("bad\ntoken"))
            .unwrap_err();
        assert!(matches!(err, DryccError::InvalidHeader(_)));
    }

    #[test]
    fn test_url_for_keeps_raw_query() {
        let client = client("http://x:8000");
        let url = client.url_for("/v2/apps/demo/volumes/v/client/?path=a%2Fb&limit=2");
        assert_eq!(url.path(), "/v2/apps/demo/volumes/v/client/");
        assert_eq!(url.query(), Some("path=a%2Fb&limit=2"));

        let url = client.url_for("/v2/apps/");
        assert_eq!(url.as_str(), "http://x:8000/v2/apps/");
        // The base URL is never modified.
        assert_eq!(client.base_url().as_str(), "http://x:8000/");
    }

    #[test]
    fn test_probe_url_does_not_double_slash() {
        assert_eq!(client("http://x").probe_url("healthz").as_str(), "http://x/healthz");
        assert_eq!(client("http://x/").probe_url("healthz").as_str(), "http://x/healthz");
        assert_eq!(client("http://x/drycc/").probe_url("v2/").as_str(), "http://x/drycc/v2/");
    }

    #[test]
    fn test_classify_statuses() {
        assert_eq!(classify(StatusCode::UNAUTHORIZED, ""), ApiErrorKind::Unauthorized);
        assert_eq!(classify(StatusCode::NOT_FOUND, ""), ApiErrorKind::NotFound);
        assert_eq!(classify(StatusCode::CONFLICT, ""), ApiErrorKind::Conflict);
        assert_eq!(
            classify(StatusCode::UNPROCESSABLE_ENTITY, ""),
            ApiErrorKind::Unprocessable
        );
        assert_eq!(classify(StatusCode::BAD_GATEWAY, ""), ApiErrorKind::Unexpected);
    }

    #[test]
    fn test_error_body_falls_back_to_status() {
        let read: std::result::Result<String, std::io::Error> =
            Err(std::io::Error::other("connection reset"));
        assert_eq!(error_body(read, StatusCode::BAD_GATEWAY), "HTTP 502");

        let read: std::result::Result<String, std::io::Error> = Ok("nope".to_string());
        assert_eq!(error_body(read, StatusCode::NOT_FOUND), "nope");
    }

    #[test]
    fn test_classify_bad_request_messages() {
        assert_eq!(
            classify_bad_request(r#"{"id": ["Application with this id already exists."]}"#),
            ApiErrorKind::DuplicateApp
        );
        assert_eq!(
            classify_bad_request(r#"{"tags": "No nodes matched the provided labels: a=b"}"#),
            ApiErrorKind::TagNotFound
        );
        assert_eq!(
            classify_bad_request(r#"{"name": ["This field is required."]}"#),
            ApiErrorKind::BadRequest
        );
        assert_eq!(classify_bad_request("oops"), ApiErrorKind::BadRequest);
    }

    #[test]
    fn test_versions_start_empty() {
        assert_eq!(client("http://x").controller_versions(), ControllerVersions::default());
    }
}
