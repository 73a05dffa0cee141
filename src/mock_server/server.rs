//! Mock Drycc controller server.
//!
//! Provides an axum-based HTTP server that simulates the controller's
//! probe and volume filer endpoints.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::{DefaultScenario, Fixtures};
use super::handlers;
use super::state::MockState;
use crate::{API_VERSION_HEADER, PLATFORM_VERSION_HEADER};

/// A mock Drycc controller for testing.
///
/// The server runs in the background and keeps its volumes in memory, so a
/// test can upload a file and read it back through the real client.
pub struct MockServer {
    /// The URL where the server is listening.
    url: String,
    /// Handle to the server task.
    handle: JoinHandle<()>,
    /// Shared state that can be modified during tests.
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a new mock server with default fixtures.
    ///
    /// The server listens on a random available port and returns immediately.
    pub async fn start() -> Self {
        Self::with_state(Self::state_from_scenario(Fixtures::default_scenario())).await
    }

    /// Start a mock server without any volumes.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a mock server with custom state.
    pub async fn with_state(state: MockState) -> Self {
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            url: format!("http://{}", addr),
            handle,
            state: shared_state,
        }
    }

    /// Get the base URL of the mock server.
    ///
    /// Use this as the controller URL of a `ClientConfig`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get access to the server's shared state.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Shutdown the server. It's safe to call after the task has ended.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    fn state_from_scenario(scenario: DefaultScenario) -> MockState {
        let mut state = MockState::new();

        for (app, volume) in &scenario.empty_volumes {
            state = state.with_volume(app, volume);
        }
        for (app, volume, path, content) in scenario.files {
            state.put_file(&app, &volume, &path, content);
        }

        state
    }

    fn create_router(state: Arc<RwLock<MockState>>) -> Router {
        Router::new()
            .route("/v2/", get(handlers::api_root))
            .route("/healthz", get(handlers::healthz))
            .route(
                "/v2/apps/:app/volumes/:volume/client/",
                get(handlers::list_dir).post(handlers::upload_file),
            )
            // File paths contain slashes, so they are routed by hand.
            .fallback(handlers::file_route)
            .layer(middleware::from_fn_with_state(state.clone(), version_headers))
            .with_state(state)
    }
}

/// Stamp every response with the controller's versions.
async fn version_headers(
    State(state): State<Arc<RwLock<MockState>>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let state = state.read().await;
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&state.api_version) {
        headers.insert(API_VERSION_HEADER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&state.platform_version) {
        headers.insert(PLATFORM_VERSION_HEADER, value);
    }

    response
}
