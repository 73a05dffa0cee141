//! Mock Drycc controller for E2E testing.
//!
//! An in-memory server that answers the controller's probes and serves
//! app volumes through the filer endpoints. Unlike wiremock, which mocks
//! per request, this server keeps state across requests so whole
//! upload/list/download workflows can be tested.
//!
//! # Example
//!
//! ```ignore
//! use drycc_client::mock_server::MockServer;
//! use drycc_client::{filer, ClientConfig, DryccClient};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let client = DryccClient::new(ClientConfig::new(server.url())).unwrap();
//!
//!     // Server comes with default fixtures
//!     let page = filer::list_dir(&client, "example-go", "myvolume", "tmp", 100)
//!         .await
//!         .unwrap()
//!         .into_inner();
//!     assert!(!page.is_empty());
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::{DefaultScenario, Fixtures, APP, HELLO_WORLD, VOLUME};
pub use server::MockServer;
pub use state::{MockState, StoredFile, UploadRecord};
