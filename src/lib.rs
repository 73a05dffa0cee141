//! Drycc controller client library.
//!
//! A Rust library for talking to the Drycc controller API. Every call goes
//! through [`DryccClient`], which authenticates the request, classifies
//! failure statuses and checks the controller's API version.
//!
//! # Quick Start
//!
//! ```no_run
//! use drycc_client::{filer, DryccClient};
//!
//! #[tokio::main]
//! async fn main() -> drycc_client::Result<()> {
//!     // Create client from environment variables
//!     let client = DryccClient::from_env()?;
//!
//!     // Make sure the URL is a controller
//!     client.check_connection().await?.strict()?;
//!
//!     // List a directory on an app volume
//!     let page = filer::list_dir(&client, "example-go", "myvolume", "tmp", 100)
//!         .await?
//!         .into_inner();
//!     println!("{} of {} entries", page.len(), page.total);
//!
//!     Ok(())
//! }
//! ```
//!
//! # API versions
//!
//! The controller reports its API version on every response. When it is
//! not compatible with [`API_VERSION`], the call still succeeds and the
//! result is returned in a [`Checked`] carrying an [`ApiMismatch`]. Call
//! [`Checked::strict`] to treat that as an error or
//! [`Checked::into_inner`] to ignore it.
//!
//! # Configuration
//!
//! The client reads configuration from environment variables:
//!
//! - `DRYCC_CONTROLLER_URL` (required) - Controller endpoint
//! - `DRYCC_TOKEN` (optional) - User token
//! - `DRYCC_SERVICE_KEY` (optional) - Service credential for internal callers
//! - `DRYCC_SSL_VERIFY` (optional) - Set to `false` to skip certificate checks

mod client;
mod compat;
mod config;
mod error;
mod multipart;
mod pagination;
mod time;

pub mod cli;
pub mod filer;

#[cfg(feature = "test-server")]
pub mod mock_server;

// Re-export core types
pub use client::{
    ControllerVersions, DryccClient, API_VERSION_HEADER, PLATFORM_VERSION_HEADER,
    SERVICE_KEY_HEADER,
};
pub use compat::{check_api_compatibility, ApiMismatch, Checked, API_VERSION};
pub use config::{ClientConfig, DEFAULT_USER_AGENT};
pub use error::{ApiErrorKind, DryccError, Result};
pub use pagination::{Page, RawPage, DEFAULT_LIMIT};
pub use time::{LayoutError, TimeParseError, Timestamp};

// Re-export filer types
pub use filer::FilerDirEntry;

pub use reqwest::Method;
