//! Server/client API version negotiation.
//!
//! Every successful controller response carries the controller's API
//! version. A disagreement is advisory: the response is still handed to
//! the caller, with the mismatch attached, and the caller decides whether
//! it matters for the operation at hand.

use thiserror::Error;

use crate::error::{DryccError, Result};

/// The controller API version this client speaks.
pub const API_VERSION: &str = "2.0";

/// Server and client API versions are not compatible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Client and server API versions do not match \
     (server: {server_version:?}, client: {client_version:?}). \
     Please consider upgrading the client or the controller."
)]
pub struct ApiMismatch {
    /// Version reported by the controller (empty when the header was missing).
    pub server_version: String,
    /// Version this client expected.
    pub client_version: String,
}

/// Check whether a controller speaking `server` can serve a client built for `client`.
///
/// Versions are `MAJOR.MINOR`. Majors must be equal and the server minor
/// must not be older than the client minor. Both components are compared
/// as strings, so `"9"` sorts after `"10"`.
///
/// # Errors
///
/// Returns [`ApiMismatch`] when either version has fewer than two
/// components, or when the versions are incompatible.
pub fn check_api_compatibility(server: &str, client: &str) -> std::result::Result<(), ApiMismatch> {
    let mismatch = || ApiMismatch {
        server_version: server.to_string(),
        client_version: client.to_string(),
    };

    let server_parts: Vec<&str> = server.split('.').collect();
    let client_parts: Vec<&str> = client.split('.').collect();

    if server_parts.len() < 2 || client_parts.len() < 2 {
        return Err(mismatch());
    }

    if server_parts[0] != client_parts[0] {
        return Err(mismatch());
    }

    // String comparison, not numeric.
    if server_parts[1] < client_parts[1] {
        return Err(mismatch());
    }

    Ok(())
}

/// A value returned together with the outcome of the API version check.
///
/// The mismatch never replaces the value. Use [`Checked::strict`] to treat
/// it as fatal or [`Checked::into_inner`] to ignore it.
#[derive(Debug)]
#[must_use]
pub struct Checked<T> {
    value: T,
    mismatch: Option<ApiMismatch>,
}

impl<T> Checked<T> {
    /// Pair a value with a version check outcome.
    pub fn new(value: T, mismatch: Option<ApiMismatch>) -> Self {
        Self { value, mismatch }
    }

    /// Borrow the value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// The advisory mismatch, if the versions disagreed.
    pub fn mismatch(&self) -> Option<&ApiMismatch> {
        self.mismatch.as_ref()
    }

    /// Returns true when no mismatch was observed.
    pub fn is_compatible(&self) -> bool {
        self.mismatch.is_none()
    }

    /// Split into the value and the mismatch.
    pub fn into_parts(self) -> (T, Option<ApiMismatch>) {
        (self.value, self.mismatch)
    }

    /// Take the value and ignore any mismatch.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Take the value, failing if the versions disagreed.
    ///
    /// # Errors
    ///
    /// Returns [`DryccError::ApiMismatch`] when a mismatch was observed.
    pub fn strict(self) -> Result<T> {
        match self.mismatch {
            Some(mismatch) => Err(DryccError::ApiMismatch(mismatch)),
            None => Ok(self.value),
        }
    }

    /// Map the value, keeping the mismatch.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Checked<U> {
        Checked {
            value: f(self.value),
            mismatch: self.mismatch,
        }
    }
}
