//! Client configuration.

use std::env;
use std::time::Duration;

use crate::error::{DryccError, Result};

/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("drycc-client/", env!("CARGO_PKG_VERSION"));

/// Settings for a [`DryccClient`](crate::DryccClient).
///
/// # Example
///
/// ```no_run
/// use drycc_client::ClientConfig;
///
/// # fn example() -> drycc_client::Result<()> {
/// // From environment variables
/// let config = ClientConfig::from_env()?;
///
/// // Or configured manually
/// let config = ClientConfig::new("https://drycc.example.com")
///     .with_token("my-token")
///     .with_ssl_verify(false);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Controller endpoint, e.g. `https://drycc.example.com`.
    pub controller_url: String,
    /// User token sent as `Authorization: token <token>`. Empty means none.
    pub token: String,
    /// Service credential for trusted internal callers. Empty means none.
    pub service_key: String,
    /// Verify the controller's TLS certificate.
    pub ssl_verify: bool,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    /// Whole-request timeout. `None` leaves the transport default.
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("controller_url", &self.controller_url)
            .field("ssl_verify", &self.ssl_verify)
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Configuration for an unauthenticated client of `controller_url`.
    pub fn new(controller_url: &str) -> Self {
        Self {
            controller_url: controller_url.to_string(),
            token: String::new(),
            service_key: String::new(),
            ssl_verify: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }

    /// Read configuration from environment variables.
    ///
    /// - `DRYCC_CONTROLLER_URL` (required)
    /// - `DRYCC_TOKEN`
    /// - `DRYCC_SERVICE_KEY`
    /// - `DRYCC_SSL_VERIFY`: `false`, `0` or `no` disables certificate checks
    ///
    /// # Errors
    ///
    /// Returns an error if `DRYCC_CONTROLLER_URL` is not set.
    pub fn from_env() -> Result<Self> {
        let controller_url = env::var("DRYCC_CONTROLLER_URL").map_err(|_| {
            DryccError::ConfigMissing(
                "DRYCC_CONTROLLER_URL environment variable not set".to_string(),
            )
        })?;

        let mut config = Self::new(&controller_url);
        config.token = env::var("DRYCC_TOKEN").unwrap_or_default();
        config.service_key = env::var("DRYCC_SERVICE_KEY").unwrap_or_default();
        if let Ok(verify) = env::var("DRYCC_SSL_VERIFY") {
            config.ssl_verify = parse_flag(&verify);
        }
        Ok(config)
    }

    /// Set the user token.
    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = token.to_string();
        self
    }

    /// Set the service credential.
    #[must_use]
    pub fn with_service_key(mut self, key: &str) -> Self {
        self.service_key = key.to_string();
        self
    }

    /// Enable or disable TLS certificate verification.
    #[must_use]
    pub fn with_ssl_verify(mut self, verify: bool) -> Self {
        self.ssl_verify = verify;
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// Set a whole-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}
