//! HTTP session with one switch's web interface.

use reqwest::header::{ACCEPT, REFERER, UPGRADE_INSECURE_REQUESTS};
use tracing::{debug, error, trace};

use crate::config::SwitchConfig;
use crate::error::{Error, Result};

/// Login endpoint of the web interface.
pub const LOGIN_PATH: &str = "/logon.cgi";

/// Page referenced as `Referer` on login.
pub const LOGOUT_PATH: &str = "/Logout.htm";

/// Page holding the per-port statistics.
pub const STATUS_PAGE_PATH: &str = "/PortStatisticsRpm.htm";

const STATUS_PAGE_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Whether the switch currently holds a login for this client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated,
}

/// Client for one switch.
///
/// Owns a cookie-carrying `reqwest::Client` that lives as long as the
/// `SwitchClient`; only the login is redone, never the transport. The
/// session state changes only through [`authenticate`](Self::authenticate).
pub struct SwitchClient {
    config: SwitchConfig,
    host: String,
    http: reqwest::Client,
    base_url: reqwest::Url,
    session: SessionState,
}

impl SwitchClient {
    /// Create a client. No request is made until [`authenticate`](Self::authenticate).
    pub fn new(config: SwitchConfig) -> Result<Self> {
        let base = config.base_url();
        let base_url = reqwest::Url::parse(&base).map_err(|e| Error::InvalidUrl {
            url: base.clone(),
            message: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(Error::ClientBuild)?;

        Ok(Self {
            host: config.host_label(),
            config,
            http,
            base_url,
            session: SessionState::Unauthenticated,
        })
    }

    pub fn config(&self) -> &SwitchConfig {
        &self.config
    }

    /// Identity of the switch in logs and metric labels.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session == SessionState::Authenticated
    }

    fn url(&self, path: &str) -> Result<reqwest::Url> {
        self.base_url.join(path).map_err(|e| Error::InvalidUrl {
            url: format!("{}{}", self.base_url, path),
            message: e.to_string(),
        })
    }

    /// Log in with the configured credentials.
    ///
    /// Returns `true` and marks the session authenticated on success. Any
    /// failure is logged, leaves the session unauthenticated and returns
    /// `false`. There is no retry here.
    pub async fn authenticate(&mut self) -> bool {
        match self.login().await {
            Ok(()) => {
                debug!(host = %self.host(), "Logged in");
                self.session = SessionState::Authenticated;
                true
            }
            Err(e) => {
                error!(
                    host = %self.host(),
                    user = %self.config.username,
                    error = %e,
                    "Login failed"
                );
                self.session = SessionState::Unauthenticated;
                false
            }
        }
    }

    async fn login(&self) -> Result<()> {
        let url = self.url(LOGIN_PATH)?;
        let referer = self.url(LOGOUT_PATH)?;
        let form = [
            ("logon", "Login"),
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        debug!(host = %self.host(), "POST {}", url);

        let response = self
            .http
            .post(url)
            .header(REFERER, referer.as_str())
            .form(&form)
            .timeout(self.config.timeout())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::from_request(e, self.config.timeout_ms))?;

        let body = response
            .text()
            .await
            .map_err(|e| Error::from_request(e, self.config.timeout_ms))?;
        trace!(host = %self.host(), body = %body, "Login response");

        Ok(())
    }

    /// Fetch the raw statistics page.
    ///
    /// A failure usually means the session is gone; deciding what to do
    /// about it is up to the caller.
    pub async fn fetch_port_stats(&self) -> Result<String> {
        let url = self.url(STATUS_PAGE_PATH)?;
        let referer = self.url("/")?;

        debug!(host = %self.host(), "GET {}", url);

        let response = self
            .http
            .get(url)
            .header(REFERER, referer.as_str())
            .header(ACCEPT, STATUS_PAGE_ACCEPT)
            .header(UPGRADE_INSECURE_REQUESTS, "1")
            .timeout(self.config.timeout())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::from_request(e, self.config.timeout_ms))?;

        let body = response
            .text()
            .await
            .map_err(|e| Error::from_request(e, self.config.timeout_ms))?;
        trace!(host = %self.host(), body = %body, "Received status page");

        Ok(body)
    }
}

impl std::fmt::Debug for SwitchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchClient")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
