//! Client configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};
use crate::response::Completion;

/// Handler invoked for error outcomes when a request supplied no error callback.
pub type ErrorHandler = Arc<dyn Fn(&Completion, &str) + Send + Sync>;

/// Configuration for a mite account connection.
///
/// Immutable once built. The API key is redacted in Debug output.
#[derive(Clone)]
pub struct MiteConfig {
    account: String,
    api_key: String,
    protocol: String,
    domain: String,
    base_url: Option<String>,
    timeout: Duration,
    user_agent: String,
    error_handler: ErrorHandler,
}

impl fmt::Debug for MiteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiteConfig")
            .field("account", &self.account)
            .field("api_key", &"[REDACTED]")
            .field("protocol", &self.protocol)
            .field("domain", &self.domain)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl MiteConfig {
    /// Create a new config builder.
    pub fn builder() -> MiteConfigBuilder {
        MiteConfigBuilder::default()
    }

    /// Load configuration from the environment.
    ///
    /// Reads `MITE_ACCOUNT` and `MITE_API_KEY` (required) plus the optional
    /// `MITE_DOMAIN`, `MITE_PROTOCOL` and `MITE_TIMEOUT` (seconds).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let account = lookup("MITE_ACCOUNT")
            .ok_or_else(|| Error::new(ErrorKind::EnvVar("MITE_ACCOUNT".to_string())))?;
        let api_key = lookup("MITE_API_KEY")
            .ok_or_else(|| Error::new(ErrorKind::EnvVar("MITE_API_KEY".to_string())))?;

        let mut builder = Self::builder().with_account(account).with_api_key(api_key);

        if let Some(domain) = lookup("MITE_DOMAIN") {
            builder = builder.with_domain(domain);
        }
        if let Some(protocol) = lookup("MITE_PROTOCOL") {
            builder = builder.with_protocol(protocol);
        }
        if let Some(timeout) = lookup("MITE_TIMEOUT") {
            let secs = timeout.trim().parse::<u64>().map_err(|e| {
                Error::with_source(
                    ErrorKind::Config(format!("MITE_TIMEOUT is not a number of seconds: {timeout}")),
                    e,
                )
            })?;
            builder = builder.with_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Account identifier sent as `X-MiteAccount`.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// API key sent as `X-MiteApiKey`.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Transport scheme, `https` unless overridden.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// API domain, `mite.yo.lk` unless overridden.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Default timeout window for asynchronous requests.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// User-Agent header value.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Handler used when a request carries no error callback.
    pub fn error_handler(&self) -> &ErrorHandler {
        &self.error_handler
    }

    /// Everything in front of the resource path.
    ///
    /// Example: `https://corsapi.mite.yo.lk`
    pub fn api_root(&self) -> String {
        match &self.base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!(
                "{}://{}.{}",
                self.protocol,
                crate::API_SUBDOMAIN,
                self.domain
            ),
        }
    }
}

/// Builder for MiteConfig.
#[derive(Default)]
pub struct MiteConfigBuilder {
    account: Option<String>,
    api_key: Option<String>,
    protocol: Option<String>,
    domain: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    error_handler: Option<ErrorHandler>,
}

impl MiteConfigBuilder {
    /// Set the account identifier (required).
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Set the API key (required).
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the transport scheme.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Set the API domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Replace `scheme://corsapi.<domain>` with a fixed root, e.g. a proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the default timeout window.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a custom User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the default error handler.
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Completion, &str) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Build the configuration.
    ///
    /// Fails when the account or the API key is missing or blank.
    pub fn build(self) -> Result<MiteConfig> {
        let account = self.account.filter(|s| !s.trim().is_empty());
        let api_key = self.api_key.filter(|s| !s.trim().is_empty());

        let (Some(account), Some(api_key)) = (account, api_key) else {
            return Err(Error::new(ErrorKind::Config(
                "account & api_key need to be set".to_string(),
            )));
        };

        if let Some(ref base) = self.base_url {
            url::Url::parse(base)?;
        }

        Ok(MiteConfig {
            account,
            api_key,
            protocol: self
                .protocol
                .unwrap_or_else(|| crate::DEFAULT_PROTOCOL.to_string()),
            domain: self
                .domain
                .unwrap_or_else(|| crate::DEFAULT_DOMAIN.to_string()),
            base_url: self.base_url,
            timeout: self.timeout.unwrap_or(crate::DEFAULT_TIMEOUT),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| crate::USER_AGENT.to_string()),
            error_handler: self
                .error_handler
                .unwrap_or_else(|| Arc::new(log_request_error)),
        })
    }
}

/// Default error handler: report through tracing.
fn log_request_error(completion: &Completion, message: &str) {
    tracing::error!(
        method = %completion.method,
        url = %completion.url,
        status = completion.status,
        reason = message,
        "mite request failed"
    );
}
