//! Connection settings for the DataCite REST API.

use log::debug;
use reqwest::{
    Client, Url,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use std::fmt;
use std::time::Duration;

use crate::error::{DataCiteError, Result};
use crate::runtime::Runtime;

pub const PRODUCTION_URL: &str = "https://api.datacite.org/";
pub const TEST_URL: &str = "https://api.test.datacite.org/";

/// JSON:API media type used for both request bodies and responses.
pub const JSON_API: &str = "application/vnd.api+json";

/// Immutable connection settings. Build with [`ClientConfig::new`] and the
/// `with_*` methods, or load from the environment with [`ClientConfig::from_env`].
#[derive(Clone)]
pub struct ClientConfig {
    username: String,
    password: String,
    prefix: String,
    base_url: String,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            prefix: prefix.into(),
            base_url: PRODUCTION_URL.to_string(),
            timeout: None,
            connect_timeout: None,
        }
    }

    /// Uses a custom API endpoint. A trailing slash is added when missing.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(url.into());
        self
    }

    /// Switches to the DataCite test endpoint, overriding any custom base URL.
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        if test_mode {
            self.base_url = TEST_URL.to_string();
        }
        self
    }

    /// Total time allowed per request, connect through body read.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Loads settings from `DATACITE_*` environment variables.
    ///
    /// `DATACITE_USER`, `DATACITE_PW` and `DATACITE_PREFIX` are required.
    /// `DATACITE_URL`, `DATACITE_TEST_MODE` and `DATACITE_TIMEOUT` (seconds)
    /// are optional.
    pub fn from_env<R: Runtime + ?Sized>(runtime: &R) -> Result<Self> {
        let required = |key: &str| {
            runtime
                .env_var(key)
                .map_err(|_| DataCiteError::Config(format!("{} is not set", key)))
        };

        let mut config = Self::new(
            required("DATACITE_USER")?,
            required("DATACITE_PW")?,
            required("DATACITE_PREFIX")?,
        );

        if let Ok(url) = runtime.env_var("DATACITE_URL") {
            config = config.with_base_url(url);
        }

        if let Ok(flag) = runtime.env_var("DATACITE_TEST_MODE") {
            config = config.with_test_mode(parse_flag(&flag));
        }

        if let Ok(secs) = runtime.env_var("DATACITE_TIMEOUT") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                DataCiteError::Config(format!(
                    "DATACITE_TIMEOUT must be whole seconds, got '{}'",
                    secs
                ))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        debug!("Loaded DataCite config from environment: {:?}", config);
        Ok(config)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Absolute URL for path segments below the API root.
    ///
    /// Each segment is percent-encoded on its own, so `?`, `#`, `%` and `/`
    /// inside a segment never change which resource is addressed.
    pub fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            DataCiteError::Config(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                DataCiteError::Config(format!("Base URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Builds the underlying HTTP client with the configured timeouts and
    /// the JSON:API `Accept` header.
    pub(crate) fn http_client(&self) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_API));

        let mut builder = Client::builder()
            .user_agent(concat!("datacite-rs/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(builder.build()?)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .field("prefix", &self.prefix)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

fn normalize_base_url(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
