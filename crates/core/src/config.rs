use std::fmt;
use std::time::Duration;

/// Delta Exchange India production endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.india.delta.exchange";

/// Per-request timeout applied by the REST client unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const ENV_BASE_URL: &str = "DELTA_BASE_URL";
pub const ENV_API_KEY: &str = "DELTA_API_KEY";
pub const ENV_API_SECRET: &str = "DELTA_API_SECRET";

/// Connection settings for the Delta REST client.
///
/// Built once at process start (from CLI flags or the environment) and
/// handed by value to the client constructor.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read `DELTA_BASE_URL`, `DELTA_API_KEY` and `DELTA_API_SECRET`.
    ///
    /// Unset variables fall back to the production URL and empty credentials.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        Self::new(var(ENV_BASE_URL), var(ENV_API_KEY), var(ENV_API_SECRET))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// True when both the API key and secret are non-empty.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, "", "")
    }
}

// Keep the secret out of logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &redact(&self.api_secret))
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "***"
    }
}

/// Strip whitespace and trailing slashes; blank falls back to the default.
fn normalize_base_url(url: String) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        url.to_string()
    }
}
