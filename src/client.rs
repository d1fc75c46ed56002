use std::time::Duration;

/// Default Sellsy API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://apifeed.sellsy.com/0/";

/// Create the blocking HTTP client used for synchronous calls
pub fn create_blocking_client(
    config: &Config,
    verify_tls: bool,
) -> reqwest::Result<reqwest::blocking::Client> {
    reqwest::blocking::ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .danger_accept_invalid_certs(!verify_tls)
        .build()
}

/// Create the async HTTP client used for asynchronous calls
pub fn create_async_client(config: &Config, verify_tls: bool) -> reqwest::Result<reqwest::Client> {
    reqwest::ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .danger_accept_invalid_certs(!verify_tls)
        .build()
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL every call is posted to, used verbatim
    pub endpoint: String,
    /// Overall request timeout of the default transports
    pub timeout: Duration,
    /// Connect timeout of the default transports
    pub connect_timeout: Duration,
    /// Emit per-call timing events
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_ENDPOINT)
    }
}

impl Config {
    /// Create a new configuration for the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Config {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(300), // 5 minutes
            connect_timeout: Duration::from_secs(10),
            debug: false,
        }
    }

    /// Set debug mode
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the overall request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Whether certificates must be verified: only `https` endpoints use TLS.
    pub fn verify_tls(&self) -> bool {
        self.endpoint
            .get(..8)
            .map_or(false, |scheme| scheme.eq_ignore_ascii_case("https://"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.verify_tls());
        assert!(!config.debug);
    }

    #[test]
    fn test_verify_tls_follows_scheme() {
        assert!(Config::new("HTTPS://api.example.com").verify_tls());
        assert!(!Config::new("http://localhost:8080").verify_tls());
        assert!(!Config::new("http").verify_tls());
    }

    #[test]
    fn test_builder() {
        let config = Config::new("http://localhost")
            .with_debug(true)
            .with_timeout(Duration::from_secs(5))
            .with_connect_timeout(Duration::from_secs(1));
        assert!(config.debug);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
    }
}
