//! Server configuration.

use std::net::{AddrParseError, SocketAddr};

/// The API version the server answers `Accept-Version` checks with.
pub const API_VERSION: &str = "1.0";

/// Configuration for the clipshelf server.
///
/// # Example
///
/// ```
/// use clipshelf_server::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .http_addr("127.0.0.1:8000")
///     .expose_internal_errors(false)
///     .build();
///
/// assert_eq!(config.http_addr(), "127.0.0.1:8000");
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    http_addr: String,
    api_version: String,
    expose_internal_errors: bool,
}

impl ServerConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Builds a configuration from environment variables.
    ///
    /// - `CLIPSHELF_HTTP_ADDR` - bind address (default `127.0.0.1:8000`)
    /// - `CLIPSHELF_EXPOSE_INTERNAL_ERRORS` - `1`/`true` enables error
    ///   detail in envelopes (development only)
    #[must_use]
    pub fn from_env() -> Self {
        let mut builder = Self::builder();
        if let Ok(addr) = std::env::var("CLIPSHELF_HTTP_ADDR") {
            builder = builder.http_addr(addr);
        }
        if let Ok(value) = std::env::var("CLIPSHELF_EXPOSE_INTERNAL_ERRORS") {
            builder = builder.expose_internal_errors(matches!(value.as_str(), "1" | "true"));
        }
        builder.build()
    }

    /// Returns the HTTP bind address.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Parses the bind address into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.http_addr.parse()
    }

    /// Returns the supported API version.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Whether error envelopes carry internal detail.
    #[must_use]
    pub fn expose_internal_errors(&self) -> bool {
        self.expose_internal_errors
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    http_addr: Option<String>,
    api_version: Option<String>,
    expose_internal_errors: bool,
}

impl ServerConfigBuilder {
    /// Sets the HTTP bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.http_addr = Some(addr.into());
        self
    }

    /// Sets the supported API version.
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Enables internal error detail in envelopes (development only).
    #[must_use]
    pub fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            http_addr: self
                .http_addr
                .unwrap_or_else(|| "127.0.0.1:8000".to_string()),
            api_version: self.api_version.unwrap_or_else(|| API_VERSION.to_string()),
            expose_internal_errors: self.expose_internal_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr(), "127.0.0.1:8000");
        assert_eq!(config.api_version(), "1.0");
        assert!(!config.expose_internal_errors());
        assert!(config.socket_addr().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ServerConfig::builder()
            .http_addr("0.0.0.0:9000")
            .api_version("2.0")
            .expose_internal_errors(true)
            .build();

        assert_eq!(config.http_addr(), "0.0.0.0:9000");
        assert_eq!(config.api_version(), "2.0");
        assert!(config.expose_internal_errors());
    }

    #[test]
    fn test_invalid_addr_fails_to_parse() {
        let config = ServerConfig::builder().http_addr("nonsense").build();
        assert!(config.socket_addr().is_err());
    }
}
