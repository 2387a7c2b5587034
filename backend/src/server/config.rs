//! HTTP server configuration read from the environment.

use std::env;
use std::net::SocketAddr;

use url::Url;

use qbank::outbound::storage::StorageSettings;

/// Default bind address when `QBANK_BIND_ADDR` is unset.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Default storage container when `STORAGE_CONTAINER` is unset.
const DEFAULT_CONTAINER: &str = "qbank-media";

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) database_url: Option<String>,
    pub(crate) redis_url: Option<String>,
    pub(crate) storage: Option<StorageSettings>,
    pub(crate) container: String,
}

impl ServerConfig {
    /// Read configuration from the environment.
    ///
    /// `DATABASE_URL`, `REDIS_URL`, and the `STORAGE_*` group are each
    /// optional; missing infrastructure falls back to in-process fixtures so
    /// the binary still boots for smoke testing.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] when a set variable fails to parse.
    pub fn from_env() -> std::io::Result<Self> {
        let bind_addr: SocketAddr = env::var("QBANK_BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_owned())
            .parse()
            .map_err(|err| std::io::Error::other(format!("invalid QBANK_BIND_ADDR: {err}")))?;

        let storage = match (
            env::var("STORAGE_ENDPOINT").ok(),
            env::var("STORAGE_PUBLIC_BASE_URL").ok(),
            env::var("STORAGE_SIGNING_KEY").ok(),
        ) {
            (Some(endpoint), Some(public_base), Some(signing_key)) => Some(StorageSettings {
                endpoint: parse_url("STORAGE_ENDPOINT", &endpoint)?,
                public_base: parse_url("STORAGE_PUBLIC_BASE_URL", &public_base)?,
                signing_key,
            }),
            (None, None, None) => None,
            _ => {
                return Err(std::io::Error::other(
                    "STORAGE_ENDPOINT, STORAGE_PUBLIC_BASE_URL, and STORAGE_SIGNING_KEY \
                     must be set together",
                ));
            }
        };

        Ok(Self {
            bind_addr,
            database_url: env::var("DATABASE_URL").ok(),
            redis_url: env::var("REDIS_URL").ok(),
            storage,
            container: env::var("STORAGE_CONTAINER")
                .unwrap_or_else(|_| DEFAULT_CONTAINER.to_owned()),
        })
    }

}

fn parse_url(name: &str, value: &str) -> std::io::Result<Url> {
    Url::parse(value).map_err(|err| std::io::Error::other(format!("invalid {name}: {err}")))
}
