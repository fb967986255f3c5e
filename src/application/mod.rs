//! Application (administrative) API surface, rooted at `/api/application`.
//!
//! Requires an application key. Every manager borrows the transport owned by
//! [`PelicanApplication`], so they are cheap to create per call.

mod database_hosts;
mod eggs;
mod locations;
mod mounts;
mod nodes;
mod roles;
mod servers;
mod users;

pub use database_hosts::DatabaseHostApi;
pub use eggs::{EggApi, NestApi};
pub use locations::LocationApi;
pub use mounts::{MountApi, MountTarget};
pub use nodes::NodeApi;
pub use roles::RoleApi;
pub use servers::ServerApi;
pub use users::UserApi;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::net::api::HttpClient;
use crate::net::types::RateLimit;

pub const APPLICATION_BASE: &str = "/api/application";

#[derive(Debug)]
pub struct PelicanApplication {
    http: HttpClient,
}

impl PelicanApplication {
    /// # Errors
    ///
    /// Fails when the API key cannot be sent as a header or the HTTP client
    /// cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }

    /// Build from `PELICAN_*` environment variables.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`] and [`PelicanApplication::new`].
    pub fn from_env() -> Result<Self, Error> {
        Self::new(&ClientConfig::from_env()?)
    }

    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    #[must_use]
    pub fn users(&self) -> UserApi<'_> {
        UserApi::new(&self.http)
    }

    #[must_use]
    pub fn servers(&self) -> ServerApi<'_> {
        ServerApi::new(&self.http)
    }

    #[must_use]
    pub fn nodes(&self) -> NodeApi<'_> {
        NodeApi::new(&self.http)
    }

    #[must_use]
    pub fn eggs(&self) -> EggApi<'_> {
        EggApi::new(&self.http)
    }

    #[must_use]
    pub fn nests(&self) -> NestApi<'_> {
        NestApi::new(&self.http)
    }

    #[must_use]
    pub fn locations(&self) -> LocationApi<'_> {
        LocationApi::new(&self.http)
    }

    #[must_use]
    pub fn database_hosts(&self) -> DatabaseHostApi<'_> {
        DatabaseHostApi::new(&self.http)
    }

    #[must_use]
    pub fn mounts(&self) -> MountApi<'_> {
        MountApi::new(&self.http)
    }

    #[must_use]
    pub fn roles(&self) -> RoleApi<'_> {
        RoleApi::new(&self.http)
    }

    #[must_use]
    pub fn rate_limit(&self) -> Option<RateLimit> {
        self.http.rate_limit()
    }
}

#[cfg(test)]
#[path = "application_test.rs"]
mod tests;
