//! Client (self-service) API surface, rooted at `/api/client`.
//!
//! [`PelicanClient`] owns the transport. Per-area handles such as
//! [`AccountApi`] borrow it; a [`ServerContext`] shares it through an `Arc`
//! so that its console can keep fetching websocket tokens for as long as the
//! channel lives.

mod account;
mod backups;
mod databases;
mod files;
mod network;
mod schedules;
mod servers;
mod subusers;

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;

pub use account::AccountApi;
pub use backups::BackupApi;
pub use databases::DatabaseApi;
pub use files::FileApi;
pub use network::NetworkApi;
pub use schedules::ScheduleApi;
pub use servers::{ServerContext, WebSocketTokens};
pub use subusers::SubuserApi;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::models::client::Server;
use crate::net::api::{HttpClient, NO_BODY, decode};
use crate::net::types::{Page, RateLimit, RequestOptions};

pub const CLIENT_BASE: &str = "/api/client";

#[derive(Clone, Debug)]
pub struct PelicanClient {
    http: Arc<HttpClient>,
}

#[derive(serde::Deserialize)]
struct AttributesBody {
    attributes: BTreeMap<String, Value>,
}

impl PelicanClient {
    /// # Errors
    ///
    /// Fails when the API key cannot be sent as a header or the HTTP client
    /// cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        Ok(Self {
            http: Arc::new(HttpClient::new(config)?),
        })
    }

    /// Build from `PELICAN_*` environment variables.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`] and [`PelicanClient::new`].
    pub fn from_env() -> Result<Self, Error> {
        Self::new(&ClientConfig::from_env()?)
    }

    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    #[must_use]
    pub fn account(&self) -> AccountApi<'_> {
        AccountApi::new(&self.http)
    }

    /// Servers the key's user can see.
    pub async fn servers(&self, options: Option<&RequestOptions>) -> Result<Page<Server>, Error> {
        self.http.fetch_list(CLIENT_BASE, options).await
    }

    /// Scope subsequent calls to one server by its short identifier.
    #[must_use]
    pub fn server(&self, identifier: &str) -> ServerContext {
        ServerContext::new(Arc::clone(&self.http), identifier)
    }

    /// Every permission key the panel knows, grouped as the panel returns them.
    pub async fn permissions(&self) -> Result<BTreeMap<String, Value>, Error> {
        let path = format!("{CLIENT_BASE}/permissions");
        let response = self.http.raw_request(Method::GET, &path, NO_BODY, None).await?;
        let body: AttributesBody = decode(response).await?;
        Ok(body.attributes)
    }

    #[must_use]
    pub fn rate_limit(&self) -> Option<RateLimit> {
        self.http.rate_limit()
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
