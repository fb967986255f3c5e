use std::sync::Arc;

use serde_json::json;

use super::{BackupApi, CLIENT_BASE, DatabaseApi, FileApi, NetworkApi, ScheduleApi, SubuserApi};
use crate::error::Error;
use crate::models::client::{ActivityLog, Server, ServerResources, StartupVariable, WebSocketCredentials};
use crate::net::api::{HttpClient, Mutation, NO_BODY};
use crate::net::channel::{ChannelError, ChannelManager, ChannelOptions};
use crate::net::events::PowerAction;
use crate::net::socket::TokenProvider;
use crate::net::types::{Page, RequestOptions};

/// Calls scoped to one server, addressed by its short identifier.
#[derive(Clone, Debug)]
pub struct ServerContext {
    http: Arc<HttpClient>,
    base: String,
}

impl ServerContext {
    pub(crate) fn new(http: Arc<HttpClient>, identifier: &str) -> Self {
        Self {
            http,
            base: format!("{CLIENT_BASE}/servers/{identifier}"),
        }
    }

    #[must_use]
    pub fn files(&self) -> FileApi<'_> {
        FileApi::new(&self.http, &self.base)
    }

    #[must_use]
    pub fn databases(&self) -> DatabaseApi<'_> {
        DatabaseApi::new(&self.http, &self.base)
    }

    #[must_use]
    pub fn backups(&self) -> BackupApi<'_> {
        BackupApi::new(&self.http, &self.base)
    }

    #[must_use]
    pub fn schedules(&self) -> ScheduleApi<'_> {
        ScheduleApi::new(&self.http, &self.base)
    }

    #[must_use]
    pub fn network(&self) -> NetworkApi<'_> {
        NetworkApi::new(&self.http, &self.base)
    }

    #[must_use]
    pub fn subusers(&self) -> SubuserApi<'_> {
        SubuserApi::new(&self.http, &self.base)
    }

    pub async fn details(&self, options: Option<&RequestOptions>) -> Result<Server, Error> {
        self.http.fetch_one(&self.base, options).await
    }

    /// Live usage as reported by the daemon.
    pub async fn resources(&self) -> Result<ServerResources, Error> {
        self.http.fetch_one(&format!("{}/resources", self.base), None).await
    }

    pub async fn activity(&self, options: Option<&RequestOptions>) -> Result<Page<ActivityLog>, Error> {
        self.http
            .fetch_list(&format!("{}/activity", self.base), options)
            .await
    }

    /// Run a console command over REST. Fails with a 502 from the panel
    /// when the server is offline.
    pub async fn send_command(&self, command: &str) -> Result<(), Error> {
        let body = json!({ "command": command });
        self.http
            .execute(Mutation::Create, &format!("{}/command", self.base), Some(&body))
            .await
    }

    pub async fn set_power_state(&self, signal: PowerAction) -> Result<(), Error> {
        let body = json!({ "signal": signal });
        self.http
            .execute(Mutation::Create, &format!("{}/power", self.base), Some(&body))
            .await
    }

    pub async fn websocket_credentials(&self) -> Result<WebSocketCredentials, Error> {
        self.http.fetch_data(&format!("{}/websocket", self.base)).await
    }

    pub async fn startup_variables(&self) -> Result<Vec<StartupVariable>, Error> {
        let page = self
            .http
            .fetch_list(&format!("{}/startup", self.base), None)
            .await?;
        Ok(page.data)
    }

    pub async fn update_startup_variable(&self, key: &str, value: &str) -> Result<StartupVariable, Error> {
        let body = json!({ "key": key, "value": value });
        self.http
            .mutate_one(Mutation::Replace, &format!("{}/startup/variable", self.base), Some(&body))
            .await
    }

    pub async fn rename(&self, name: &str) -> Result<(), Error> {
        let body = json!({ "name": name });
        self.http
            .execute(Mutation::Create, &format!("{}/settings/rename", self.base), Some(&body))
            .await
    }

    pub async fn update_description(&self, description: &str) -> Result<(), Error> {
        let body = json!({ "description": description });
        self.http
            .execute(Mutation::Create, &format!("{}/settings/description", self.base), Some(&body))
            .await
    }

    pub async fn set_docker_image(&self, image: &str) -> Result<(), Error> {
        let body = json!({ "docker_image": image });
        self.http
            .execute(Mutation::Replace, &format!("{}/settings/docker-image", self.base), Some(&body))
            .await
    }

    pub async fn reinstall(&self) -> Result<(), Error> {
        self.http
            .execute(Mutation::Create, &format!("{}/settings/reinstall", self.base), NO_BODY)
            .await
    }

    // ===== CONSOLE =====

    /// Token provider that fetches fresh websocket credentials on every call.
    #[must_use]
    pub fn websocket_tokens(&self) -> WebSocketTokens {
        WebSocketTokens {
            http: Arc::clone(&self.http),
            path: format!("{}/websocket", self.base),
        }
    }

    /// Build a channel manager for this server's console.
    ///
    /// Fetches credentials once to learn the socket URL; the returned manager
    /// is not yet connected and re-fetches a token on every handshake and
    /// refresh.
    pub async fn console(&self) -> Result<ChannelManager, Error> {
        self.console_with(|options| options).await
    }

    /// Like [`ServerContext::console`], with a chance to adjust the options.
    pub async fn console_with(
        &self,
        configure: impl FnOnce(ChannelOptions) -> ChannelOptions,
    ) -> Result<ChannelManager, Error> {
        let credentials = self.websocket_credentials().await?;
        let options = configure(ChannelOptions::new(credentials.socket, self.http.base_url()));
        Ok(ChannelManager::new(options, self.websocket_tokens()))
    }
}

/// [`TokenProvider`] backed by the server's `websocket` endpoint.
#[derive(Clone, Debug)]
pub struct WebSocketTokens {
    http: Arc<HttpClient>,
    path: String,
}

#[async_trait::async_trait]
impl TokenProvider for WebSocketTokens {
    async fn token(&self) -> Result<String, ChannelError> {
        let credentials: WebSocketCredentials = self
            .http
            .fetch_data(&self.path)
            .await
            .map_err(|error| ChannelError::Token(error.to_string()))?;
        Ok(credentials.token)
    }
}
