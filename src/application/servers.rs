use super::APPLICATION_BASE;
use crate::error::Error;
use crate::models::application::{
    CreateServer, CreateServerDatabase, Server, ServerDatabase, TransferServer, UpdateServerBuild,
    UpdateServerDetails, UpdateServerStartup,
};
use crate::net::api::{HttpClient, Mutation, NO_BODY};
use crate::net::types::{Page, RequestOptions};

/// Every server on the panel, addressed by numeric id.
#[derive(Clone, Copy, Debug)]
pub struct ServerApi<'a> {
    http: &'a HttpClient,
}

fn server_path(server_id: u64, suffix: &str) -> String {
    format!("{APPLICATION_BASE}/servers/{server_id}{suffix}")
}

impl<'a> ServerApi<'a> {
    pub(crate) fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, options: Option<&RequestOptions>) -> Result<Page<Server>, Error> {
        self.http
            .fetch_list(&format!("{APPLICATION_BASE}/servers"), options)
            .await
    }

    pub async fn get(&self, server_id: u64, options: Option<&RequestOptions>) -> Result<Server, Error> {
        self.http.fetch_one(&server_path(server_id, ""), options).await
    }

    pub async fn get_by_external_id(&self, external_id: &str, options: Option<&RequestOptions>) -> Result<Server, Error> {
        let path = format!(
            "{APPLICATION_BASE}/servers/external/{}",
            urlencoding::encode(external_id)
        );
        self.http.fetch_one(&path, options).await
    }

    pub async fn create(&self, params: &CreateServer) -> Result<Server, Error> {
        self.http
            .mutate_one(Mutation::Create, &format!("{APPLICATION_BASE}/servers"), Some(params))
            .await
    }

    // ===== CONFIGURATION =====

    pub async fn update_details(&self, server_id: u64, params: &UpdateServerDetails) -> Result<Server, Error> {
        self.http
            .mutate_one(Mutation::Update, &server_path(server_id, "/details"), Some(params))
            .await
    }

    /// Limits, feature limits and allocations.
    pub async fn update_build(&self, server_id: u64, params: &UpdateServerBuild) -> Result<Server, Error> {
        self.http
            .mutate_one(Mutation::Update, &server_path(server_id, "/build"), Some(params))
            .await
    }

    pub async fn update_startup(&self, server_id: u64, params: &UpdateServerStartup) -> Result<Server, Error> {
        self.http
            .mutate_one(Mutation::Update, &server_path(server_id, "/startup"), Some(params))
            .await
    }

    // ===== LIFECYCLE =====

    pub async fn suspend(&self, server_id: u64) -> Result<(), Error> {
        self.post(server_id, "/suspend").await
    }

    pub async fn unsuspend(&self, server_id: u64) -> Result<(), Error> {
        self.post(server_id, "/unsuspend").await
    }

    pub async fn reinstall(&self, server_id: u64) -> Result<(), Error> {
        self.post(server_id, "/reinstall").await
    }

    pub async fn delete(&self, server_id: u64) -> Result<(), Error> {
        self.http.remove(&server_path(server_id, ""), NO_BODY).await
    }

    /// Delete even when the node cannot be reached to clean up files.
    pub async fn force_delete(&self, server_id: u64) -> Result<(), Error> {
        self.http.remove(&server_path(server_id, "/force"), NO_BODY).await
    }

    /// Move the server to another node.
    pub async fn transfer(&self, server_id: u64, params: &TransferServer) -> Result<(), Error> {
        self.http
            .execute(Mutation::Create, &server_path(server_id, "/transfer"), Some(params))
            .await
    }

    pub async fn cancel_transfer(&self, server_id: u64) -> Result<(), Error> {
        self.post(server_id, "/transfer/cancel").await
    }

    // ===== DATABASES =====

    pub async fn databases(&self, server_id: u64, options: Option<&RequestOptions>) -> Result<Page<ServerDatabase>, Error> {
        self.http
            .fetch_list(&server_path(server_id, "/databases"), options)
            .await
    }

    pub async fn database(
        &self,
        server_id: u64,
        database_id: u64,
        options: Option<&RequestOptions>,
    ) -> Result<ServerDatabase, Error> {
        self.http
            .fetch_one(&server_path(server_id, &format!("/databases/{database_id}")), options)
            .await
    }

    pub async fn create_database(&self, server_id: u64, params: &CreateServerDatabase) -> Result<ServerDatabase, Error> {
        self.http
            .mutate_one(Mutation::Create, &server_path(server_id, "/databases"), Some(params))
            .await
    }

    pub async fn reset_database_password(&self, server_id: u64, database_id: u64) -> Result<(), Error> {
        self.post(server_id, &format!("/databases/{database_id}/reset-password"))
            .await
    }

    pub async fn delete_database(&self, server_id: u64, database_id: u64) -> Result<(), Error> {
        self.http
            .remove(&server_path(server_id, &format!("/databases/{database_id}")), NO_BODY)
            .await
    }

    async fn post(&self, server_id: u64, suffix: &str) -> Result<(), Error> {
        self.http
            .execute(Mutation::Create, &server_path(server_id, suffix), NO_BODY)
            .await
    }
}
