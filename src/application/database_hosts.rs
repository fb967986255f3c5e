use super::APPLICATION_BASE;
use crate::error::Error;
use crate::models::application::{DatabaseHost, DatabaseHostParams};
use crate::net::api::{HttpClient, Mutation, NO_BODY};
use crate::net::types::{Page, RequestOptions};

/// External database servers that server databases are provisioned on.
#[derive(Clone, Copy, Debug)]
pub struct DatabaseHostApi<'a> {
    http: &'a HttpClient,
}

impl<'a> DatabaseHostApi<'a> {
    pub(crate) fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, options: Option<&RequestOptions>) -> Result<Page<DatabaseHost>, Error> {
        self.http
            .fetch_list(&format!("{APPLICATION_BASE}/database-hosts"), options)
            .await
    }

    pub async fn get(&self, host_id: u64, options: Option<&RequestOptions>) -> Result<DatabaseHost, Error> {
        self.http
            .fetch_one(&format!("{APPLICATION_BASE}/database-hosts/{host_id}"), options)
            .await
    }

    pub async fn create(&self, params: &DatabaseHostParams) -> Result<DatabaseHost, Error> {
        self.http
            .mutate_one(Mutation::Create, &format!("{APPLICATION_BASE}/database-hosts"), Some(params))
            .await
    }

    pub async fn update(&self, host_id: u64, params: &DatabaseHostParams) -> Result<DatabaseHost, Error> {
        self.http
            .mutate_one(Mutation::Update, &format!("{APPLICATION_BASE}/database-hosts/{host_id}"), Some(params))
            .await
    }

    pub async fn delete(&self, host_id: u64) -> Result<(), Error> {
        self.http
            .remove(&format!("{APPLICATION_BASE}/database-hosts/{host_id}"), NO_BODY)
            .await
    }
}
