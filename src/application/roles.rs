use super::APPLICATION_BASE;
use crate::error::Error;
use crate::models::application::{Role, RoleParams};
use crate::net::api::{HttpClient, Mutation, NO_BODY};
use crate::net::types::{Page, RequestOptions};

#[derive(Clone, Copy, Debug)]
pub struct RoleApi<'a> {
    http: &'a HttpClient,
}

impl<'a> RoleApi<'a> {
    pub(crate) fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, options: Option<&RequestOptions>) -> Result<Page<Role>, Error> {
        self.http
            .fetch_list(&format!("{APPLICATION_BASE}/roles"), options)
            .await
    }

    pub async fn get(&self, role_id: u64, options: Option<&RequestOptions>) -> Result<Role, Error> {
        self.http
            .fetch_one(&format!("{APPLICATION_BASE}/roles/{role_id}"), options)
            .await
    }

    pub async fn create(&self, params: &RoleParams) -> Result<Role, Error> {
        self.http
            .mutate_one(Mutation::Create, &format!("{APPLICATION_BASE}/roles"), Some(params))
            .await
    }

    pub async fn update(&self, role_id: u64, params: &RoleParams) -> Result<Role, Error> {
        self.http
            .mutate_one(Mutation::Update, &format!("{APPLICATION_BASE}/roles/{role_id}"), Some(params))
            .await
    }

    pub async fn delete(&self, role_id: u64) -> Result<(), Error> {
        self.http
            .remove(&format!("{APPLICATION_BASE}/roles/{role_id}"), NO_BODY)
            .await
    }
}
