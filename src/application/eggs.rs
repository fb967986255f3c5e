use reqwest::Method;
use serde_json::Value;

use super::APPLICATION_BASE;
use crate::error::Error;
use crate::models::application::{Egg, Nest};
use crate::net::api::{HttpClient, Mutation, NO_BODY, decode};
use crate::net::types::{Page, RequestOptions};

#[derive(Clone, Copy, Debug)]
pub struct EggApi<'a> {
    http: &'a HttpClient,
}

impl<'a> EggApi<'a> {
    pub(crate) fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, options: Option<&RequestOptions>) -> Result<Page<Egg>, Error> {
        self.http
            .fetch_list(&format!("{APPLICATION_BASE}/eggs"), options)
            .await
    }

    pub async fn get(&self, egg_id: u64, options: Option<&RequestOptions>) -> Result<Egg, Error> {
        self.http
            .fetch_one(&format!("{APPLICATION_BASE}/eggs/{egg_id}"), options)
            .await
    }

    pub async fn delete(&self, egg_id: u64) -> Result<(), Error> {
        self.http
            .remove(&format!("{APPLICATION_BASE}/eggs/{egg_id}"), NO_BODY)
            .await
    }

    pub async fn delete_by_uuid(&self, uuid: &str) -> Result<(), Error> {
        self.http
            .remove(&format!("{APPLICATION_BASE}/eggs/{uuid}"), NO_BODY)
            .await
    }

    /// Portable egg definition, suitable for [`EggApi::import`].
    pub async fn export(&self, egg_id: u64) -> Result<Value, Error> {
        let path = format!("{APPLICATION_BASE}/eggs/{egg_id}/export");
        let response = self.http.raw_request(Method::GET, &path, NO_BODY, None).await?;
        decode(response).await
    }

    pub async fn import(&self, definition: &Value) -> Result<Egg, Error> {
        self.http
            .mutate_one(Mutation::Create, &format!("{APPLICATION_BASE}/eggs/import"), Some(definition))
            .await
    }
}

/// Read-only egg groupings.
#[derive(Clone, Copy, Debug)]
pub struct NestApi<'a> {
    http: &'a HttpClient,
}

impl<'a> NestApi<'a> {
    pub(crate) fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, options: Option<&RequestOptions>) -> Result<Page<Nest>, Error> {
        self.http
            .fetch_list(&format!("{APPLICATION_BASE}/nests"), options)
            .await
    }

    pub async fn get(&self, nest_id: u64, options: Option<&RequestOptions>) -> Result<Nest, Error> {
        self.http
            .fetch_one(&format!("{APPLICATION_BASE}/nests/{nest_id}"), options)
            .await
    }

    pub async fn eggs(&self, nest_id: u64, options: Option<&RequestOptions>) -> Result<Page<Egg>, Error> {
        self.http
            .fetch_list(&format!("{APPLICATION_BASE}/nests/{nest_id}/eggs"), options)
            .await
    }

    pub async fn egg(&self, nest_id: u64, egg_id: u64, options: Option<&RequestOptions>) -> Result<Egg, Error> {
        self.http
            .fetch_one(&format!("{APPLICATION_BASE}/nests/{nest_id}/eggs/{egg_id}"), options)
            .await
    }
}
