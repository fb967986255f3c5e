use super::APPLICATION_BASE;
use crate::error::Error;
use crate::models::application::{Location, LocationParams};
use crate::net::api::{HttpClient, Mutation, NO_BODY};
use crate::net::types::{Page, RequestOptions};

#[derive(Clone, Copy, Debug)]
pub struct LocationApi<'a> {
    http: &'a HttpClient,
}

impl<'a> LocationApi<'a> {
    pub(crate) fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, options: Option<&RequestOptions>) -> Result<Page<Location>, Error> {
        self.http
            .fetch_list(&format!("{APPLICATION_BASE}/locations"), options)
            .await
    }

    pub async fn get(&self, location_id: u64, options: Option<&RequestOptions>) -> Result<Location, Error> {
        self.http
            .fetch_one(&format!("{APPLICATION_BASE}/locations/{location_id}"), options)
            .await
    }

    pub async fn create(&self, params: &LocationParams) -> Result<Location, Error> {
        self.http
            .mutate_one(Mutation::Create, &format!("{APPLICATION_BASE}/locations"), Some(params))
            .await
    }

    pub async fn update(&self, location_id: u64, params: &LocationParams) -> Result<Location, Error> {
        self.http
            .mutate_one(Mutation::Update, &format!("{APPLICATION_BASE}/locations/{location_id}"), Some(params))
            .await
    }

    pub async fn delete(&self, location_id: u64) -> Result<(), Error> {
        self.http
            .remove(&format!("{APPLICATION_BASE}/locations/{location_id}"), NO_BODY)
            .await
    }
}
