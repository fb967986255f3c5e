use super::APPLICATION_BASE;
use crate::error::Error;
use crate::models::application::{User, UserParams};
use crate::net::api::{HttpClient, Mutation, NO_BODY};
use crate::net::types::{Page, RequestOptions};

#[derive(Clone, Copy, Debug)]
pub struct UserApi<'a> {
    http: &'a HttpClient,
}

impl<'a> UserApi<'a> {
    pub(crate) fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    fn path(suffix: &str) -> String {
        format!("{APPLICATION_BASE}/users{suffix}")
    }

    pub async fn list(&self, options: Option<&RequestOptions>) -> Result<Page<User>, Error> {
        self.http.fetch_list(&Self::path(""), options).await
    }

    pub async fn get(&self, user_id: u64, options: Option<&RequestOptions>) -> Result<User, Error> {
        self.http.fetch_one(&Self::path(&format!("/{user_id}")), options).await
    }

    /// Look a user up by the identifier an external system assigned.
    pub async fn get_by_external_id(&self, external_id: &str, options: Option<&RequestOptions>) -> Result<User, Error> {
        let path = Self::path(&format!("/external/{}", urlencoding::encode(external_id)));
        self.http.fetch_one(&path, options).await
    }

    pub async fn create(&self, params: &UserParams) -> Result<User, Error> {
        self.http
            .mutate_one(Mutation::Create, &Self::path(""), Some(params))
            .await
    }

    pub async fn update(&self, user_id: u64, params: &UserParams) -> Result<User, Error> {
        self.http
            .mutate_one(Mutation::Update, &Self::path(&format!("/{user_id}")), Some(params))
            .await
    }

    pub async fn delete(&self, user_id: u64) -> Result<(), Error> {
        self.http.remove(&Self::path(&format!("/{user_id}")), NO_BODY).await
    }
}
