use serde_json::json;

use crate::error::Error;
use crate::models::client::{CreateSubuser, Subuser};
use crate::net::api::{HttpClient, Mutation, NO_BODY};

#[derive(Clone, Debug)]
pub struct SubuserApi<'a> {
    http: &'a HttpClient,
    base: String,
}

impl<'a> SubuserApi<'a> {
    pub(crate) fn new(http: &'a HttpClient, server_base: &str) -> Self {
        Self {
            http,
            base: format!("{server_base}/users"),
        }
    }

    pub async fn list(&self) -> Result<Vec<Subuser>, Error> {
        let page = self.http.fetch_list(&self.base, None).await?;
        Ok(page.data)
    }

    pub async fn get(&self, uuid: &str) -> Result<Subuser, Error> {
        self.http.fetch_one(&format!("{}/{uuid}", self.base), None).await
    }

    /// Invite by email. Unknown addresses get an account created.
    pub async fn create(&self, params: &CreateSubuser) -> Result<Subuser, Error> {
        self.http
            .mutate_one(Mutation::Create, &self.base, Some(params))
            .await
    }

    /// Replace the subuser's permission set.
    pub async fn update(&self, uuid: &str, permissions: &[String]) -> Result<Subuser, Error> {
        let body = json!({ "permissions": permissions });
        self.http
            .mutate_one(Mutation::Create, &format!("{}/{uuid}", self.base), Some(&body))
            .await
    }

    pub async fn remove(&self, uuid: &str) -> Result<(), Error> {
        self.http.remove(&format!("{}/{uuid}", self.base), NO_BODY).await
    }
}
