use crate::error::Error;
use crate::models::client::{CreateDatabase, Database};
use crate::net::api::{HttpClient, Mutation, NO_BODY};
use crate::net::types::RequestOptions;

#[derive(Clone, Debug)]
pub struct DatabaseApi<'a> {
    http: &'a HttpClient,
    base: String,
}

impl<'a> DatabaseApi<'a> {
    pub(crate) fn new(http: &'a HttpClient, server_base: &str) -> Self {
        Self {
            http,
            base: format!("{server_base}/databases"),
        }
    }

    /// Pass `include=password` through `options` to get passwords back.
    pub async fn list(&self, options: Option<&RequestOptions>) -> Result<Vec<Database>, Error> {
        let page = self.http.fetch_list(&self.base, options).await?;
        Ok(page.data)
    }

    pub async fn create(&self, params: &CreateDatabase) -> Result<Database, Error> {
        self.http
            .mutate_one(Mutation::Create, &self.base, Some(params))
            .await
    }

    pub async fn rotate_password(&self, database_id: &str) -> Result<Database, Error> {
        self.http
            .mutate_one(
                Mutation::Create,
                &format!("{}/{database_id}/rotate-password", self.base),
                NO_BODY,
            )
            .await
    }

    pub async fn delete(&self, database_id: &str) -> Result<(), Error> {
        self.http
            .remove(&format!("{}/{database_id}", self.base), NO_BODY)
            .await
    }
}
