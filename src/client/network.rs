use serde_json::json;

use crate::error::Error;
use crate::models::client::Allocation;
use crate::net::api::{HttpClient, Mutation, NO_BODY};

/// Port allocations of one server.
#[derive(Clone, Debug)]
pub struct NetworkApi<'a> {
    http: &'a HttpClient,
    base: String,
}

impl<'a> NetworkApi<'a> {
    pub(crate) fn new(http: &'a HttpClient, server_base: &str) -> Self {
        Self {
            http,
            base: format!("{server_base}/network/allocations"),
        }
    }

    pub async fn list(&self) -> Result<Vec<Allocation>, Error> {
        let page = self.http.fetch_list(&self.base, None).await?;
        Ok(page.data)
    }

    /// Claim a free allocation on the server's node.
    pub async fn assign(&self) -> Result<Allocation, Error> {
        self.http
            .mutate_one(Mutation::Create, &self.base, NO_BODY)
            .await
    }

    pub async fn set_primary(&self, allocation_id: u64) -> Result<Allocation, Error> {
        self.http
            .mutate_one(Mutation::Create, &format!("{}/{allocation_id}/primary", self.base), NO_BODY)
            .await
    }

    pub async fn update_notes(&self, allocation_id: u64, notes: &str) -> Result<Allocation, Error> {
        let body = json!({ "notes": notes });
        self.http
            .mutate_one(Mutation::Create, &format!("{}/{allocation_id}", self.base), Some(&body))
            .await
    }

    pub async fn remove(&self, allocation_id: u64) -> Result<(), Error> {
        self.http
            .remove(&format!("{}/{allocation_id}", self.base), NO_BODY)
            .await
    }
}
