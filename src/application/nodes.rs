use reqwest::Method;
use serde_json::Value;

use super::APPLICATION_BASE;
use crate::error::Error;
use crate::models::application::{CreateAllocations, Node, NodeAllocation, NodeParams};
use crate::net::api::{HttpClient, Mutation, NO_BODY, decode};
use crate::net::types::{Page, RequestOptions};

#[derive(Clone, Copy, Debug)]
pub struct NodeApi<'a> {
    http: &'a HttpClient,
}

fn node_path(node_id: u64, suffix: &str) -> String {
    format!("{APPLICATION_BASE}/nodes/{node_id}{suffix}")
}

impl<'a> NodeApi<'a> {
    pub(crate) fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, options: Option<&RequestOptions>) -> Result<Page<Node>, Error> {
        self.http
            .fetch_list(&format!("{APPLICATION_BASE}/nodes"), options)
            .await
    }

    pub async fn get(&self, node_id: u64, options: Option<&RequestOptions>) -> Result<Node, Error> {
        self.http.fetch_one(&node_path(node_id, ""), options).await
    }

    /// Nodes with enough free capacity for a new server.
    pub async fn deployable(&self, options: Option<&RequestOptions>) -> Result<Page<Node>, Error> {
        self.http
            .fetch_list(&format!("{APPLICATION_BASE}/nodes/deployable"), options)
            .await
    }

    pub async fn create(&self, params: &NodeParams) -> Result<Node, Error> {
        self.http
            .mutate_one(Mutation::Create, &format!("{APPLICATION_BASE}/nodes"), Some(params))
            .await
    }

    pub async fn update(&self, node_id: u64, params: &NodeParams) -> Result<Node, Error> {
        self.http
            .mutate_one(Mutation::Update, &node_path(node_id, ""), Some(params))
            .await
    }

    pub async fn delete(&self, node_id: u64) -> Result<(), Error> {
        self.http.remove(&node_path(node_id, ""), NO_BODY).await
    }

    /// The daemon configuration file contents, as the panel renders them.
    pub async fn configuration(&self, node_id: u64) -> Result<Value, Error> {
        let response = self
            .http
            .raw_request(Method::GET, &node_path(node_id, "/configuration"), NO_BODY, None)
            .await?;
        decode(response).await
    }

    // ===== ALLOCATIONS =====

    pub async fn allocations(&self, node_id: u64, options: Option<&RequestOptions>) -> Result<Page<NodeAllocation>, Error> {
        self.http
            .fetch_list(&node_path(node_id, "/allocations"), options)
            .await
    }

    pub async fn create_allocations(&self, node_id: u64, params: &CreateAllocations) -> Result<(), Error> {
        self.http
            .execute(Mutation::Create, &node_path(node_id, "/allocations"), Some(params))
            .await
    }

    pub async fn delete_allocation(&self, node_id: u64, allocation_id: u64) -> Result<(), Error> {
        self.http
            .remove(&node_path(node_id, &format!("/allocations/{allocation_id}")), NO_BODY)
            .await
    }
}
