use serde_json::{Value, json};

use super::APPLICATION_BASE;
use crate::error::Error;
use crate::models::application::{Mount, MountParams};
use crate::net::api::{HttpClient, Mutation, NO_BODY};
use crate::net::types::{Page, RequestOptions};

/// Host directories bind-mounted into server containers.
///
/// A mount is only offered to servers whose egg and node are both attached
/// to it; the relation calls below manage those attachments.
#[derive(Clone, Copy, Debug)]
pub struct MountApi<'a> {
    http: &'a HttpClient,
}

/// Resource kinds a mount can be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MountTarget {
    Eggs,
    Nodes,
    Servers,
}

impl MountTarget {
    fn segment(self) -> &'static str {
        match self {
            Self::Eggs => "eggs",
            Self::Nodes => "nodes",
            Self::Servers => "servers",
        }
    }
}

fn mount_path(mount_id: u64, suffix: &str) -> String {
    format!("{APPLICATION_BASE}/mounts/{mount_id}{suffix}")
}

impl<'a> MountApi<'a> {
    pub(crate) fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, options: Option<&RequestOptions>) -> Result<Page<Mount>, Error> {
        self.http
            .fetch_list(&format!("{APPLICATION_BASE}/mounts"), options)
            .await
    }

    pub async fn get(&self, mount_id: u64, options: Option<&RequestOptions>) -> Result<Mount, Error> {
        self.http.fetch_one(&mount_path(mount_id, ""), options).await
    }

    pub async fn create(&self, params: &MountParams) -> Result<Mount, Error> {
        self.http
            .mutate_one(Mutation::Create, &format!("{APPLICATION_BASE}/mounts"), Some(params))
            .await
    }

    pub async fn update(&self, mount_id: u64, params: &MountParams) -> Result<Mount, Error> {
        self.http
            .mutate_one(Mutation::Update, &mount_path(mount_id, ""), Some(params))
            .await
    }

    pub async fn delete(&self, mount_id: u64) -> Result<(), Error> {
        self.http.remove(&mount_path(mount_id, ""), NO_BODY).await
    }

    // ===== RELATIONS =====

    /// Attached resources, as raw attributes since their shape depends on
    /// `target`.
    pub async fn attached(
        &self,
        mount_id: u64,
        target: MountTarget,
        options: Option<&RequestOptions>,
    ) -> Result<Page<Value>, Error> {
        let path = mount_path(mount_id, &format!("/{}", target.segment()));
        self.http.fetch_list(&path, options).await
    }

    pub async fn attach(&self, mount_id: u64, target: MountTarget, ids: &[u64]) -> Result<(), Error> {
        let segment = target.segment();
        let body = json!({ segment: ids });
        self.http
            .execute(Mutation::Create, &mount_path(mount_id, &format!("/{segment}")), Some(&body))
            .await
    }

    pub async fn detach(&self, mount_id: u64, target: MountTarget, id: u64) -> Result<(), Error> {
        let path = mount_path(mount_id, &format!("/{}/{id}", target.segment()));
        self.http.remove(&path, NO_BODY).await
    }
}
