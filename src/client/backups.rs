use crate::error::Error;
use crate::models::client::{Backup, CreateBackup, SignedUrl};
use crate::net::api::{HttpClient, Mutation, NO_BODY};
use crate::net::types::{Page, RequestOptions};

#[derive(Clone, Debug)]
pub struct BackupApi<'a> {
    http: &'a HttpClient,
    base: String,
}

impl<'a> BackupApi<'a> {
    pub(crate) fn new(http: &'a HttpClient, server_base: &str) -> Self {
        Self {
            http,
            base: format!("{server_base}/backups"),
        }
    }

    pub async fn list(&self, options: Option<&RequestOptions>) -> Result<Page<Backup>, Error> {
        self.http.fetch_list(&self.base, options).await
    }

    pub async fn get(&self, uuid: &str) -> Result<Backup, Error> {
        self.http.fetch_one(&format!("{}/{uuid}", self.base), None).await
    }

    /// Start a backup. It completes asynchronously on the daemon.
    pub async fn create(&self, params: &CreateBackup) -> Result<Backup, Error> {
        self.http
            .mutate_one(Mutation::Create, &self.base, Some(params))
            .await
    }

    pub async fn download_url(&self, uuid: &str) -> Result<String, Error> {
        let signed: SignedUrl = self
            .http
            .fetch_one(&format!("{}/{uuid}/download", self.base), None)
            .await?;
        Ok(signed.url)
    }

    pub async fn delete(&self, uuid: &str) -> Result<(), Error> {
        self.http.remove(&format!("{}/{uuid}", self.base), NO_BODY).await
    }

    pub async fn restore(&self, uuid: &str) -> Result<(), Error> {
        self.http
            .execute(Mutation::Create, &format!("{}/{uuid}/restore", self.base), NO_BODY)
            .await
    }

    /// Flip the lock flag; locked backups cannot be deleted.
    pub async fn toggle_lock(&self, uuid: &str) -> Result<(), Error> {
        self.http
            .execute(Mutation::Create, &format!("{}/{uuid}/lock", self.base), NO_BODY)
            .await
    }
}
