use reqwest::Method;
use serde_json::json;
use urlencoding::encode;

use crate::error::Error;
use crate::models::client::{CompressionExtension, FileMode, FileObject, RenameFile, SignedUrl};
use crate::net::api::{HttpClient, Mutation, NO_BODY};

/// File manager of one server. Paths are relative to the server root.
#[derive(Clone, Debug)]
pub struct FileApi<'a> {
    http: &'a HttpClient,
    base: String,
}

impl<'a> FileApi<'a> {
    pub(crate) fn new(http: &'a HttpClient, server_base: &str) -> Self {
        Self {
            http,
            base: format!("{server_base}/files"),
        }
    }

    /// `GET files/list?directory=<path>`.
    pub async fn list(&self, directory: &str) -> Result<Vec<FileObject>, Error> {
        let path = format!("{}/list?directory={}", self.base, encode(directory));
        let page = self.http.fetch_list(&path, None).await?;
        Ok(page.data)
    }

    /// Raw file contents. The panel answers with plain text, not an envelope.
    pub async fn contents(&self, file: &str) -> Result<String, Error> {
        let path = format!("{}/contents?file={}", self.base, encode(file));
        let response = self.http.raw_request(Method::GET, &path, NO_BODY, None).await?;
        Ok(response.text().await?)
    }

    /// Create or overwrite `file` with `content`. The panel route is
    /// `POST files/write?file=<path>` with the raw text as the body.
    pub async fn write(&self, file: &str, content: impl Into<String>) -> Result<(), Error> {
        let path = format!("{}/write?file={}", self.base, encode(file));
        self.http.send_text(&path, content.into(), None).await
    }

    /// One-time URL the caller can upload into `directory` with.
    pub async fn upload_url(&self, directory: &str) -> Result<String, Error> {
        let path = format!("{}/upload?directory={}", self.base, encode(directory));
        let signed: SignedUrl = self.http.fetch_one(&path, None).await?;
        Ok(signed.url)
    }

    pub async fn download_url(&self, file: &str) -> Result<String, Error> {
        let path = format!("{}/download?file={}", self.base, encode(file));
        let signed: SignedUrl = self.http.fetch_one(&path, None).await?;
        Ok(signed.url)
    }

    pub async fn create_folder(&self, root: &str, name: &str) -> Result<(), Error> {
        let body = json!({ "root": root, "name": name });
        self.post(&format!("{}/create-folder", self.base), &body).await
    }

    /// Duplicate `location` next to itself.
    pub async fn copy(&self, location: &str) -> Result<(), Error> {
        let body = json!({ "location": location });
        self.post(&format!("{}/copy", self.base), &body).await
    }

    pub async fn rename(&self, root: &str, files: &[RenameFile]) -> Result<(), Error> {
        let body = json!({ "root": root, "files": files });
        self.http
            .execute(Mutation::Replace, &format!("{}/rename", self.base), Some(&body))
            .await
    }

    pub async fn delete(&self, root: &str, files: &[String]) -> Result<(), Error> {
        let body = json!({ "root": root, "files": files });
        self.post(&format!("{}/delete", self.base), &body).await
    }

    /// Archive `files` under `root`; returns the new archive.
    pub async fn compress(
        &self,
        root: &str,
        files: &[String],
        extension: Option<CompressionExtension>,
        name: Option<&str>,
    ) -> Result<FileObject, Error> {
        let mut body = json!({ "root": root, "files": files });
        if let Some(extension) = extension {
            body["extension"] = json!(extension);
        }
        if let Some(name) = name {
            body["name"] = json!(name);
        }
        self.http
            .mutate_one(Mutation::Create, &format!("{}/compress", self.base), Some(&body))
            .await
    }

    pub async fn decompress(&self, root: &str, file: &str) -> Result<(), Error> {
        let body = json!({ "root": root, "file": file });
        self.post(&format!("{}/decompress", self.base), &body).await
    }

    pub async fn chmod(&self, root: &str, files: &[FileMode]) -> Result<(), Error> {
        let body = json!({ "root": root, "files": files });
        self.post(&format!("{}/chmod", self.base), &body).await
    }

    /// Have the daemon download `url` into `directory`.
    pub async fn pull(&self, url: &str, directory: &str, filename: Option<&str>) -> Result<(), Error> {
        let mut body = json!({ "url": url, "directory": directory });
        if let Some(filename) = filename {
            body["filename"] = json!(filename);
        }
        self.post(&format!("{}/pull", self.base), &body).await
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<(), Error> {
        self.http.execute(Mutation::Create, path, Some(body)).await
    }
}
