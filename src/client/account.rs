use reqwest::Method;
use serde_json::json;

use crate::error::Error;
use crate::models::client::{
    Account, ActivityLog, ApiKey, ApiKeyWithSecret, CreatedApiKey, RecoveryTokens, SshKey, TwoFactorSetup,
};
use crate::net::api::{HttpClient, Mutation, NO_BODY, decode};
use crate::net::types::{Page, RequestOptions};

const BASE: &str = "/api/client/account";

/// The key owner's own account.
#[derive(Clone, Copy, Debug)]
pub struct AccountApi<'a> {
    http: &'a HttpClient,
}

impl<'a> AccountApi<'a> {
    pub(crate) fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    pub async fn details(&self) -> Result<Account, Error> {
        self.http.fetch_one(BASE, None).await
    }

    /// QR image data and secret for enrolling an authenticator.
    pub async fn two_factor_setup(&self) -> Result<TwoFactorSetup, Error> {
        self.http.fetch_data(&format!("{BASE}/two-factor")).await
    }

    pub async fn enable_two_factor(&self, code: &str) -> Result<RecoveryTokens, Error> {
        let body = json!({ "code": code });
        self.http
            .mutate_one(Mutation::Create, &format!("{BASE}/two-factor"), Some(&body))
            .await
    }

    pub async fn disable_two_factor(&self, password: &str) -> Result<(), Error> {
        let body = json!({ "password": password });
        self.http
            .execute(Mutation::Create, &format!("{BASE}/two-factor/disable"), Some(&body))
            .await
    }

    pub async fn update_email(&self, email: &str, password: &str) -> Result<(), Error> {
        let body = json!({ "email": email, "password": password });
        self.http
            .execute(Mutation::Replace, &format!("{BASE}/email"), Some(&body))
            .await
    }

    pub async fn update_password(&self, current: &str, password: &str, confirmation: &str) -> Result<(), Error> {
        let body = json!({
            "current_password": current,
            "password": password,
            "password_confirmation": confirmation,
        });
        self.http
            .execute(Mutation::Replace, &format!("{BASE}/password"), Some(&body))
            .await
    }

    pub async fn api_keys(&self) -> Result<Vec<ApiKey>, Error> {
        let page = self.http.fetch_list(&format!("{BASE}/api-keys"), None).await?;
        Ok(page.data)
    }

    /// Create a key. The secret in the result is not retrievable later.
    pub async fn create_api_key(&self, description: &str, allowed_ips: &[String]) -> Result<ApiKeyWithSecret, Error> {
        let body = json!({ "description": description, "allowed_ips": allowed_ips });
        let response = self
            .http
            .raw_request(Method::POST, &format!("{BASE}/api-keys"), Some(&body), None)
            .await?;
        let created: CreatedApiKey = decode(response).await?;
        Ok(created.into())
    }

    pub async fn delete_api_key(&self, identifier: &str) -> Result<(), Error> {
        self.http
            .remove(&format!("{BASE}/api-keys/{identifier}"), NO_BODY)
            .await
    }

    pub async fn ssh_keys(&self) -> Result<Vec<SshKey>, Error> {
        let page = self.http.fetch_list(&format!("{BASE}/ssh-keys"), None).await?;
        Ok(page.data)
    }

    pub async fn create_ssh_key(&self, name: &str, public_key: &str) -> Result<SshKey, Error> {
        let body = json!({ "name": name, "public_key": public_key });
        self.http
            .mutate_one(Mutation::Create, &format!("{BASE}/ssh-keys"), Some(&body))
            .await
    }

    pub async fn delete_ssh_key(&self, fingerprint: &str) -> Result<(), Error> {
        let body = json!({ "fingerprint": fingerprint });
        self.http
            .execute(Mutation::Create, &format!("{BASE}/ssh-keys/remove"), Some(&body))
            .await
    }

    pub async fn activity(&self, options: Option<&RequestOptions>) -> Result<Page<ActivityLog>, Error> {
        self.http.fetch_list(&format!("{BASE}/activity"), options).await
    }
}
