//! Request/response engine for the panel REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every resource manager funnels through [`HttpClient`]. It attaches the
//! bearer key and versioned `Accept` header, encodes query options, unwraps
//! `{ object, attributes }` envelopes and classifies failures into
//! [`ApiError`]. Retry policy belongs to the caller.
//!
//! The only mutable state is the per-client [`RateLimit`] snapshot, updated
//! from every response (success or failure) that carries all three
//! `X-RateLimit-*` headers. Concurrent calls race on it; the last writer wins.

use std::sync::Mutex;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{Envelope, ListEnvelope, Page, RateLimit, RequestOptions};
use crate::config::ClientConfig;
use crate::error::{ApiError, Error, parse_error_body};

/// Versioned media type the panel expects in `Accept`.
pub const ACCEPT_MEDIA_TYPE: &str = "Application/vnd.pterodactyl.v1+json";

/// Placeholder for calls that send no body at all.
pub(crate) const NO_BODY: Option<&()> = None;

/// Write verbs accepted by [`HttpClient::mutate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// `POST`
    Create,
    /// `PUT`
    Replace,
    /// `PATCH`
    Update,
}

impl Mutation {
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::Create => Method::POST,
            Self::Replace => Method::PUT,
            Self::Update => Method::PATCH,
        }
    }
}

/// Authenticated HTTP transport bound to one panel and one API key.
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    rate_limit: Mutex<Option<RateLimit>>,
}

impl HttpClient {
    /// Build the transport from a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the API key is not a valid header
    /// value and [`Error::Http`] if the underlying client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_MEDIA_TYPE));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url().to_owned(),
            rate_limit: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Counters from the last response that reported all three headers.
    /// `None` until such a response has been seen.
    #[must_use]
    pub fn rate_limit(&self) -> Option<RateLimit> {
        *self
            .rate_limit
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// `GET` a single resource and return its attributes.
    ///
    /// # Errors
    ///
    /// [`Error::Api`] for non-success statuses, [`Error::Http`] for transport
    /// failures and [`Error::Decode`] for bodies that are not an envelope of `T`.
    pub async fn fetch_one<T: DeserializeOwned>(
        &self,
        path: &str,
        options: Option<&RequestOptions>,
    ) -> Result<T, Error> {
        let response = self.raw_request(Method::GET, path, NO_BODY, options).await?;
        let envelope: Envelope<T> = decode(response).await?;
        Ok(envelope.attributes)
    }

    /// `GET` a collection and return its attributes in order with pagination.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::fetch_one`].
    pub async fn fetch_list<T: DeserializeOwned>(
        &self,
        path: &str,
        options: Option<&RequestOptions>,
    ) -> Result<Page<T>, Error> {
        let response = self.raw_request(Method::GET, path, NO_BODY, options).await?;
        let envelope: ListEnvelope<T> = decode(response).await?;
        Ok(envelope.into_page())
    }

    /// `POST`/`PUT`/`PATCH` with an optional JSON body.
    ///
    /// A `204 No Content` answer yields `None` without reading the body;
    /// anything else is unwrapped as a single envelope.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::fetch_one`].
    pub async fn mutate<T, B>(
        &self,
        mutation: Mutation,
        path: &str,
        body: Option<&B>,
        options: Option<&RequestOptions>,
    ) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .raw_request(mutation.method(), path, body, options)
            .await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let envelope: Envelope<T> = decode(response).await?;
        Ok(Some(envelope.attributes))
    }

    /// [`HttpClient::mutate`] for endpoints that always answer with the
    /// written resource.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::fetch_one`], plus [`Error::EmptyResponse`] when
    /// the panel answers `204`.
    pub async fn mutate_one<T, B>(&self, mutation: Mutation, path: &str, body: Option<&B>) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.mutate(mutation, path, body, None)
            .await?
            .ok_or_else(|| Error::EmptyResponse(path.to_owned()))
    }

    /// `GET` an endpoint that wraps its payload as `{ "data": .. }` instead
    /// of an envelope.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::fetch_one`].
    pub async fn fetch_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let response = self.raw_request(Method::GET, path, NO_BODY, None).await?;
        let body: DataBody<T> = decode(response).await?;
        Ok(body.data)
    }

    /// Like [`HttpClient::mutate`], but for endpoints whose success body (if
    /// any) carries nothing the caller needs.
    ///
    /// # Errors
    ///
    /// [`Error::Api`] for non-success statuses and [`Error::Http`] for
    /// transport failures.
    pub async fn execute<B>(&self, mutation: Mutation, path: &str, body: Option<&B>) -> Result<(), Error>
    where
        B: Serialize + ?Sized,
    {
        self.raw_request(mutation.method(), path, body, None).await?;
        Ok(())
    }

    /// `DELETE` a resource. Any success status, including 204, yields `()`.
    ///
    /// # Errors
    ///
    /// [`Error::Api`] for non-success statuses and [`Error::Http`] for
    /// transport failures.
    pub async fn remove<B>(&self, path: &str, body: Option<&B>) -> Result<(), Error>
    where
        B: Serialize + ?Sized,
    {
        self.raw_request(Method::DELETE, path, body, None).await?;
        Ok(())
    }

    /// `POST` a `text/plain` body, used for file writes.
    ///
    /// # Errors
    ///
    /// [`Error::Api`] for non-success statuses and [`Error::Http`] for
    /// transport failures.
    pub async fn send_text(
        &self,
        path: &str,
        text: String,
        options: Option<&RequestOptions>,
    ) -> Result<(), Error> {
        let request = self
            .request(Method::POST, path, options)
            .header(CONTENT_TYPE, "text/plain")
            .body(text);
        self.dispatch(request).await?;
        Ok(())
    }

    /// Escape hatch for endpoints that do not answer with an envelope.
    ///
    /// Authentication, rate-limit tracking and failure classification still
    /// apply; the successful response is handed back untouched.
    ///
    /// # Errors
    ///
    /// [`Error::Api`] for non-success statuses and [`Error::Http`] for
    /// transport failures.
    pub async fn raw_request<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: Option<&RequestOptions>,
    ) -> Result<Response, Error>
    where
        B: Serialize + ?Sized,
    {
        let request = self.request(method, path, options);
        // `json` sets `Content-Type: application/json`; no body means no header.
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };
        self.dispatch(request).await
    }

    fn request(&self, method: Method, path: &str, options: Option<&RequestOptions>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "panel request");

        let request = self.client.request(method, url);
        match options.map(RequestOptions::query_pairs) {
            Some(pairs) if !pairs.is_empty() => request.query(&pairs),
            _ => request,
        }
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<Response, Error> {
        let response = request.send().await?;
        self.track_rate_limit(response.headers());

        if response.status().is_success() {
            return Ok(response);
        }
        Err(classify_failure(response).await.into())
    }

    fn track_rate_limit(&self, headers: &HeaderMap) {
        let Some(snapshot) = RateLimit::from_headers(headers) else {
            return;
        };
        *self
            .rate_limit
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(snapshot);
    }
}

#[derive(Deserialize)]
struct DataBody<T> {
    data: T,
}

/// Read a whole success body as JSON.
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn classify_failure(response: Response) -> ApiError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);
    let body = response.bytes().await.unwrap_or_default();

    let errors = parse_error_body(&body, status.as_u16(), status.canonical_reason());
    let error = ApiError::classify(status.as_u16(), errors, retry_after.as_deref());
    debug!(status = status.as_u16(), code = error.code(), "panel request failed");
    error
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
