//! In-process mock panel shared by the REST tests.
//!
//! Every request is recorded; responses are served from a queue whose last
//! entry repeats.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::extract::{Query, Request};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::net::api::HttpClient;

#[derive(Clone, Debug)]
pub(crate) struct Recorded {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: axum::http::HeaderMap,
    pub(crate) body: Vec<u8>,
}

#[derive(Clone, Debug)]
pub(crate) struct MockResponse {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: String,
}

impl MockResponse {
    pub(crate) fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            headers: vec![("content-type", "application/json".to_owned())],
            body: body.to_string(),
        }
    }

    pub(crate) fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("content-type", "text/plain".to_owned())],
            body: body.to_owned(),
        }
    }

    pub(crate) fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub(crate) fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_owned()));
        self
    }
}

#[derive(Clone)]
pub(crate) struct MockPanel {
    pub(crate) base_url: String,
    pub(crate) requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockPanel {
    pub(crate) fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("requests mutex").clone()
    }

    pub(crate) fn last(&self) -> Recorded {
        self.requests().pop().expect("at least one request")
    }

    pub(crate) fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url.clone(), "k").expect("config")
    }

    pub(crate) fn client(&self) -> HttpClient {
        HttpClient::new(&self.config()).expect("http client")
    }

    /// Parsed JSON body of the last request.
    pub(crate) fn last_json(&self) -> Value {
        serde_json::from_slice(&self.last().body).expect("json request body")
    }
}

pub(crate) async fn mock_panel(responses: Vec<MockResponse>) -> MockPanel {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let queue = Arc::new(Mutex::new(responses));

    let recorded = requests.clone();
    let app = Router::new().fallback(move |request: Request| {
        let recorded = recorded.clone();
        let queue = queue.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX)
                .await
                .expect("request body");
            let query = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
                .map(|Query(pairs)| pairs)
                .unwrap_or_default();
            recorded.lock().expect("requests mutex").push(Recorded {
                method: parts.method.to_string(),
                path: parts.uri.path().to_owned(),
                query,
                headers: parts.headers.clone(),
                body: body.to_vec(),
            });

            let mock = {
                let mut queue = queue.lock().expect("queue mutex");
                if queue.len() > 1 {
                    queue.remove(0)
                } else {
                    queue[0].clone()
                }
            };
            let mut builder = axum::http::Response::builder().status(mock.status);
            for (name, value) in &mock.headers {
                builder = builder.header(*name, value.as_str());
            }
            builder.body(Body::from(mock.body)).expect("mock response")
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock panel");
    let addr = listener.local_addr().expect("mock panel addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock panel serve");
    });

    MockPanel {
        base_url: format!("http://{addr}/"),
        requests,
    }
}

pub(crate) fn header<'a>(recorded: &'a Recorded, name: &str) -> Option<&'a str> {
    recorded.headers.get(name).and_then(|value| value.to_str().ok())
}
