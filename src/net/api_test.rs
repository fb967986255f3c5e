use super::*;
use serde_json::{Value, json};

use crate::error::ApiErrorKind;
use crate::test_support::{MockResponse, header, mock_panel};

fn api_error(err: Error) -> ApiError {
    match err {
        Error::Api(api) => api,
        other => panic!("expected API error, got {other:?}"),
    }
}

// =============================================================================
// SUCCESS PATHS
// =============================================================================

#[tokio::test]
async fn fetch_one_unwraps_attributes() {
    let panel = mock_panel(vec![MockResponse::json(
        200,
        &json!({"object": "user", "attributes": {"id": 1}}),
    )])
    .await;
    let http = panel.client();

    let user: Value = http
        .fetch_one("/api/client/account", None)
        .await
        .expect("fetch_one");
    assert_eq!(user, json!({"id": 1}));

    let recorded = panel.last();
    assert_eq!(recorded.method, "GET");
    assert_eq!(recorded.path, "/api/client/account");
    assert!(recorded.query.is_empty());
    assert_eq!(header(&recorded, "authorization"), Some("Bearer k"));
    assert_eq!(header(&recorded, "accept"), Some(ACCEPT_MEDIA_TYPE));
    assert_eq!(header(&recorded, "content-type"), None);
    assert!(recorded.body.is_empty());
}

#[tokio::test]
async fn fetch_list_unwraps_in_order_and_maps_pagination() {
    let panel = mock_panel(vec![MockResponse::json(
        200,
        &json!({
            "object": "list",
            "data": [
                {"object": "server", "attributes": {"identifier": "a"}},
                {"object": "server", "attributes": {"identifier": "b"}}
            ],
            "meta": {"pagination": {
                "total": 12, "count": 2, "per_page": 2, "current_page": 1, "total_pages": 6,
                "links": {}
            }}
        }),
    )])
    .await;

    let page: Page<Value> = panel
        .client()
        .fetch_list("/api/client", None)
        .await
        .expect("fetch_list");
    assert_eq!(page.data, vec![json!({"identifier": "a"}), json!({"identifier": "b"})]);
    assert_eq!(page.pagination.total, 12);
    assert_eq!(page.pagination.total_pages, 6);
}

#[tokio::test]
async fn fetch_list_without_meta_reports_single_page() {
    let panel = mock_panel(vec![MockResponse::json(
        200,
        &json!({"object": "list", "data": [
            {"object": "ssh_key", "attributes": {"name": "one"}},
            {"object": "ssh_key", "attributes": {"name": "two"}}
        ]}),
    )])
    .await;

    let page: Page<Value> = panel
        .client()
        .fetch_list("/api/client/account/ssh-keys", None)
        .await
        .expect("fetch_list");
    assert_eq!(page.pagination, crate::net::types::Pagination::single_page(2));
}

#[tokio::test]
async fn request_options_become_query_parameters() {
    let panel = mock_panel(vec![MockResponse::json(
        200,
        &json!({"object": "list", "data": []}),
    )])
    .await;
    let options = RequestOptions::new()
        .filter("email", "a@example.com")
        .sort("-id")
        .include("servers")
        .include("roles")
        .page(3)
        .per_page(25);

    let _: Page<Value> = panel
        .client()
        .fetch_list("/api/application/users", Some(&options))
        .await
        .expect("fetch_list");

    let recorded = panel.last();
    assert_eq!(
        recorded.query,
        vec![
            ("filter[email]".to_owned(), "a@example.com".to_owned()),
            ("sort".to_owned(), "-id".to_owned()),
            ("include".to_owned(), "servers,roles".to_owned()),
            ("page".to_owned(), "3".to_owned()),
            ("per_page".to_owned(), "25".to_owned()),
        ]
    );
}

#[tokio::test]
async fn mutate_sends_json_body_and_unwraps_envelope() {
    let panel = mock_panel(vec![MockResponse::json(
        201,
        &json!({"object": "location", "attributes": {"id": 9, "short": "eu"}}),
    )])
    .await;

    let created: Option<Value> = panel
        .client()
        .mutate(
            Mutation::Create,
            "/api/application/locations",
            Some(&json!({"short": "eu"})),
            None,
        )
        .await
        .expect("mutate");
    assert_eq!(created, Some(json!({"id": 9, "short": "eu"})));

    let recorded = panel.last();
    assert_eq!(recorded.method, "POST");
    assert_eq!(header(&recorded, "content-type"), Some("application/json"));
    let body: Value = serde_json::from_slice(&recorded.body).expect("json body");
    assert_eq!(body, json!({"short": "eu"}));
}

#[tokio::test]
async fn mutate_maps_verbs() {
    let panel = mock_panel(vec![MockResponse::empty(204)]).await;
    let http = panel.client();

    for mutation in [Mutation::Create, Mutation::Replace, Mutation::Update] {
        let _: Option<Value> = http
            .mutate(mutation, "/x", NO_BODY, None)
            .await
            .expect("mutate");
    }

    let methods: Vec<String> = panel.requests().into_iter().map(|r| r.method).collect();
    assert_eq!(methods, vec!["POST", "PUT", "PATCH"]);
}

#[tokio::test]
async fn mutate_no_content_yields_none_without_body() {
    let panel = mock_panel(vec![MockResponse::empty(204)]).await;

    let result: Option<Value> = panel
        .client()
        .mutate(Mutation::Create, "/api/client/servers/abc/power", Some(&json!({"signal": "start"})), None)
        .await
        .expect("mutate");
    assert_eq!(result, None);
}

#[tokio::test]
async fn mutate_without_body_omits_content_type() {
    let panel = mock_panel(vec![MockResponse::empty(204)]).await;

    panel
        .client()
        .execute(Mutation::Create, "/api/application/servers/4/suspend", NO_BODY)
        .await
        .expect("execute");

    let recorded = panel.last();
    assert_eq!(header(&recorded, "content-type"), None);
    assert!(recorded.body.is_empty());
}

#[tokio::test]
async fn remove_accepts_no_content() {
    let panel = mock_panel(vec![MockResponse::empty(204)]).await;

    panel
        .client()
        .remove("/api/application/users/5", NO_BODY)
        .await
        .expect("remove");
    assert_eq!(panel.last().method, "DELETE");
}

#[tokio::test]
async fn raw_request_returns_untouched_response() {
    let panel = mock_panel(vec![MockResponse::text(200, "server.properties contents")]).await;

    let response = panel
        .client()
        .raw_request(Method::GET, "/api/client/servers/abc/files/contents?file=%2Fserver.properties", NO_BODY, None)
        .await
        .expect("raw request");
    assert_eq!(response.text().await.expect("text"), "server.properties contents");

    let recorded = panel.last();
    assert_eq!(recorded.query, vec![("file".to_owned(), "/server.properties".to_owned())]);
    assert_eq!(header(&recorded, "authorization"), Some("Bearer k"));
}

#[tokio::test]
async fn send_text_posts_plain_body() {
    let panel = mock_panel(vec![MockResponse::empty(204)]).await;

    panel
        .client()
        .send_text("/api/client/servers/abc/files/write", "motd=hi".to_owned(), None)
        .await
        .expect("send_text");

    let recorded = panel.last();
    assert_eq!(recorded.method, "POST");
    assert_eq!(header(&recorded, "content-type"), Some("text/plain"));
    assert_eq!(recorded.body, b"motd=hi");
}

#[tokio::test]
async fn non_envelope_success_body_is_decode_error() {
    let panel = mock_panel(vec![MockResponse::json(200, &json!({"unexpected": true}))]).await;

    let err = panel
        .client()
        .fetch_one::<Value>("/api/client/account", None)
        .await
        .expect_err("missing attributes");
    assert!(matches!(err, Error::Decode(_)));
}

// =============================================================================
// FAILURE CLASSIFICATION
// =============================================================================

#[tokio::test]
async fn validation_failure_groups_field_errors() {
    let panel = mock_panel(vec![MockResponse::json(
        422,
        &json!({"errors": [
            {"code": "email", "status": "422", "detail": "The email must be valid.", "source": {"field": "email"}},
            {"code": "unique", "status": "422", "detail": "The email has been taken.", "source": {"field": "email"}}
        ]}),
    )])
    .await;

    let err = panel
        .client()
        .mutate::<Value, _>(Mutation::Update, "/api/client/account/email", Some(&json!({})), None)
        .await
        .expect_err("422");
    let api = api_error(err);

    assert_eq!(api.status(), 422);
    let fields = api.field_errors().expect("field map");
    assert_eq!(fields.len(), 1);
    assert_eq!(
        fields["email"],
        vec!["The email must be valid.", "The email has been taken."]
    );
}

#[tokio::test]
async fn rate_limit_failure_reads_retry_after() {
    let panel = mock_panel(vec![
        MockResponse::json(429, &json!({"errors": []})).header("retry-after", "30"),
        MockResponse::json(429, &json!({"errors": []})),
    ])
    .await;
    let http = panel.client();

    let first = api_error(
        http.fetch_one::<Value>("/api/client", None)
            .await
            .expect_err("429"),
    );
    assert_eq!(first.retry_after_secs(), Some(30));
    assert_eq!(first.code(), crate::error::UNKNOWN_ERROR_CODE);

    let second = api_error(
        http.fetch_one::<Value>("/api/client", None)
            .await
            .expect_err("429"),
    );
    assert_eq!(second.kind(), &ApiErrorKind::RateLimited { retry_after: 60 });
}

#[tokio::test]
async fn unparsable_failure_body_falls_back_to_status_text() {
    let panel = mock_panel(vec![MockResponse::text(500, "<html>boom</html>")]).await;

    let api = api_error(
        panel
            .client()
            .fetch_one::<Value>("/api/client", None)
            .await
            .expect_err("500"),
    );
    assert_eq!(api.status(), 500);
    assert_eq!(api.kind(), &ApiErrorKind::Generic);
    assert_eq!(api.code(), crate::error::UNKNOWN_ERROR_CODE);
    assert_eq!(api.message(), "Internal Server Error");
    assert_eq!(api.errors()[0].status, "500");
}

#[tokio::test]
async fn generic_failure_keeps_first_entry() {
    let panel = mock_panel(vec![MockResponse::json(
        404,
        &json!({"errors": [{"code": "NotFoundHttpException", "status": "404", "detail": "Not found."}]}),
    )])
    .await;

    let api = api_error(
        panel
            .client()
            .remove("/api/application/nodes/1", NO_BODY)
            .await
            .expect_err("404"),
    );
    assert_eq!(api.code(), "NotFoundHttpException");
    assert_eq!(api.message(), "Not found.");
}

// =============================================================================
// RATE LIMIT TELEMETRY
// =============================================================================

#[tokio::test]
async fn rate_limit_snapshot_needs_all_three_headers() {
    let envelope = json!({"object": "user", "attributes": {"id": 1}});
    let panel = mock_panel(vec![
        MockResponse::json(200, &envelope)
            .header("x-ratelimit-limit", "240")
            .header("x-ratelimit-remaining", "200"),
        MockResponse::json(200, &envelope)
            .header("x-ratelimit-limit", "240")
            .header("x-ratelimit-remaining", "199")
            .header("x-ratelimit-reset", "1700000000"),
        MockResponse::json(200, &envelope).header("x-ratelimit-remaining", "1"),
    ])
    .await;
    let http = panel.client();
    assert_eq!(http.rate_limit(), None);

    let _: Value = http.fetch_one("/a", None).await.expect("first");
    assert_eq!(http.rate_limit(), None);

    let _: Value = http.fetch_one("/a", None).await.expect("second");
    let expected = RateLimit {
        limit: 240,
        remaining: 199,
        reset: 1_700_000_000,
    };
    assert_eq!(http.rate_limit(), Some(expected));

    let _: Value = http.fetch_one("/a", None).await.expect("third");
    assert_eq!(http.rate_limit(), Some(expected));
}

#[tokio::test]
async fn rate_limit_snapshot_updates_on_failures() {
    let panel = mock_panel(vec![MockResponse::json(429, &json!({"errors": []}))
        .header("x-ratelimit-limit", "60")
        .header("x-ratelimit-remaining", "0")
        .header("x-ratelimit-reset", "42")])
    .await;
    let http = panel.client();

    let _ = http.fetch_one::<Value>("/a", None).await;
    assert_eq!(
        http.rate_limit(),
        Some(RateLimit {
            limit: 60,
            remaining: 0,
            reset: 42,
        })
    );
}
