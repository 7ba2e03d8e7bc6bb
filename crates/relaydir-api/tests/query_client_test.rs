#![allow(clippy::unwrap_used)]
// Integration tests for `QueryClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use relaydir_api::{CmpOp, Error, Expr, QueryClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, QueryClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = QueryClient::with_client(
        reqwest::Client::new(),
        base_url,
        "test-key".to_string().into(),
    );
    (server, client)
}

// ── Read tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_filters_become_query_params() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/servers_view"))
        .and(query_param("status", "eq.true"))
        .and(query_param("uptime7", "gte.50"))
        .and(query_param("order", "last_check.asc"))
        .and(header("Range", "0-19"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"uuid": "a"}, {"uuid": "b"}]))
                .insert_header("Content-Range", "0-1/42"),
        )
        .mount(&server)
        .await;

    let page = client
        .from("servers_view")
        .unwrap()
        .count_exact()
        .eq("status", true)
        .gte("uptime7", 50)
        .order("last_check", true)
        .range(0, 19)
        .execute()
        .await
        .unwrap();

    assert_eq!(page.rows.len(), 2);
    assert_eq!(page.total, Some(42));
}

#[tokio::test]
async fn test_in_list_and_is_null() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/servers_view"))
        .and(query_param("uuid", "in.(a,b)"))
        .and(query_param("status", "is.null"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let page = client
        .from("servers_view")
        .unwrap()
        .in_list("uuid", ["a", "b"])
        .is_null("status")
        .execute()
        .await
        .unwrap();

    assert!(page.rows.is_empty());
    assert_eq!(page.total, None);
}

#[tokio::test]
async fn test_or_filter_param() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/bots"))
        .and(query_param("or", "(name.ilike.*sim*,description.ilike.*sim*)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let expr = Expr::Or(vec![
        Expr::cmp("name", CmpOp::Ilike, "*sim*"),
        Expr::cmp("description", CmpOp::Ilike, "*sim*"),
    ]);
    client
        .from("bots")
        .unwrap()
        .or_filter(&expr)
        .execute()
        .await
        .unwrap();
}

#[tokio::test]
async fn test_api_key_headers_sent() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/servers_view"))
        .and(header("apikey", "test-key"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    client.from("servers_view").unwrap().execute().await.unwrap();
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_query_error_surfaces_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/servers_view"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"message":"column does not exist"}"#),
        )
        .mount(&server)
        .await;

    let result = client.from("servers_view").unwrap().execute().await;

    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("column does not exist"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_multibyte_error_body_is_truncated_safely() {
    let (server, client) = setup().await;

    // 300 bytes of three-byte characters: the preview cut point falls
    // inside a character and must not panic the error path.
    Mock::given(method("GET"))
        .and(path("/rest/v1/servers_view"))
        .respond_with(ResponseTemplate::new(400).set_body_string("€".repeat(100)))
        .mount(&server)
        .await;

    let result = client.from("servers_view").unwrap().execute().await;

    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.starts_with('€'));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_array_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/servers_view"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client.from("servers_view").unwrap().execute().await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

#[test]
fn test_cannot_be_a_base_url_is_rejected() {
    let client = QueryClient::with_client(
        reqwest::Client::new(),
        Url::parse("data:text/plain,hi").unwrap(),
        "test-key".to_string().into(),
    );

    assert!(matches!(
        client.from("servers_view"),
        Err(Error::InvalidUrl { .. })
    ));
}

// ── Edge function tests ─────────────────────────────────────────────

#[tokio::test]
async fn test_invoke_function_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/add-server"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    client
        .invoke_function(
            "add-server",
            reqwest::Method::POST,
            &json!({"uri": "smp://abc@host"}),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_invoke_function_failure_keeps_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/add-server"))
        .respond_with(
            ResponseTemplate::new(422).set_body_string(r#"{"error":"invalid server uri"}"#),
        )
        .mount(&server)
        .await;

    let result = client
        .invoke_function("add-server", reqwest::Method::POST, &json!({"uri": "nope"}))
        .await;

    match result {
        Err(Error::EdgeFunction { name, status, body }) => {
            assert_eq!(name, "add-server");
            assert_eq!(status, 422);
            assert!(body.contains("invalid server uri"));
        }
        other => panic!("expected EdgeFunction error, got: {other:?}"),
    }
}
