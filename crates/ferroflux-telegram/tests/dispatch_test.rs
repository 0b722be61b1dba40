use ferroflux_telegram::credentials::TELEGRAM_API_CREDENTIALS;
use ferroflux_telegram::{ApiDispatcher, HttpDispatcher, NodeConfig, StaticCredentialStore};
use reqwest::Method;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dispatcher(server: &MockServer) -> HttpDispatcher {
    let config = NodeConfig::new(Url::parse(&server.uri()).unwrap());
    let credentials =
        Arc::new(StaticCredentialStore::new().with_token(TELEGRAM_API_CREDENTIALS, "TEST_TOKEN"));
    HttpDispatcher::new(&config, credentials).unwrap()
}

fn object(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_posts_json_body_to_bot_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/botTEST_TOKEN/sendMessage"))
        .and(body_json(json!({ "chat_id": "123", "text": "hi" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "message_id": 7, "text": "hi" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = dispatcher(&server)
        .request(
            Method::POST,
            "sendMessage",
            object(json!({ "chat_id": "123", "text": "hi" })),
            Map::new(),
        )
        .await
        .unwrap();

    assert_eq!(response["ok"], true);
    assert_eq!(response["result"]["message_id"], 7);
}

#[tokio::test]
async fn test_query_string_is_forwarded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/botTEST_TOKEN/getChat"))
        .and(query_param("chat_id", "@channel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": {} })))
        .expect(1)
        .mount(&server)
        .await;

    let response = dispatcher(&server)
        .request(
            Method::POST,
            "getChat",
            Map::new(),
            object(json!({ "chat_id": "@channel" })),
        )
        .await
        .unwrap();
    assert_eq!(response["ok"], true);
}

#[tokio::test]
async fn test_unauthorized_is_reported_as_invalid_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/botTEST_TOKEN/getChat"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        })))
        .mount(&server)
        .await;

    let err = dispatcher(&server)
        .request(
            Method::POST,
            "getChat",
            object(json!({ "chat_id": "1" })),
            Map::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "The Telegram credentials are not valid!");
}

#[tokio::test]
async fn test_error_description_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/botTEST_TOKEN/setChatTitle"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .mount(&server)
        .await;

    let err = dispatcher(&server)
        .request(
            Method::POST,
            "setChatTitle",
            object(json!({ "chat_id": "1", "title": "x" })),
            Map::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Telegram error response [400]: Bad Request: chat not found"
    );
}

#[tokio::test]
async fn test_error_without_description() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = dispatcher(&server)
        .request(Method::POST, "getChat", Map::new(), Map::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("502"));
}

#[tokio::test]
async fn test_missing_credentials() {
    let server = MockServer::start().await;
    let config = NodeConfig::new(Url::parse(&server.uri()).unwrap());
    let dispatcher = HttpDispatcher::new(&config, Arc::new(StaticCredentialStore::new())).unwrap();

    let err = dispatcher
        .request(Method::POST, "getChat", Map::new(), Map::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No credentials got returned!");
}
