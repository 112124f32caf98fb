//! End-to-end relay tests over a loopback listener.

mod common;

use broker_relay::broker::{MessageBroker, Route};
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{client, start_relay};

#[tokio::test]
async fn test_publish_then_pull() {
    let relay = start_relay(|c| c.event_log.enabled = false).await;
    let client = client();

    let res = client
        .post(relay.url("/api/messages"))
        .json(&json!({ "message": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "status": "Message sent" }));

    let body: Value = client
        .get(relay.url("/api/messages/next"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "message": "hello" }));

    let body: Value = client
        .get(relay.url("/api/messages/next"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], Value::Null);
    assert_eq!(body["notice"], "No messages available");

    relay.stop().await;
}

#[tokio::test]
async fn test_default_config_relays_only_messages() {
    let relay = start_relay(|_| {}).await;
    let client = client();

    let next = |client: &reqwest::Client| {
        let request = client.get(relay.url("/api/messages/next"));
        async move { request.send().await.unwrap().json::<Value>().await.unwrap() }
    };

    let body = next(&client).await;
    assert_eq!(body, json!({ "message": null, "notice": "No messages available" }));

    let res = client
        .post(relay.url("/api/messages"))
        .json(&json!({ "message": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    assert_eq!(next(&client).await, json!({ "message": "hello" }));
    assert_eq!(
        next(&client).await,
        json!({ "message": null, "notice": "No messages available" })
    );

    let body: Value = client
        .get(relay.url("/api/messages"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 0);
    assert_eq!(body["notice"], "No messages available");

    // Each request was still recorded, on the event queue.
    assert_eq!(relay.broker.events_len(), 5);

    relay.stop().await;
}

#[tokio::test]
async fn test_drain_preserves_order() {
    let relay = start_relay(|c| c.event_log.enabled = false).await;
    let client = client();

    for message in ["one", "two", "three"] {
        let res = client
            .post(relay.url("/api/messages"))
            .json(&json!({ "message": message }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let body: Value = client
        .get(relay.url("/api/messages"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["messages"], json!(["one", "two", "three"]));
    assert_eq!(body["count"], 3);
    assert!(body.get("notice").is_none());

    let body: Value = client
        .get(relay.url("/api/messages"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["messages"], json!([]));
    assert_eq!(body["count"], 0);
    assert_eq!(body["notice"], "No messages available");

    relay.stop().await;
}

#[tokio::test]
async fn test_messages_published_elsewhere_are_pulled() {
    let relay = start_relay(|c| c.event_log.enabled = false).await;
    relay.broker.publish(Route::Messages, b"from another producer").await.unwrap();

    let body: Value = client()
        .get(relay.url("/api/messages/next"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "from another producer");

    relay.stop().await;
}

#[tokio::test]
async fn test_broker_outage_maps_to_503() {
    let relay = start_relay(|c| c.event_log.enabled = false).await;
    relay.broker.set_offline(true);
    let client = client();

    let res = client
        .post(relay.url("/api/messages"))
        .json(&json!({ "message": "lost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Message broker unavailable" }));

    let res = client.get(relay.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    relay.broker.set_offline(false);
    let res = client.get(relay.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["queue_depth"], 0);

    relay.stop().await;
}

#[tokio::test]
async fn test_correlation_id_round_trip() {
    let relay = start_relay(|c| c.event_log.enabled = false).await;
    let client = client();

    let res = client
        .get(relay.url("/"))
        .header("x-correlation-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-correlation-id"], "abc-123");
    let text = res.text().await.unwrap();
    assert_eq!(
        text,
        "Hello, this is your recommendation service! Correlation ID: abc-123"
    );

    let res = client.get(relay.url("/")).send().await.unwrap();
    let generated = res.headers()["x-correlation-id"].to_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&generated).is_ok());

    relay.stop().await;
}
