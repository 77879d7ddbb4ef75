use reqwest::StatusCode;
use serde_json::json;

mod common;

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_conversation_lifecycle() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;
    let buyer = app.register("buyer").await;

    let listing = app.create_listing(&seller, "Coffee Table", "55.00").await;
    let listing_id = listing["id"].as_str().unwrap();

    // Sellers cannot open a thread with themselves
    let resp = app
        .client
        .post(format!("{}/v1/listings/{listing_id}/conversations", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .client
        .post(format!("{}/v1/listings/{listing_id}/conversations", app.server_url))
        .bearer_auth(&buyer.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let conversation: serde_json::Value = resp.json().await.unwrap();
    let conversation_id = conversation["id"].as_str().unwrap();

    // Starting again returns the same active thread
    let again: serde_json::Value = app
        .client
        .post(format!("{}/v1/listings/{listing_id}/conversations", app.server_url))
        .bearer_auth(&buyer.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(again["id"].as_str().unwrap(), conversation_id);

    // Both sides see it in their lists; outsiders cannot read it
    let seller_threads: Vec<serde_json::Value> = app
        .client
        .get(format!("{}/v1/conversations", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(seller_threads.len(), 1);

    let outsider = app.register("outsider").await;
    let resp = app
        .client
        .get(format!("{}/v1/conversations/{conversation_id}/messages", app.server_url))
        .bearer_auth(&outsider.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_send_message_notifies_other_participant() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;
    let buyer = app.register("buyer").await;

    let listing = app.create_listing(&seller, "Floor Lamp", "30.00").await;
    let listing_id = listing["id"].as_str().unwrap();

    let conversation: serde_json::Value = app
        .client
        .post(format!("{}/v1/listings/{listing_id}/conversations", app.server_url))
        .bearer_auth(&buyer.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let conversation_id = conversation["id"].as_str().unwrap();

    let resp = app
        .client
        .post(format!("{}/v1/conversations/{conversation_id}/messages", app.server_url))
        .bearer_auth(&buyer.token)
        .json(&json!({ "content": "Is this still available?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let message: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(message["kind"].as_str().unwrap(), "text");

    let notifications = app.notifications_for(&seller).await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "message");
    assert!(notifications[0]["text"].as_str().unwrap().contains(&buyer.nickname));

    // Empty messages are rejected
    let resp = app
        .client
        .post(format!("{}/v1/conversations/{conversation_id}/messages", app.server_url))
        .bearer_auth(&buyer.token)
        .json(&json!({ "content": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_read_receipts_and_soft_delete() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;
    let buyer = app.register("buyer").await;

    let listing = app.create_listing(&seller, "Monitor Stand", "20.00").await;
    let listing_id = listing["id"].as_str().unwrap();

    let conversation: serde_json::Value = app
        .client
        .post(format!("{}/v1/listings/{listing_id}/conversations", app.server_url))
        .bearer_auth(&buyer.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let conversation_id = conversation["id"].as_str().unwrap();

    let message: serde_json::Value = app
        .client
        .post(format!("{}/v1/conversations/{conversation_id}/messages", app.server_url))
        .bearer_auth(&buyer.token)
        .json(&json!({ "content": "hello" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let message_id = message["id"].as_str().unwrap();

    // The sender cannot ack their own message; the recipient can
    let resp = app
        .client
        .post(format!("{}/v1/messages/{message_id}/read", app.server_url))
        .bearer_auth(&buyer.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .client
        .post(format!("{}/v1/messages/{message_id}/read", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // Only the sender can delete; deleted messages disappear from reads
    let resp = app
        .client
        .delete(format!("{}/v1/messages/{message_id}", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .client
        .delete(format!("{}/v1/messages/{message_id}", app.server_url))
        .bearer_auth(&buyer.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let messages: Vec<serde_json::Value> = app
        .client
        .get(format!("{}/v1/conversations/{conversation_id}/messages", app.server_url))
        .bearer_auth(&buyer.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(messages.is_empty());
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_archived_conversation_rejects_messages() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;
    let buyer = app.register("buyer").await;

    let listing = app.create_listing(&seller, "Plant Pot", "10.00").await;
    let listing_id = listing["id"].as_str().unwrap();

    let conversation: serde_json::Value = app
        .client
        .post(format!("{}/v1/listings/{listing_id}/conversations", app.server_url))
        .bearer_auth(&buyer.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let conversation_id = conversation["id"].as_str().unwrap();

    let resp = app
        .client
        .delete(format!("{}/v1/conversations/{conversation_id}", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .client
        .post(format!("{}/v1/conversations/{conversation_id}/messages", app.server_url))
        .bearer_auth(&buyer.token)
        .json(&json!({ "content": "too late" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
