use reqwest::StatusCode;
use serde_json::json;

mod common;

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_unread_count_and_acking() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;
    let liker_one = app.register("liker_one").await;
    let liker_two = app.register("liker_two").await;

    let listing = app.create_listing(&seller, "Dining Chair", "22.00").await;
    let listing_id = listing["id"].as_str().unwrap();

    for liker in [&liker_one, &liker_two] {
        app.client
            .put(format!("{}/v1/listings/{listing_id}/like", app.server_url))
            .bearer_auth(&liker.token)
            .send()
            .await
            .unwrap();
    }

    let count: serde_json::Value = app
        .client
        .get(format!("{}/v1/notifications/unread-count", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count["unread"].as_i64().unwrap(), 2);

    let notifications = app.notifications_for(&seller).await;
    let first_id = notifications[0]["id"].as_str().unwrap();

    // Another user cannot ack someone else's notification
    let resp = app
        .client
        .post(format!("{}/v1/notifications/{first_id}/read", app.server_url))
        .bearer_auth(&liker_one.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .client
        .post(format!("{}/v1/notifications/{first_id}/read", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // Unread filter excludes the acked one
    let unread: Vec<serde_json::Value> = app
        .client
        .get(format!("{}/v1/notifications?unread=true", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unread.len(), 1);

    let resp = app
        .client
        .post(format!("{}/v1/notifications/read-all", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let count: serde_json::Value = app
        .client
        .get(format!("{}/v1/notifications/unread-count", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count["unread"].as_i64().unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_push_delivery_to_registered_devices() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;
    let liker = app.register("liker").await;

    let resp = app
        .client
        .put(format!("{}/v1/push/token", app.server_url))
        .bearer_auth(&seller.token)
        .json(&json!({ "token": format!("device-{}", seller.id) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let listing = app.create_listing(&seller, "Wall Clock", "18.00").await;
    let listing_id = listing["id"].as_str().unwrap();

    app.client
        .put(format!("{}/v1/listings/{listing_id}/like", app.server_url))
        .bearer_auth(&liker.token)
        .send()
        .await
        .unwrap();

    let sent = app.pushes.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "New like");
    assert!(sent[0].body.contains(&liker.nickname));
    drop(sent);

    // Deregistered devices stop receiving pushes
    let resp = app
        .client
        .delete(format!("{}/v1/push/token", app.server_url))
        .bearer_auth(&seller.token)
        .json(&json!({ "token": format!("device-{}", seller.id) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    app.client
        .delete(format!("{}/v1/listings/{listing_id}/like", app.server_url))
        .bearer_auth(&liker.token)
        .send()
        .await
        .unwrap();
    app.client
        .put(format!("{}/v1/listings/{listing_id}/like", app.server_url))
        .bearer_auth(&liker.token)
        .send()
        .await
        .unwrap();

    let sent = app.pushes.sent.lock().unwrap();
    assert_eq!(sent.len(), 1, "no push should be attempted without an active token");
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_notification_carries_entity_reference() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;
    let buyer = app.register("buyer").await;

    let listing = app.create_listing(&seller, "Toolbox", "33.00").await;
    let listing_id = listing["id"].as_str().unwrap();

    let offer: serde_json::Value = app
        .client
        .post(format!("{}/v1/listings/{listing_id}/offers", app.server_url))
        .bearer_auth(&buyer.token)
        .json(&json!({ "price": "25.00" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let notifications = app.notifications_for(&seller).await;
    let offer_notification = notifications.iter().find(|n| n["kind"] == "offer").unwrap();
    assert_eq!(offer_notification["entity"]["kind"], "offer");
    assert_eq!(offer_notification["entity"]["id"], offer["id"]);
}
