use reqwest::StatusCode;
use serde_json::json;

mod common;

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_offer_accept_round_trip() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;
    let buyer = app.register("buyer").await;

    let listing = app.create_listing(&seller, "Road Bike", "200.00").await;
    let listing_id = listing["id"].as_str().unwrap();

    // Buyer makes an offer of 150.00
    let resp = app
        .client
        .post(format!("{}/v1/listings/{listing_id}/offers", app.server_url))
        .bearer_auth(&buyer.token)
        .json(&json!({ "price": "150.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let offer: serde_json::Value = resp.json().await.unwrap();
    let offer_id = offer["id"].as_str().unwrap();
    assert_eq!(offer["status"].as_str().unwrap(), "Pending");

    // Seller sees the offer notification with the price in the text
    let notifications = app.notifications_for(&seller).await;
    assert!(
        notifications
            .iter()
            .any(|n| n["kind"] == "offer" && n["text"].as_str().unwrap().contains("150.00")),
        "seller should be notified about the offer"
    );

    // A conversation now exists with the offer message in it
    let conversations: Vec<serde_json::Value> = app
        .client
        .get(format!("{}/v1/conversations", app.server_url))
        .bearer_auth(&buyer.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(conversations.len(), 1);
    let conversation_id = conversations[0]["id"].as_str().unwrap();

    let messages: Vec<serde_json::Value> = app
        .client
        .get(format!("{}/v1/conversations/{conversation_id}/messages", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(messages.iter().any(|m| m["content"] == "Made an offer of $150.00"));

    // Seller accepts
    let resp = app
        .client
        .post(format!("{}/v1/offers/{offer_id}/accept", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let accepted: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(accepted["status"].as_str().unwrap(), "Accepted");

    // Buyer hears about the acceptance
    let notifications = app.notifications_for(&buyer).await;
    assert!(
        notifications
            .iter()
            .any(|n| n["kind"] == "offer_accepted" && n["text"].as_str().unwrap().contains("accepted")),
        "buyer should be notified about the acceptance"
    );

    // The acceptance message landed in the same thread
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
    assert!(messages.iter().any(|m| m["content"] == "Accepted the offer of $150.00"));

    // Accepting does not flip the listing to sold; that is a separate action
    let listing: serde_json::Value = app
        .client
        .get(format!("{}/v1/listings/{listing_id}", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing["status"].as_str().unwrap(), "available");
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_terminal_offers_reject_further_transitions() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;
    let buyer = app.register("buyer").await;

    let listing = app.create_listing(&seller, "Espresso Machine", "90.00").await;
    let listing_id = listing["id"].as_str().unwrap();

    let offer: serde_json::Value = app
        .client
        .post(format!("{}/v1/listings/{listing_id}/offers", app.server_url))
        .bearer_auth(&buyer.token)
        .json(&json!({ "price": "80.00" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let offer_id = offer["id"].as_str().unwrap();

    let resp = app
        .client
        .post(format!("{}/v1/offers/{offer_id}/reject", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Rejected is terminal; accept and cancel both conflict now
    let resp = app
        .client
        .post(format!("{}/v1/offers/{offer_id}/accept", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = app
        .client
        .post(format!("{}/v1/offers/{offer_id}/cancel", app.server_url))
        .bearer_auth(&buyer.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_cancel_flow_notifies_seller() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;
    let buyer = app.register("buyer").await;

    let listing = app.create_listing(&seller, "Record Player", "100.00").await;
    let listing_id = listing["id"].as_str().unwrap();

    let offer: serde_json::Value = app
        .client
        .post(format!("{}/v1/listings/{listing_id}/offers", app.server_url))
        .bearer_auth(&buyer.token)
        .json(&json!({ "price": "75.50" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let offer_id = offer["id"].as_str().unwrap();

    // Only the bidder can cancel
    let resp = app
        .client
        .post(format!("{}/v1/offers/{offer_id}/cancel", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .client
        .post(format!("{}/v1/offers/{offer_id}/cancel", app.server_url))
        .bearer_auth(&buyer.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let notifications = app.notifications_for(&seller).await;
    assert!(
        notifications
            .iter()
            .any(|n| n["kind"] == "offer_cancelled" && n["text"].as_str().unwrap().contains("75.50")),
        "seller should be notified about the cancellation"
    );
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_one_pending_offer_per_bidder() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;
    let buyer = app.register("buyer").await;

    let listing = app.create_listing(&seller, "Armchair", "60.00").await;
    let listing_id = listing["id"].as_str().unwrap();

    let resp = app
        .client
        .post(format!("{}/v1/listings/{listing_id}/offers", app.server_url))
        .bearer_auth(&buyer.token)
        .json(&json!({ "price": "40.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .client
        .post(format!("{}/v1/listings/{listing_id}/offers", app.server_url))
        .bearer_auth(&buyer.token)
        .json(&json!({ "price": "45.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_offer_validation_and_visibility() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;
    let buyer = app.register("buyer").await;
    let stranger = app.register("stranger").await;

    let listing = app.create_listing(&seller, "Desk Lamp", "25.00").await;
    let listing_id = listing["id"].as_str().unwrap();

    // Self-offers and non-positive prices are invalid
    let resp = app
        .client
        .post(format!("{}/v1/listings/{listing_id}/offers", app.server_url))
        .bearer_auth(&seller.token)
        .json(&json!({ "price": "20.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .client
        .post(format!("{}/v1/listings/{listing_id}/offers", app.server_url))
        .bearer_auth(&buyer.token)
        .json(&json!({ "price": "0.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let offer: serde_json::Value = app
        .client
        .post(format!("{}/v1/listings/{listing_id}/offers", app.server_url))
        .bearer_auth(&buyer.token)
        .json(&json!({ "price": "20.00" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let offer_id = offer["id"].as_str().unwrap();

    // A third party cannot even see the offer
    let resp = app
        .client
        .get(format!("{}/v1/offers/{offer_id}", app.server_url))
        .bearer_auth(&stranger.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Only the owner may list a listing's offers
    let resp = app
        .client
        .get(format!("{}/v1/listings/{listing_id}/offers", app.server_url))
        .bearer_auth(&stranger.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
