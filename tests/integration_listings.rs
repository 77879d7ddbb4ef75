use reqwest::StatusCode;
use serde_json::json;

mod common;

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_create_and_fetch_listing() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;

    let listing = app.create_listing(&seller, "Vintage Camera", "120.00").await;
    assert_eq!(listing["status"].as_str().unwrap(), "available");
    assert_eq!(listing["images"].as_array().unwrap().len(), 1);

    let slug = listing["slug"].as_str().unwrap();
    assert!(slug.starts_with("vintage-camera-"), "slug should derive from the title, got {slug}");

    let by_slug: serde_json::Value = app
        .client
        .get(format!("{}/v1/listings/slug/{slug}", app.server_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_slug["id"], listing["id"]);

    // Two identical titles get distinct slugs
    let second = app.create_listing(&seller, "Vintage Camera", "110.00").await;
    assert_ne!(second["slug"], listing["slug"]);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_search_filters() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;

    app.create_listing(&seller, "Mechanical Keyboard QZX", "80.00").await;
    app.create_listing(&seller, "Ergonomic Keyboard QZX", "140.00").await;

    let results: Vec<serde_json::Value> = app
        .client
        .get(format!("{}/v1/listings?q=keyboard+qzx&maxPrice=100", app.server_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0]["title"].as_str().unwrap().contains("Mechanical"));

    let results: Vec<serde_json::Value> = app
        .client
        .get(format!("{}/v1/listings?sellerId={}", app.server_url, seller.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_update_is_owner_only_and_slug_is_stable() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;
    let stranger = app.register("stranger").await;

    let listing = app.create_listing(&seller, "Wooden Bench", "45.00").await;
    let listing_id = listing["id"].as_str().unwrap();

    let resp = app
        .client
        .patch(format!("{}/v1/listings/{listing_id}", app.server_url))
        .bearer_auth(&stranger.token)
        .json(&json!({ "price": "1.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .client
        .patch(format!("{}/v1/listings/{listing_id}", app.server_url))
        .bearer_auth(&seller.token)
        .json(&json!({ "title": "Oak Bench", "price": "50.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(updated["title"].as_str().unwrap(), "Oak Bench");
    assert_eq!(updated["slug"], listing["slug"], "slug must not change on update");
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_like_notifies_seller_but_not_on_self_like() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;
    let liker = app.register("liker").await;

    let listing = app.create_listing(&seller, "Acoustic Guitar", "300.00").await;
    let listing_id = listing["id"].as_str().unwrap();

    // Seller liking their own listing produces no notification
    let resp = app
        .client
        .put(format!("{}/v1/listings/{listing_id}/like", app.server_url))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(app.notifications_for(&seller).await.is_empty());

    let resp = app
        .client
        .put(format!("{}/v1/listings/{listing_id}/like", app.server_url))
        .bearer_auth(&liker.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let notifications = app.notifications_for(&seller).await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "like");
    assert!(notifications[0]["text"].as_str().unwrap().contains(&liker.nickname));

    // Liking again is idempotent and does not duplicate the notification
    app.client
        .put(format!("{}/v1/listings/{listing_id}/like", app.server_url))
        .bearer_auth(&liker.token)
        .send()
        .await
        .unwrap();
    assert_eq!(app.notifications_for(&seller).await.len(), 1);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_followers_hear_about_new_listings() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;
    let follower = app.register("follower").await;

    let resp = app
        .client
        .put(format!("{}/v1/users/{}/follow", app.server_url, seller.id))
        .bearer_auth(&follower.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    app.create_listing(&seller, "Bookshelf", "35.00").await;

    let notifications = app.notifications_for(&follower).await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "new_listing");
    assert!(notifications[0]["text"].as_str().unwrap().contains("Bookshelf"));
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_price_change_notifies_likers_and_sold_notifies_seller() {
    let app = common::TestApp::spawn().await;
    let seller = app.register("seller").await;
    let buyer = app.register("buyer").await;

    let listing = app.create_listing(&seller, "Turntable", "100.00").await;
    let listing_id = listing["id"].as_str().unwrap();

    app.client
        .put(format!("{}/v1/listings/{listing_id}/like", app.server_url))
        .bearer_auth(&buyer.token)
        .send()
        .await
        .unwrap();

    // Price edit reaches the liker with the new price
    app.client
        .patch(format!("{}/v1/listings/{listing_id}", app.server_url))
        .bearer_auth(&seller.token)
        .json(&json!({ "price": "85.00" }))
        .send()
        .await
        .unwrap();

    let notifications = app.notifications_for(&buyer).await;
    assert!(
        notifications
            .iter()
            .any(|n| n["kind"] == "listing_updated" && n["text"].as_str().unwrap().contains("85.00"))
    );

    // Accepted offer establishes the buyer, then marking sold notifies the seller
    let offer: serde_json::Value = app
        .client
        .post(format!("{}/v1/listings/{listing_id}/offers", app.server_url))
        .bearer_auth(&buyer.token)
        .json(&json!({ "price": "70.00" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    app.client
        .post(format!("{}/v1/offers/{}/accept", app.server_url, offer["id"].as_str().unwrap()))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap();

    app.client
        .patch(format!("{}/v1/listings/{listing_id}", app.server_url))
        .bearer_auth(&seller.token)
        .json(&json!({ "status": "sold" }))
        .send()
        .await
        .unwrap();

    let notifications = app.notifications_for(&seller).await;
    assert!(
        notifications
            .iter()
            .any(|n| n["kind"] == "item_sold" && n["text"].as_str().unwrap().contains(&buyer.nickname)),
        "seller should get an item-sold notification naming the buyer"
    );
}
