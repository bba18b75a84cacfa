use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use partscout_core::QUERY_PROMPT;
use partscout_server::signature::SIGNATURE_HEADER;

use crate::integration::common::{
    message_texts, setup_test_app, signed_webhook, text_event, wait_for_line_requests,
};

const RS_PAGE: &str = r#"<html><body><table>
<tr class="product-row"><td><a class="description-link" href="/web/p/8765">M12 Connector 5P Male</a></td>
  <td><span class="price">NT$ 245.00</span></td><td><span class="stock-value">120</span></td></tr>
</table></body></html>"#;

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn missing_signature_returns_401() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(
            Request::post("/webhook")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"events":[]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn wrong_signature_returns_401_and_sends_nothing() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(
            Request::post("/webhook")
                .header(SIGNATURE_HEADER, "c2lnbmVkIHdpdGggdGhlIHdyb25nIGtleQ==")
                .body(Body::from(text_event("M12-5P")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(app.line.received_requests().await.unwrap().is_empty());
    assert!(app.vendors.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn verification_call_returns_200() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(signed_webhook(r#"{"destination":"Ubot","events":[]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_body_returns_400() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(signed_webhook("{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "serialization_error");
}

#[tokio::test]
async fn blank_message_gets_prompt() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(signed_webhook(&text_event("   ")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let requests = wait_for_line_requests(&app.line, 1).await;
    assert_eq!(requests[0].url.path(), "/v2/bot/message/reply");
    assert_eq!(message_texts(&requests[0]), vec![QUERY_PROMPT.to_string()]);
    assert!(app.vendors.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn text_message_is_answered_with_vendor_results() {
    let app = setup_test_app().await;
    Mock::given(method("GET"))
        .and(path("/web/search/searchBrowseAction.html"))
        .and(query_param("searchTerm", "M12-5P"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RS_PAGE))
        .mount(&app.vendors)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&app.vendors)
        .await;

    let response = app
        .router
        .oneshot(signed_webhook(&text_event("M12-5P")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let requests = wait_for_line_requests(&app.line, 1).await;
    let reply = &requests[0];
    assert_eq!(reply.url.path(), "/v2/bot/message/reply");
    assert_eq!(
        reply.headers.get("authorization").unwrap(),
        "Bearer test-access-token"
    );

    let body: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(body["replyToken"], "reply-token-1");

    let texts = message_texts(reply);
    assert!(texts.iter().all(|t| t.chars().count() <= 1800));
    let all = texts.concat();
    assert!(all.contains("M12 Connector 5P Male"));
    assert!(all.contains("Vendor: WAGO"));
    assert!(all.contains("Vendor: KSS"));
    assert!(all.find("RS Components").unwrap() < all.find("KSS").unwrap());
}

#[tokio::test]
async fn non_text_events_are_ignored() {
    let app = setup_test_app().await;
    let body = serde_json::json!({
        "events": [
            {"type": "follow", "replyToken": "r1", "source": {"type": "user", "userId": "U1"}},
            {"type": "message", "replyToken": "r2", "source": {"type": "user", "userId": "U1"},
             "message": {"id": "2", "type": "sticker", "packageId": "1", "stickerId": "1"}}
        ]
    })
    .to_string();

    let response = app.router.oneshot(signed_webhook(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(app.line.received_requests().await.unwrap().is_empty());
}
