use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use partscout_client::vendors::{Octopart, PdfCatalog, Placeholder, RsComponents, Wago};
use partscout_client::{LineMessenger, ReqwestFetcher, VendorAdapter};
use partscout_core::pacing::{PacingConfig, PacingController};
use partscout_core::{Aggregator, QueryResponder};
use partscout_server::routes;
use partscout_server::signature::{SIGNATURE_HEADER, sign};
use partscout_server::state::AppState;

pub const TEST_SECRET: &str = "test-channel-secret";
pub const TEST_TOKEN: &str = "test-access-token";

pub struct TestApp {
    pub router: Router,
    /// Stands in for api.line.me.
    pub line: MockServer,
    /// Serves every vendor's search page.
    pub vendors: MockServer,
}

/// Build the app against local mock servers for LINE and the vendors.
pub async fn setup_test_app() -> TestApp {
    let line = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/reply"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&line)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/push"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&line)
        .await;

    let vendors = MockServer::start().await;
    let origin = Url::parse(&vendors.uri()).unwrap();
    let fetcher = ReqwestFetcher::new().unwrap();

    let adapters = vec![
        VendorAdapter::RsComponents(
            RsComponents::new(fetcher.clone())
                .unwrap()
                .with_origin(origin.clone()),
        ),
        VendorAdapter::Wago(Wago::new(fetcher.clone()).unwrap().with_origin(origin.clone())),
        VendorAdapter::Placeholder(Placeholder::digikey().unwrap()),
        VendorAdapter::Placeholder(Placeholder::mouser().unwrap()),
        VendorAdapter::Octopart(Octopart::new(fetcher).unwrap().with_origin(origin)),
    ];
    let aggregator = Aggregator::new(
        adapters,
        VendorAdapter::Catalog(PdfCatalog::kss()),
        PacingController::new(PacingConfig::disabled()),
    );

    let state = Arc::new(AppState {
        responder: QueryResponder::new(aggregator),
        messenger: LineMessenger::with_base_url(TEST_TOKEN, &line.uri()).unwrap(),
        channel_secret: TEST_SECRET.to_string(),
    });

    TestApp {
        router: routes::router(state),
        line,
        vendors,
    }
}

/// A POST /webhook request signed with the test secret.
pub fn signed_webhook(body: &str) -> Request<Body> {
    Request::post("/webhook")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, sign(TEST_SECRET, body.as_bytes()).unwrap())
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// A webhook body holding one text message from user `U1`.
pub fn text_event(text: &str) -> String {
    serde_json::json!({
        "destination": "Ubot",
        "events": [{
            "type": "message",
            "replyToken": "reply-token-1",
            "source": {"type": "user", "userId": "U1"},
            "message": {"id": "1", "type": "text", "text": text}
        }]
    })
    .to_string()
}

/// Wait until the LINE mock has seen `count` requests, then return them.
pub async fn wait_for_line_requests(line: &MockServer, count: usize) -> Vec<wiremock::Request> {
    for _ in 0..100 {
        let received = line.received_requests().await.unwrap_or_default();
        if received.len() >= count {
            return received;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("LINE mock did not receive {count} request(s) in time");
}

/// Text of every message in a reply or push request body.
pub fn message_texts(request: &wiremock::Request) -> Vec<String> {
    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap().to_string())
        .collect()
}
