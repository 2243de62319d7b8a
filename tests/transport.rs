use serde_json::Value;
use token_sentinel::{
    alert::{AlertTransport, WebhookTransport},
    error::AlertError,
    types::{AlertEvent, DigitSummary},
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn event() -> AlertEvent {
    AlertEvent {
        display_name: "Hot Token".into(),
        link: "https://dexscreener.com/solana/hot".into(),
        price_usd: "0.0009999".into(),
        market_cap: 1_234_000,
        fully_diluted_valuation: 2_000_000,
        digit_summary: Some(DigitSummary {
            price_digits: "9999".into(),
            market_cap_digits: "1234".into(),
        }),
    }
}

async fn server_answering(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn webhook_posts_embed() {
    let server = server_answering(204).await;
    let transport = WebhookTransport::new(reqwest::Client::new());

    transport
        .send(&format!("{}/hook", server.uri()), &event())
        .await
        .expect("delivered");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).expect("json body");
    let embed = &body["embeds"][0];
    assert_eq!(embed["title"], "Token Alert");
    assert_eq!(embed["fields"][0]["value"], "Hot Token");
    assert_eq!(embed["fields"][2]["value"], "$2,000,000");
}

#[tokio::test]
async fn webhook_status_mapping() {
    let transport = WebhookTransport::new(reqwest::Client::new());

    let missing = server_answering(404).await;
    let err = transport
        .send(&format!("{}/hook", missing.uri()), &event())
        .await
        .expect_err("unknown webhook");
    assert!(matches!(err, AlertError::DestinationUnresolved(_)));

    let overloaded = server_answering(429).await;
    let err = transport
        .send(&format!("{}/hook", overloaded.uri()), &event())
        .await
        .expect_err("rate limited");
    assert!(matches!(err, AlertError::Rejected { status } if status.as_u16() == 429));
}
