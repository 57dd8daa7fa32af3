//! Billing client tests: URL construction, headers, error surfacing.
//!
//! Logic-level tests inject a recording mock transport; the end-to-end tests
//! at the bottom exercise the default reqwest transport against httpmock.

use async_trait::async_trait;
use billing_sdk::{
    BillingClient, BillingClientOptions, BillingError, BillingErrorCode, Result, Transport,
    TransportRequest, TransportResponse,
};
use httpmock::prelude::*;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Transport double: records every request and replays canned responses.
struct MockTransport {
    requests: Mutex<Vec<TransportRequest>>,
    responses: Mutex<VecDeque<Result<TransportResponse>>>,
}

impl MockTransport {
    fn new(responses: Vec<Result<TransportResponse>>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses.into()),
        })
    }

    fn respond(status: u16, body: serde_json::Value) -> Arc<Self> {
        Self::new(vec![Ok(TransportResponse { status, body })])
    }

    fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("mock transport ran out of canned responses")
    }
}

fn client_with(base_url: &str, transport: Arc<MockTransport>) -> BillingClient {
    BillingClient::new(
        base_url,
        BillingClientOptions {
            transport: Some(transport),
            ..Default::default()
        },
    )
    .unwrap()
}

fn header<'a>(request: &'a TransportRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[tokio::test]
async fn get_billing_status_issues_get_to_joined_url() {
    let transport = MockTransport::respond(200, json!({"status": "active", "plan": "pro"}));
    let client = client_with("https://api.example.com", transport.clone());

    let status = client.get_billing_status().await.unwrap();
    assert!(status.is_active());
    assert_eq!(status.field("plan"), Some(&json!("pro")));

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, reqwest::Method::GET);
    assert_eq!(requests[0].url, "https://api.example.com/system/billing");
    assert_eq!(header(&requests[0], "content-type"), Some("application/json"));
    assert_eq!(header(&requests[0], "authorization"), None);
}

#[tokio::test]
async fn trailing_slash_base_produces_no_double_slash() {
    let transport = MockTransport::respond(200, json!({"status": "active"}));
    let client = client_with("https://api.example.com/", transport.clone());

    client.get_billing_status().await.unwrap();

    assert_eq!(
        transport.requests()[0].url,
        "https://api.example.com/system/billing"
    );
}

#[tokio::test]
async fn cancel_subscription_issues_post() {
    let transport = MockTransport::respond(200, json!({"canceled": true}));
    let client = client_with("https://api.example.com", transport.clone());

    let body = client.cancel_subscription().await.unwrap();
    assert_eq!(body, json!({"canceled": true}));

    let requests = transport.requests();
    assert_eq!(requests[0].method, reqwest::Method::POST);
    assert_eq!(
        requests[0].url,
        "https://api.example.com/system/billing/cancel"
    );
}

#[tokio::test]
async fn bearer_header_uses_token_from_provider() {
    let transport = MockTransport::respond(200, json!({"status": "active"}));
    let client = BillingClient::new(
        "https://api.example.com",
        BillingClientOptions {
            access_token: Some(Arc::new(|| Some("tok-abc".to_string()))),
            transport: Some(transport.clone()),
        },
    )
    .unwrap();

    client.get_billing_status().await.unwrap();

    assert_eq!(
        header(&transport.requests()[0], "authorization"),
        Some("Bearer tok-abc")
    );
}

#[tokio::test]
async fn provider_returning_none_omits_authorization() {
    let transport = MockTransport::respond(200, json!({"status": "active"}));
    let client = BillingClient::new(
        "https://api.example.com",
        BillingClientOptions {
            access_token: Some(Arc::new(|| None)),
            transport: Some(transport.clone()),
        },
    )
    .unwrap();

    client.get_billing_status().await.unwrap();

    assert_eq!(header(&transport.requests()[0], "authorization"), None);
}

#[tokio::test]
async fn non_success_response_surfaces_error_body() {
    let transport = MockTransport::respond(
        402,
        json!({"error": "Payment required", "details": "card declined"}),
    );
    let client = client_with("https://api.example.com", transport);

    let err = client.get_billing_status().await.unwrap_err();
    assert_eq!(err.code, BillingErrorCode::RequestFailed);
    assert_eq!(err.status, Some(402));
    assert_eq!(err.message, "Payment required: card declined");
}

#[tokio::test]
async fn non_success_response_without_body_gets_generic_message() {
    let transport = MockTransport::respond(503, serde_json::Value::Null);
    let client = client_with("https://api.example.com", transport);

    let err = client.get_billing_status().await.unwrap_err();
    assert_eq!(err.code, BillingErrorCode::ServerError);
    assert_eq!(err.status, Some(503));
    assert_eq!(err.message, "billing request failed: 503");
}

#[tokio::test]
async fn unauthorized_response_maps_to_unauthorized_code() {
    let transport = MockTransport::respond(401, json!({"error": "Unauthorized"}));
    let client = client_with("https://api.example.com", transport);

    let err = client.get_billing_status().await.unwrap_err();
    assert_eq!(err.code, BillingErrorCode::Unauthorized);
}

#[tokio::test]
async fn transport_failure_propagates_network_error() {
    let transport = MockTransport::new(vec![Err(BillingError::network("connection refused"))]);
    let client = client_with("https://api.example.com", transport);

    let err = client.get_billing_status().await.unwrap_err();
    assert_eq!(err.code, BillingErrorCode::NetworkError);
    assert_eq!(err.status, None);
}

// ==================== End-to-end (default reqwest transport) ====================

#[tokio::test]
async fn default_transport_round_trip() {
    let server = MockServer::start_async().await;

    let status_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/system/billing")
            .header("content-type", "application/json")
            .header("authorization", "Bearer e2e-token");
        then.status(200)
            .json_body(json!({"status": "active", "plan": "team"}));
    });

    let client = BillingClient::new(
        &server.base_url(),
        BillingClientOptions {
            access_token: Some(Arc::new(|| Some("e2e-token".to_string()))),
            ..Default::default()
        },
    )
    .unwrap();

    let status = client.get_billing_status().await.unwrap();
    assert!(status.is_active());
    assert_eq!(status.field("plan"), Some(&json!("team")));

    status_mock.assert();
}

#[tokio::test]
async fn default_transport_surfaces_error_status() {
    let server = MockServer::start_async().await;

    server.mock(|when, then| {
        when.method(POST).path("/system/billing/cancel");
        then.status(404).json_body(json!({"error": "No subscription"}));
    });

    let client = BillingClient::new(&server.base_url(), BillingClientOptions::default()).unwrap();

    let err = client.cancel_subscription().await.unwrap_err();
    assert_eq!(err.code, BillingErrorCode::NotFound);
    assert_eq!(err.status, Some(404));
    assert_eq!(err.message, "No subscription");
}
