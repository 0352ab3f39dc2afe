//! Tests for the transport seam.

use async_trait::async_trait;
use kra_connect_core::{OperationKind, RawInput, Validator};
use kra_connect_error::{KraErrorKind, KraResult};
use kra_connect_interface::{
    TransportRequest, TransportRequestBuilder, TransportResponse, VerificationTransport,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

struct EchoTransport;

#[async_trait]
impl VerificationTransport for EchoTransport {
    async fn send(&self, request: &TransportRequest) -> KraResult<TransportResponse> {
        Ok(TransportResponse::new(200, request.body().to_string()))
    }

    fn name(&self) -> &str {
        "echo"
    }
}

#[test]
fn test_request_from_normalized() {
    let normalized = Validator::normalize(
        OperationKind::PinVerification,
        &RawInput::from(" a123456789b "),
    )
    .unwrap();
    let request = TransportRequest::from_normalized(&normalized);

    assert_eq!(request.operation(), &OperationKind::PinVerification);
    assert_eq!(request.endpoint(), "/verify-pin");
    assert_eq!(request.body(), &json!({ "pin": "A123456789B" }));
    assert_eq!(*request.attempt(), 1);
    assert_eq!(*request.for_attempt(3).attempt(), 3);
}

#[test]
fn test_request_builder_defaults_to_first_attempt() {
    let request = TransportRequestBuilder::default()
        .operation(OperationKind::TccVerification)
        .endpoint("/verify-tcc")
        .body(json!({ "tccNumber": "TCC123456" }))
        .build()
        .unwrap();
    assert_eq!(*request.attempt(), 1);
}

#[test]
fn test_response_json_reports_malformed_body() {
    let response = TransportResponse::new(200, "<html>gateway</html>");
    let err = response.json::<serde_json::Value>().unwrap_err();
    match err.kind() {
        KraErrorKind::Upstream(upstream) => assert_eq!(upstream.status_code, 200),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_response_helpers() {
    let response = TransportResponse::new(429, "")
        .with_retry_after(Duration::from_secs(7))
        .with_request_id("req-1");
    assert!(!response.is_success());
    assert_eq!(response.retry_after(), &Some(Duration::from_secs(7)));
    assert_eq!(response.request_id().as_deref(), Some("req-1"));
    assert!(TransportResponse::new(204, "").is_success());
}

#[tokio::test]
async fn test_arc_transport_delegates() {
    let transport: Arc<dyn VerificationTransport> = Arc::new(EchoTransport);
    let request = TransportRequestBuilder::default()
        .operation(OperationKind::EslipValidation)
        .endpoint("/validate-eslip")
        .body(json!({ "eslipNumber": "1234567890" }))
        .build()
        .unwrap();

    let response = Arc::clone(&transport).send(&request).await.unwrap();
    assert_eq!(transport.name(), "echo");
    assert_eq!(response.json::<serde_json::Value>().unwrap(), *request.body());
}
