//! Scripted transport standing in for the verification API.

use async_trait::async_trait;
use kra_connect::{
    KraResult, TransportError, TransportRequest, TransportResponse, VerificationTransport,
};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

/// What the mock does for one call.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// 200 with a valid record echoing the request body
    Success,
    /// Sleep, then behave like `Success`
    Slow(Duration),
    /// Respond with this status and raw body
    Status(u16, String),
    /// 429, optionally with a `Retry-After` hint
    Throttled(Option<Duration>),
    /// Fail without a response
    ConnectionError,
}

/// Transport that replays a script, then succeeds.
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<MockBehavior>>,
    requests: Mutex<Vec<TransportRequest>>,
    calls: AtomicU32,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    /// Always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plays `script` in call order, then succeeds.
    pub fn scripted(script: impl IntoIterator<Item = MockBehavior>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Number of `send` calls so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in arrival order.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Highest number of concurrent `send` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn success(request: &TransportRequest) -> TransportResponse {
        let mut data = request.body().clone();
        if let Value::Object(fields) = &mut data {
            fields.insert("isValid".into(), json!(true));
            fields.insert("success".into(), json!(true));
            fields.insert("status".into(), json!("active"));
            fields.insert("taxpayerName".into(), json!("Test Taxpayer"));
            fields.insert("acknowledgementNumber".into(), json!("ACK-0001"));
        }
        let body = json!({
            "responseCode": "200",
            "responseDesc": "Success",
            "status": "OK",
            "responseData": data,
        });
        TransportResponse::new(200, body.to_string())
    }
}

#[async_trait]
impl VerificationTransport for MockTransport {
    async fn send(&self, request: &TransportRequest) -> KraResult<TransportResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let behavior = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(MockBehavior::Success);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let outcome = match behavior {
            MockBehavior::Success => Ok(Self::success(request)),
            MockBehavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(Self::success(request))
            }
            MockBehavior::Status(status, body) => Ok(TransportResponse::new(status, body)),
            MockBehavior::Throttled(hint) => {
                let response = TransportResponse::new(429, "");
                Ok(match hint {
                    Some(hint) => response.with_retry_after(hint),
                    None => response,
                })
            }
            MockBehavior::ConnectionError => Err(TransportError::new("connection reset").into()),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }

    fn name(&self) -> &str {
        "mock"
    }
}
