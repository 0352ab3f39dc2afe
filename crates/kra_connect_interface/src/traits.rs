//! The transport trait.

use crate::{TransportRequest, TransportResponse};
use async_trait::async_trait;
use kra_connect_error::KraResult;

/// Sends one attempt of a verification call to the upstream API.
///
/// Implementations report any HTTP status as a successful
/// [`TransportResponse`]; only failures to obtain a response at all
/// (connection refused, TLS failure, socket timeout) are errors, and those
/// should be `TransportError`s so the pipeline treats them as transient.
#[async_trait]
pub trait VerificationTransport: Send + Sync {
    /// Deliver the request and return the raw response.
    async fn send(&self, request: &TransportRequest) -> KraResult<TransportResponse>;

    /// Short name for logs (e.g. "http", "mock").
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: VerificationTransport + ?Sized> VerificationTransport for std::sync::Arc<T> {
    async fn send(&self, request: &TransportRequest) -> KraResult<TransportResponse> {
        (**self).send(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
