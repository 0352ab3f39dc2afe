//! Transport abstraction for the KRA Connect client.
//!
//! The request pipeline never talks to the network directly. It hands a
//! [`TransportRequest`] to a [`VerificationTransport`] and interprets the
//! [`TransportResponse`] it gets back, so tests and alternative HTTP stacks
//! plug in at this seam.

mod traits;
mod types;

pub use traits::VerificationTransport;
pub use types::{TransportRequest, TransportRequestBuilder, TransportResponse};
