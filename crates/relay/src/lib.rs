//! Companion Relay: forwards a companion app's HTTP requests with a
//! device-issued account token attached.
//!
//! # Invariants
//! - The endpoint is chosen by the last path segment of the message URL.
//! - Only a `nonce` request answered with HTTP 200 sends anything back.

mod message;
mod relay;
#[cfg(feature = "http")]
mod transport;

pub use message::{AppMessage, OutboundMessage, RelayMethod, SubmitBody};
pub use relay::{
    AccountTokenSource, CompanionSink, HttpResponse, HttpTransport, Relay, RelayError,
    RelayOutcome,
};
#[cfg(feature = "http")]
pub use transport::ReqwestTransport;
