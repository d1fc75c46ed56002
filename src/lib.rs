//! # sellsy-client - Signed JSON-RPC client for the Sellsy API
//!
//! Calls are signed with the API's OAuth 1.0 PLAINTEXT scheme, posted as
//! multipart forms and answered with a JSON envelope that this crate turns
//! into either the untyped `response` payload or a typed [`SellsyError`].
//!
//! ## Features
//!
//! - Blocking calls with [`SellsyClient::call`]
//! - Cancellable async calls with [`SellsyClient::call_async`]
//! - Per-call activity log pairing outbound and inbound traffic
//! - Pluggable transports, reqwest-backed by default
//!
//! ## Basic Usage
//!
//! ```no_run
//! use sellsy_client::{Credentials, SellsyClient};
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SellsyClient::new(Credentials::new(
//!         "user_token",
//!         "user_secret",
//!         "consumer_token",
//!         "consumer_secret",
//!     ));
//!
//!     let client_info = client.call("Client.getOne", json!({ "clientid": 42 }))?;
//!     println!("{}", client_info);
//!     Ok(())
//! }
//! ```
//!
//! ## Async Usage
//!
//! ```no_run
//! use sellsy_client::{Credentials, SellsyClient};
//! use serde_json::json;
//!
//! # async fn run() -> sellsy_client::Result<()> {
//! let client = SellsyClient::new(Credentials::new("ut", "us", "ct", "cs"));
//!
//! let call = client.call_async("Infos.getInfos", json!({}));
//! let cancel = call.cancel_handle();
//! // cancel.cancel() from anywhere abandons the request
//! let infos = call.await?;
//! # let _ = (cancel, infos);
//! # Ok(())
//! # }
//! ```

pub mod activity;
pub mod call;
pub mod client;
pub mod credentials;
pub mod envelope;
pub mod error;
pub mod rpc;
pub mod signer;
pub mod transport;

// Re-export main types for convenience
pub use activity::{ActivityLog, CallId, NoopActivityLog, TracingActivityLog, WriterActivityLog};
pub use call::{CallFuture, CallState, CancelHandle};
pub use client::{Config, DEFAULT_ENDPOINT};
pub use credentials::Credentials;
pub use envelope::{decode_response, encode_request, Params};
pub use error::{Result, SellsyError};
pub use rpc::SellsyClient;
pub use signer::{build_auth_header, AuthHeaders};
pub use transport::{AsyncReqwestTransport, AsyncTransport, PostRequest, ReqwestTransport, Transport, TransportError};

// Re-export serde_json for convenience
pub use serde_json::json;
