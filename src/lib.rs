//! # deepstream-client-rs
//!
//! A Rust client for deepstream-style realtime publish/subscribe servers.
//!
//! The client manages the WebSocket connection lifecycle (challenge,
//! authentication, heartbeat liveness, reconnection with capped backoff) and
//! buffers application messages issued before authentication completes.
//! Event and record semantics live behind the [`EventHandler`] and
//! [`RecordHandler`] collaborator traits.
//!
//! ## Example
//!
//! ```no_run
//! use deepstream_client_rs::{DeepstreamClient, DeepstreamClientOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DeepstreamClient::new(
//!         "ws://localhost:6020/deepstream",
//!         DeepstreamClientOptions {
//!             credentials: serde_json::json!({ "username": "ada" }),
//!             heartbeat_interval: Some(30_000),
//!             ..Default::default()
//!         },
//!     )?;
//!
//!     client.connect(None).await?;
//!     client.login().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod handlers;
pub mod infrastructure;
pub mod messaging;
pub mod types;
pub mod websocket;

pub use client::{ConnectionState, DeepstreamClient, DeepstreamClientBuilder, DeepstreamClientOptions};
pub use handlers::{ErrorHandler, EventHandler, LoggingErrorHandler, RecordHandler};
pub use types::{Action, DeepstreamError, DeepstreamMessage, Result, Topic};
