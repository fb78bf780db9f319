//! # gerrit-argo-gateway
//!
//! Relays Gerrit `stream-events` to an Argo Events webhook. Only new
//! patchsets with a real code change and `recheck` comments are forwarded.
//!
//! ## Modules
//!
//! - `config` - Startup configuration resolved from the environment
//! - `event` - Decoded stream events and the accept/reject classifier
//! - `session` - Remote command sessions, with the ssh client adapter
//! - `stream` - Lazy event stream over one session, with stop control
//! - `forwarder` - HTTP delivery of accepted events
//! - `gateway` - The sequential classify-and-forward loop
//! - `app` - Logging, fatal error reporting and signal handling for the binary
pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod forwarder;
pub mod gateway;
pub mod session;
pub mod stream;

pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::{Gateway, RunSummary};
pub use stream::{StopHandle, StreamState};
