//! Polygon Provider Adapters
//!
//! Wire types, codec, authentication, and the two transport clients for
//! Polygon.io: a WebSocket client for the live push channel and an HTTP
//! client for the pull-side reference and aggregates endpoints.

pub mod auth;
pub mod codec;
pub mod messages;
pub mod reconnect;
pub mod rest;
pub mod stream;

pub use auth::{ApiKey, AuthError, AuthState};
pub use codec::{CodecError, JsonCodec};
pub use messages::{ActionRequest, AggregateMessage, FeedMessage, StatusKind, StatusMessage};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
pub use rest::RestClient;
pub use stream::{StreamClient, StreamClientConfig, StreamClientError, StreamEvent};
