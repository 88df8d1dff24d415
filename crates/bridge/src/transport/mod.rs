//! Interfaces of the message passing layer both sides of the bridge sit on.
//!
//! The host registers one handler per channel name, the client reaches them through a narrow
//! bridge object offering a blocking round trip and an awaitable one, and nothing else. Only
//! plain data travels: arguments and replies are [`Value`]s.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

pub mod loopback;

pub use loopback::Loopback;

/// Handler for a blocking round trip, its return value is sent back as the reply.
pub type SyncHandler = Arc<dyn Fn(Vec<Value>) -> Value + Send + Sync>;

/// Handler for an awaitable round trip.
pub type AsyncHandler = Arc<dyn Fn(Vec<Value>) -> BoxFuture<'static, Value> + Send + Sync>;

/// Host side of the transport.
///
/// Exactly one handler serves a channel; registering a second one for the same name replaces
/// the first.
pub trait HostTransport: Send + Sync {
	fn register_sync(&self, channel: String, handler: SyncHandler);

	fn register_async(&self, channel: String, handler: AsyncHandler);
}

/// Client side of the transport, the only thing the client process gets to talk to the host.
#[async_trait]
pub trait ClientTransport: Send + Sync {
	/// Sends `args` on `channel` and blocks until the host handler replied.
	fn send_sync(&self, channel: &str, args: Vec<Value>) -> Result<Value, TransportError>;

	/// Sends `args` on `channel`, resolving once the host handler replied. Concurrent calls
	/// may complete in any order.
	async fn invoke(&self, channel: &str, args: Vec<Value>) -> Result<Value, TransportError>;
}

#[derive(Debug, Error)]
pub enum TransportError {
	#[error("no handler registered <channel='{0}'>")]
	NoHandler(String),
	#[error("message can't cross the bridge <channel='{channel}'>: {reason}")]
	Codec { channel: String, reason: String },
}
