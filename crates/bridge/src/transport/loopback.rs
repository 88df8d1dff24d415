//! In-process transport connecting a host and a client living in the same process.
//!
//! Every argument list and every reply is copied through a MessagePack encoding on its way,
//! so nothing but plain data ever reaches the other side, just like across a real process
//! boundary. Round trips and handler registrations are counted per channel.

use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc, Mutex, PoisonError, RwLock,
	},
};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{trace, warn};

use super::{AsyncHandler, ClientTransport, HostTransport, SyncHandler, TransportError};

#[derive(Default)]
pub struct Loopback {
	sync_handlers: RwLock<HashMap<String, SyncHandler>>,
	async_handlers: RwLock<HashMap<String, AsyncHandler>>,
	round_trips: Mutex<HashMap<String, usize>>,
	registrations: AtomicUsize,
}

impl Loopback {
	#[must_use]
	pub fn new() -> Arc<Self> {
		Arc::default()
	}

	/// Round trips issued on `channel` so far, sync and async alike.
	#[must_use]
	pub fn round_trips(&self, channel: &str) -> usize {
		self.round_trips
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.get(channel)
			.copied()
			.unwrap_or_default()
	}

	#[must_use]
	pub fn total_round_trips(&self) -> usize {
		self.round_trips
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.values()
			.sum()
	}

	/// Handler registrations received so far, replacements included.
	#[must_use]
	pub fn registrations(&self) -> usize {
		self.registrations.load(Ordering::Acquire)
	}

	fn count_round_trip(&self, channel: &str) {
		*self
			.round_trips
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.entry(channel.to_string())
			.or_default() += 1;
	}

	fn register<H>(&self, handlers: &RwLock<HashMap<String, H>>, channel: String, handler: H) {
		self.registrations.fetch_add(1, Ordering::AcqRel);

		if handlers
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(channel.clone(), handler)
			.is_some()
		{
			warn!(%channel, "Replacing already registered handler");
		}
	}
}

impl HostTransport for Loopback {
	fn register_sync(&self, channel: String, handler: SyncHandler) {
		self.register(&self.sync_handlers, channel, handler);
	}

	fn register_async(&self, channel: String, handler: AsyncHandler) {
		self.register(&self.async_handlers, channel, handler);
	}
}

#[async_trait]
impl ClientTransport for Loopback {
	fn send_sync(&self, channel: &str, args: Vec<Value>) -> Result<Value, TransportError> {
		self.count_round_trip(channel);
		trace!(%channel, "Sync round trip");

		let handler = lookup(&self.sync_handlers, channel)?;
		let args = copy(channel, &args)?;

		copy(channel, &handler(args))
	}

	async fn invoke(&self, channel: &str, args: Vec<Value>) -> Result<Value, TransportError> {
		self.count_round_trip(channel);
		trace!(%channel, "Async round trip");

		let handler = lookup(&self.async_handlers, channel)?;
		let args = copy(channel, &args)?;

		copy(channel, &handler(args).await)
	}
}

fn lookup<H: Clone>(
	handlers: &RwLock<HashMap<String, H>>,
	channel: &str,
) -> Result<H, TransportError> {
	handlers
		.read()
		.unwrap_or_else(PoisonError::into_inner)
		.get(channel)
		.cloned()
		.ok_or_else(|| TransportError::NoHandler(channel.to_string()))
}

fn copy<T: Serialize + DeserializeOwned>(channel: &str, value: &T) -> Result<T, TransportError> {
	let codec_error = |reason: String| TransportError::Codec {
		channel: channel.to_string(),
		reason,
	};

	let bytes = rmp_serde::to_vec(value).map_err(|e| codec_error(e.to_string()))?;

	rmp_serde::from_slice(&bytes).map_err(|e| codec_error(e.to_string()))
}
