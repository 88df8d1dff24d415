//! Host side of the bridge: exposes live objects to the client.

use std::{
	any::Any,
	collections::HashMap,
	panic::{catch_unwind, AssertUnwindSafe},
	sync::{Arc, OnceLock, PoisonError, RwLock},
};

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use crate::{
	channel::ChannelNamer,
	config::BridgeConfig,
	descriptor::Descriptor,
	envelope::Envelope,
	path::{read_data, resolve_method},
	reflect::{panic_message, Arguments, Method, Reflect},
	scope::PerTransport,
	surface::discover,
	transport::{HostTransport, SyncHandler},
};

/// Registry and lookup endpoint shared by every `Exposer` on one transport and prefix.
#[derive(Default)]
struct HostState {
	registry: RwLock<HashMap<String, Descriptor>>,
	descriptor_endpoint: OnceLock<()>,
}

static HOSTS: PerTransport<dyn HostTransport, HostState> = PerTransport::new();

/// Outcome of [`Exposer::expose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exposure {
	Exposed(Descriptor),
	/// The API name was taken already, nothing was registered.
	AlreadyExposed,
}

/// Registers transport handlers for the members of exposed objects and answers descriptor
/// lookups from clients.
///
/// Each API name is exposed at most once per transport and channel prefix, the first exposure
/// wins. Exposers created on the same transport with the same prefix share their registry, so
/// any of them sees what the others exposed.
pub struct Exposer {
	transport: Arc<dyn HostTransport>,
	namer: ChannelNamer,
	state: Arc<HostState>,
}

impl Exposer {
	pub fn new(transport: Arc<dyn HostTransport>) -> Self {
		Self::with_config(transport, &BridgeConfig::default())
	}

	pub fn with_config(transport: Arc<dyn HostTransport>, config: &BridgeConfig) -> Self {
		let namer = ChannelNamer::from_config(config);
		let state = HOSTS.get(&transport, namer.prefix());

		Self {
			transport,
			namer,
			state,
		}
	}

	/// Exposes `api` under the name of its type.
	pub fn expose_api(&self, api: Arc<dyn Reflect>) -> Exposure {
		let api_name = api.type_name();
		self.expose(api_name, api)
	}

	/// Exposes the members of `api` under `api_name`.
	///
	/// The surface is discovered once, now. Handlers resolve their member against the live
	/// `api` on every round trip, so later changes to its values are always observed.
	pub fn expose(&self, api_name: impl Into<String>, api: Arc<dyn Reflect>) -> Exposure {
		self.expose_named(api_name.into(), api)
	}

	#[instrument(skip(self, api))]
	fn expose_named(&self, api_name: String, api: Arc<dyn Reflect>) -> Exposure {
		self.ensure_descriptor_endpoint();

		let mut registry = self
			.state
			.registry
			.write()
			.unwrap_or_else(PoisonError::into_inner);

		if registry.contains_key(&api_name) {
			warn!("API {api_name} is already exposed");
			return Exposure::AlreadyExposed;
		}

		let descriptor = Descriptor::from_surface(discover(&api));
		debug_assert!(descriptor.is_disjoint(), "descriptor lists must not overlap");

		for property in &descriptor.properties {
			self.transport.register_sync(
				self.namer.member(&api_name, property),
				property_handler(Arc::clone(&api), property),
			);
		}

		for method in &descriptor.sync_methods {
			self.transport.register_sync(
				self.namer.member(&api_name, method),
				sync_method_handler(Arc::clone(&api), method),
			);
		}

		for method in &descriptor.async_methods {
			let root = Arc::clone(&api);
			let path = Arc::<str>::from(method.as_str());

			self.transport.register_async(
				self.namer.member(&api_name, method),
				Arc::new(move |args: Vec<Value>| {
					invoke_async(Arc::clone(&root), Arc::clone(&path), args).boxed()
				}),
			);
		}

		debug!(
			properties = descriptor.properties.len(),
			sync_methods = descriptor.sync_methods.len(),
			async_methods = descriptor.async_methods.len(),
			"Exposed API"
		);

		registry.insert(api_name, descriptor.clone());

		Exposure::Exposed(descriptor)
	}

	#[must_use]
	pub fn descriptor(&self, api_name: &str) -> Option<Descriptor> {
		self.state
			.registry
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(api_name)
			.cloned()
	}

	#[must_use]
	pub fn is_exposed(&self, api_name: &str) -> bool {
		self.state
			.registry
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.contains_key(api_name)
	}

	/// Names of every exposed API, sorted.
	#[must_use]
	pub fn exposed_apis(&self) -> Vec<String> {
		let mut names = self
			.state
			.registry
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.keys()
			.cloned()
			.collect::<Vec<_>>();

		names.sort_unstable();

		names
	}

	#[must_use]
	pub const fn namer(&self) -> &ChannelNamer {
		&self.namer
	}

	fn ensure_descriptor_endpoint(&self) {
		self.state.descriptor_endpoint.get_or_init(|| {
			let state = Arc::clone(&self.state);

			self.transport.register_sync(
				self.namer.descriptor().to_string(),
				Arc::new(move |args: Vec<Value>| {
					let Some(api_name) = args.first().and_then(Value::as_str) else {
						return Value::Null;
					};

					state
						.registry
						.read()
						.unwrap_or_else(PoisonError::into_inner)
						.get(api_name)
						.map_or(Value::Null, |descriptor| {
							serde_json::to_value(descriptor).unwrap_or_else(|e| {
								error!(%api_name, ?e, "Failed to serialize descriptor");
								Value::Null
							})
						})
				}),
			);

			debug!("Registered descriptor lookup endpoint");
		});
	}
}

fn property_handler(root: Arc<dyn Reflect>, path: &str) -> SyncHandler {
	let path = path.to_string();

	Arc::new(move |_args: Vec<Value>| {
		guard_sync(&path, || read_data(&root, &path).map_err(|e| e.to_string())).into_value()
	})
}

fn sync_method_handler(root: Arc<dyn Reflect>, path: &str) -> SyncHandler {
	let path = path.to_string();

	Arc::new(move |args: Vec<Value>| {
		guard_sync(&path, || {
			match resolve_method(&root, &path).map_err(|e| e.to_string())? {
				Method::Sync(method) => method(Arguments::new(args)).map_err(|e| e.to_string()),
				Method::Async(_) => Err(format!(
					"'{path}' has to be awaited, it can't be called synchronously"
				)),
			}
		})
		.into_value()
	})
}

async fn invoke_async(root: Arc<dyn Reflect>, path: Arc<str>, args: Vec<Value>) -> Value {
	let call = async {
		let method = resolve_method(&root, &path).map_err(|e| e.to_string())?;
		let args = Arguments::new(args);

		// Sync methods are awaited like any other value.
		let result = match method {
			Method::Async(method) => method(args).await,
			Method::Sync(method) => method(args),
		};

		result.map_err(|e| e.to_string())
	};

	let envelope = match AssertUnwindSafe(call).catch_unwind().await {
		Ok(result) => Envelope::from(result),
		Err(payload) => panicked(&path, payload.as_ref()),
	};

	envelope.into_value()
}

fn guard_sync(path: &str, f: impl FnOnce() -> Result<Value, String>) -> Envelope {
	match catch_unwind(AssertUnwindSafe(f)) {
		Ok(result) => Envelope::from(result),
		Err(payload) => panicked(path, payload.as_ref()),
	}
}

fn panicked(path: &str, payload: &(dyn Any + Send)) -> Envelope {
	let message = panic_message(payload);

	error!(%path, %message, "Host member panicked");

	Envelope::Error(message)
}
