//! Client side of the bridge: binds exposed APIs into local mirror objects.

use std::{
	collections::{BTreeMap, HashMap},
	fmt,
	ops::Deref,
	sync::{Arc, Mutex, PoisonError},
};

use futures::{future::BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{
	channel::ChannelNamer,
	config::BridgeConfig,
	descriptor::{Descriptor, PATH_SEPARATOR},
	envelope::Envelope,
	error::{Error, MirrorKind, RemoteInvocationError},
	scope::PerTransport,
	transport::ClientTransport,
};

type Getter = Box<dyn Fn() -> Result<Value, Error> + Send + Sync>;

type SyncCall = Box<dyn Fn(Vec<Value>) -> Result<Value, Error> + Send + Sync>;

type AsyncCall = Box<dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value, Error>> + Send + Sync>;

type BoundApis = Mutex<HashMap<String, Arc<Mirror>>>;

static BOUND: PerTransport<dyn ClientTransport, BoundApis> = PerTransport::new();

/// Binds exposed APIs, at most once per API name.
///
/// Binders created on the same transport with the same channel prefix share one cache, so
/// they all hand out the very same mirror for an API. Bound mirrors live as long as the
/// process.
pub struct Binder {
	transport: Arc<dyn ClientTransport>,
	namer: ChannelNamer,
	bound: Arc<BoundApis>,
}

impl Binder {
	pub fn new(transport: Arc<dyn ClientTransport>) -> Self {
		Self::with_config(transport, &BridgeConfig::default())
	}

	pub fn with_config(transport: Arc<dyn ClientTransport>, config: &BridgeConfig) -> Self {
		let namer = ChannelNamer::from_config(config);
		let bound = BOUND.get(&transport, namer.prefix());

		Self {
			transport,
			namer,
			bound,
		}
	}

	/// Returns the mirror of `api_name`, building it on first use.
	///
	/// The first call fetches the API descriptor from the host, every later call hands out
	/// the very same mirror without any round trip.
	#[instrument(skip(self))]
	pub fn bind(&self, api_name: &str) -> Result<Arc<Mirror>, Error> {
		let mut bound = self.bound.lock().unwrap_or_else(PoisonError::into_inner);

		if let Some(mirror) = bound.get(api_name) {
			return Ok(Arc::clone(mirror));
		}

		let channel = self.namer.descriptor();
		let reply = self
			.transport
			.send_sync(channel, vec![Value::String(api_name.to_string())])?;

		if reply.is_null() {
			return Err(Error::NotExposed(api_name.to_string()));
		}

		let descriptor = serde_json::from_value::<Descriptor>(reply).map_err(|source| {
			Error::MalformedReply {
				channel: channel.to_string(),
				source,
			}
		})?;

		let mirror = Arc::new(self.build(api_name, descriptor));

		debug!(members = mirror.descriptor.len(), "Bound API");

		bound.insert(api_name.to_string(), Arc::clone(&mirror));

		Ok(mirror)
	}

	#[must_use]
	pub fn is_bound(&self, api_name: &str) -> bool {
		self.bound
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.contains_key(api_name)
	}

	fn build(&self, api_name: &str, descriptor: Descriptor) -> Mirror {
		let mut root = MirrorObject::new(Arc::from(api_name), String::new());

		for property in &descriptor.properties {
			let channel = self.namer.member(api_name, property);
			root.define(property, property_getter(Arc::clone(&self.transport), channel));
		}

		for method in &descriptor.sync_methods {
			let channel = self.namer.member(api_name, method);
			root.define(method, sync_call(Arc::clone(&self.transport), channel));
		}

		for method in &descriptor.async_methods {
			let channel = self.namer.member(api_name, method);
			root.define(method, async_call(Arc::clone(&self.transport), channel));
		}

		Mirror {
			api_name: api_name.to_string(),
			descriptor,
			root,
		}
	}
}

fn property_getter(transport: Arc<dyn ClientTransport>, channel: String) -> MirrorMember {
	MirrorMember::Property(Box::new(move || {
		open(&channel, transport.send_sync(&channel, Vec::new())?)?
			.map_err(|message| RemoteInvocationError::property(&channel, message).into())
	}))
}

fn sync_call(transport: Arc<dyn ClientTransport>, channel: String) -> MirrorMember {
	MirrorMember::SyncMethod(Box::new(move |args| {
		open(&channel, transport.send_sync(&channel, args)?)?
			.map_err(|message| RemoteInvocationError::method(&channel, message).into())
	}))
}

fn async_call(transport: Arc<dyn ClientTransport>, channel: String) -> MirrorMember {
	let channel = Arc::<str>::from(channel);

	MirrorMember::AsyncMethod(Box::new(move |args| {
		let transport = Arc::clone(&transport);
		let channel = Arc::clone(&channel);

		async move {
			open(&channel, transport.invoke(&channel, args).await?)?
				.map_err(|message| RemoteInvocationError::method(&*channel, message).into())
		}
		.boxed()
	}))
}

/// Opens a reply envelope: the outer error is a broken reply, the inner one the host's.
fn open(channel: &str, reply: Value) -> Result<Result<Value, String>, Error> {
	Envelope::from_value(reply)
		.map(Envelope::into_result)
		.map_err(|source| Error::MalformedReply {
			channel: channel.to_string(),
			source,
		})
}

/// Local stand-in for an exposed API.
///
/// Derefs to its root [`MirrorObject`], so members are reached directly on the mirror.
pub struct Mirror {
	api_name: String,
	descriptor: Descriptor,
	root: MirrorObject,
}

impl Mirror {
	#[must_use]
	pub fn api_name(&self) -> &str {
		&self.api_name
	}

	/// The descriptor this mirror was built from.
	#[must_use]
	pub const fn descriptor(&self) -> &Descriptor {
		&self.descriptor
	}
}

impl Deref for Mirror {
	type Target = MirrorObject;

	fn deref(&self) -> &Self::Target {
		&self.root
	}
}

impl fmt::Debug for Mirror {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Mirror")
			.field("api_name", &self.api_name)
			.field("root", &self.root)
			.finish_non_exhaustive()
	}
}

pub enum MirrorMember {
	Object(MirrorObject),
	/// Read through a blocking round trip on every access.
	Property(Getter),
	SyncMethod(SyncCall),
	AsyncMethod(AsyncCall),
}

impl MirrorMember {
	#[must_use]
	pub const fn kind(&self) -> MirrorKind {
		match self {
			Self::Object(_) => MirrorKind::Object,
			Self::Property(_) => MirrorKind::Property,
			Self::SyncMethod(_) => MirrorKind::SyncMethod,
			Self::AsyncMethod(_) => MirrorKind::AsyncMethod,
		}
	}
}

impl fmt::Debug for MirrorMember {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Object(object) => fmt::Debug::fmt(object, f),
			other => write!(f, "{}", other.kind()),
		}
	}
}

/// A level of a mirror: its members keyed by name, nested objects included.
pub struct MirrorObject {
	api_name: Arc<str>,
	path: String,
	members: BTreeMap<String, MirrorMember>,
}

impl MirrorObject {
	const fn new(api_name: Arc<str>, path: String) -> Self {
		Self {
			api_name,
			path,
			members: BTreeMap::new(),
		}
	}

	/// Defines `member` at `path` below this object, creating intermediate objects on demand.
	fn define(&mut self, path: &str, member: MirrorMember) {
		let (parents, leaf) = path
			.rsplit_once(PATH_SEPARATOR)
			.map_or((None, path), |(parents, leaf)| (Some(parents), leaf));

		let mut target = self;

		for segment in parents.into_iter().flat_map(|parents| parents.split(PATH_SEPARATOR)) {
			let api_name = Arc::clone(&target.api_name);
			let child_path = target.full_path(segment);

			target = match target
				.members
				.entry(segment.to_string())
				.or_insert_with(|| MirrorMember::Object(Self::new(api_name, child_path)))
			{
				MirrorMember::Object(object) => object,
				other => {
					warn!(
						%path,
						conflicting = %other.kind(),
						"Mirror path crosses a non-object member, skipping it"
					);
					return;
				}
			};
		}

		target.members.insert(leaf.to_string(), member);
	}

	/// Path of this object from the mirror root, empty for the root itself.
	#[must_use]
	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.members.keys().map(String::as_str)
	}

	/// Member at the dotted `path` below this object.
	#[must_use]
	pub fn member(&self, path: &str) -> Option<&MirrorMember> {
		let mut segments = path.split(PATH_SEPARATOR);
		let first = self.members.get(segments.next()?)?;

		segments.try_fold(first, |member, segment| match member {
			MirrorMember::Object(object) => object.members.get(segment),
			_ => None,
		})
	}

	pub fn object(&self, path: &str) -> Result<&Self, Error> {
		match self.lookup(path)? {
			MirrorMember::Object(object) => Ok(object),
			other => Err(self.wrong_kind(path, MirrorKind::Object, other)),
		}
	}

	/// Reads a property, through one blocking round trip.
	pub fn get(&self, path: &str) -> Result<Value, Error> {
		match self.lookup(path)? {
			MirrorMember::Property(getter) => getter(),
			other => Err(self.wrong_kind(path, MirrorKind::Property, other)),
		}
	}

	pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
		serde_json::from_value(self.get(path)?).map_err(Error::Decode)
	}

	/// Calls a sync method, blocking until the host returned.
	pub fn call(&self, path: &str, args: Vec<Value>) -> Result<Value, Error> {
		match self.lookup(path)? {
			MirrorMember::SyncMethod(call) => call(args),
			other => Err(self.wrong_kind(path, MirrorKind::SyncMethod, other)),
		}
	}

	pub fn call_as<T: DeserializeOwned>(&self, path: &str, args: Vec<Value>) -> Result<T, Error> {
		serde_json::from_value(self.call(path, args)?).map_err(Error::Decode)
	}

	/// Calls an async method. Other calls may be issued while this one is pending.
	pub async fn call_async(&self, path: &str, args: Vec<Value>) -> Result<Value, Error> {
		let pending = match self.lookup(path)? {
			MirrorMember::AsyncMethod(call) => call(args),
			other => return Err(self.wrong_kind(path, MirrorKind::AsyncMethod, other)),
		};

		pending.await
	}

	pub async fn call_async_as<T: DeserializeOwned>(
		&self,
		path: &str,
		args: Vec<Value>,
	) -> Result<T, Error> {
		serde_json::from_value(self.call_async(path, args).await?).map_err(Error::Decode)
	}

	fn lookup(&self, path: &str) -> Result<&MirrorMember, Error> {
		self.member(path).ok_or_else(|| Error::NoSuchMember {
			api: self.api_name.to_string(),
			path: self.full_path(path),
		})
	}

	fn wrong_kind(&self, path: &str, expected: MirrorKind, found: &MirrorMember) -> Error {
		Error::WrongMemberKind {
			path: self.full_path(path),
			expected,
			found: found.kind(),
		}
	}

	fn full_path(&self, path: &str) -> String {
		if self.path.is_empty() {
			path.to_string()
		} else {
			format!("{}{PATH_SEPARATOR}{path}", self.path)
		}
	}
}

impl fmt::Debug for MirrorObject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(&self.members).finish()
	}
}
