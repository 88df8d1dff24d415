//! Member classification for exposable objects.
//!
//! Rust has no runtime member enumeration, so an exposable object describes itself: it lists
//! the member names it declares on each of its capability levels and hands out a classified
//! [`Member`] for any of those names on request. Methods come out already bound to the object
//! that produced them, so resolving `wallet.sign` and calling the result acts on the live
//! `wallet` sub-object.

use std::{
	any::Any,
	collections::{BTreeMap, BTreeSet},
	error::Error as StdError,
	fmt,
	future::Future,
	panic::{catch_unwind, AssertUnwindSafe},
	sync::Arc,
};

use futures::{future::BoxFuture, FutureExt};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Opaque failure raised by a host method, only its message ever crosses the bridge.
pub type MethodError = Box<dyn StdError + Send + Sync>;

pub type MethodResult = Result<Value, MethodError>;

pub type SyncMethod = Arc<dyn Fn(Arguments) -> MethodResult + Send + Sync>;

pub type AsyncMethod = Arc<dyn Fn(Arguments) -> BoxFuture<'static, MethodResult> + Send + Sync>;

/// Member names that are never exposed, whatever level declares them.
pub const CONSTRUCTOR_MEMBER: &str = "constructor";

const PRIVATE_MARKERS: [char; 2] = ['_', '#'];

#[must_use]
pub fn is_hidden_member(name: &str) -> bool {
	name == CONSTRUCTOR_MEMBER || name.starts_with(PRIVATE_MARKERS)
}

#[derive(Debug, Error)]
pub enum AccessError {
	#[error("no member named '{0}'")]
	NoSuchMember(String),
	#[error("failed to read member <name='{name}'>: {reason}")]
	Unreadable { name: String, reason: String },
	#[error("failed to serialize member value: {0}")]
	Serialize(#[from] serde_json::Error),
}

impl AccessError {
	pub fn missing(name: impl Into<String>) -> Self {
		Self::NoSuchMember(name.into())
	}

	pub fn unreadable(name: impl Into<String>, reason: impl fmt::Display) -> Self {
		Self::Unreadable {
			name: name.into(),
			reason: reason.to_string(),
		}
	}
}

/// One step of an object's capability hierarchy: the members it declares itself.
///
/// Levels are listed from the most specific (the object's own members) to the most general
/// ancestor. The universal base every object shares, the [`Reflect`] machinery itself, is
/// never listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
	pub name: &'static str,
	pub members: &'static [&'static str],
}

impl Level {
	#[must_use]
	pub const fn new(name: &'static str, members: &'static [&'static str]) -> Self {
		Self { name, members }
	}
}

/// An object whose members can be discovered and resolved at runtime.
///
/// `member` takes `self` behind an [`Arc`] so that methods can hold on to the object they
/// belong to.
pub trait Reflect: Send + Sync + 'static {
	/// Name of the object's concrete type, used as the default API name.
	fn type_name(&self) -> &'static str;

	fn levels(&self) -> Vec<Level>;

	/// Reads the current value of a member. Called again on every access, never cached.
	fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError>;
}

/// Reads member `name` of `object`, turning a panicking getter into an unreadable member.
pub(crate) fn read_member(object: &Arc<dyn Reflect>, name: &str) -> Result<Member, AccessError> {
	catch_unwind(AssertUnwindSafe(|| Arc::clone(object).member(name))).unwrap_or_else(|payload| {
		let message = panic_message(payload.as_ref());
		warn!(type_name = object.type_name(), name, %message, "Member getter panicked");

		Err(AccessError::unreadable(name, format!("getter panicked: {message}")))
	})
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
	payload
		.downcast_ref::<&str>()
		.map(ToString::to_string)
		.or_else(|| payload.downcast_ref::<String>().cloned())
		.unwrap_or_else(|| "host member panicked".to_string())
}

/// Classified value of a single member.
pub enum Member {
	/// Plain data. JSON objects are walked into during discovery, everything else is a leaf.
	Data(Value),
	/// Keyed or unique-valued collection, always exposed as a single leaf.
	Collection(Collection),
	/// Nested object exposing its own members.
	Object(Arc<dyn Reflect>),
	Method(Method),
}

impl Member {
	pub fn data(value: impl Into<Value>) -> Self {
		Self::Data(value.into())
	}

	pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, AccessError> {
		serde_json::to_value(value).map(Self::Data).map_err(Into::into)
	}

	pub fn object<T: Reflect>(object: Arc<T>) -> Self {
		Self::Object(object)
	}

	pub fn sync_method<F>(method: F) -> Self
	where
		F: Fn(Arguments) -> MethodResult + Send + Sync + 'static,
	{
		Self::Method(Method::Sync(Arc::new(method)))
	}

	pub fn async_method<F, Fut>(method: F) -> Self
	where
		F: Fn(Arguments) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = MethodResult> + Send + 'static,
	{
		Self::Method(Method::Async(Arc::new(move |args: Arguments| method(args).boxed())))
	}

	#[must_use]
	pub const fn kind(&self) -> MemberKind {
		match self {
			Self::Data(_) => MemberKind::Data,
			Self::Collection(_) => MemberKind::Collection,
			Self::Object(_) => MemberKind::Object,
			Self::Method(Method::Sync(_)) => MemberKind::SyncMethod,
			Self::Method(Method::Async(_)) => MemberKind::AsyncMethod,
		}
	}
}

impl fmt::Debug for Member {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Data(value) => f.debug_tuple("Data").field(value).finish(),
			Self::Collection(collection) => f.debug_tuple("Collection").field(collection).finish(),
			Self::Object(object) => f.debug_tuple("Object").field(&object.type_name()).finish(),
			Self::Method(method) => f.debug_tuple("Method").field(method).finish(),
		}
	}
}

/// A callable member together with its declared execution contract.
#[derive(Clone)]
pub enum Method {
	/// Completes before returning.
	Sync(SyncMethod),
	/// Its result has to be awaited.
	Async(AsyncMethod),
}

impl fmt::Debug for Method {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Sync(_) => "Sync",
			Self::Async(_) => "Async",
		})
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
	Map(Map<String, Value>),
	Set(Vec<Value>),
}

impl Collection {
	pub fn map<K: fmt::Display, V: Serialize>(
		entries: &BTreeMap<K, V>,
	) -> Result<Self, AccessError> {
		entries
			.iter()
			.map(|(key, value)| serde_json::to_value(value).map(|value| (key.to_string(), value)))
			.collect::<Result<Map<_, _>, _>>()
			.map(Self::Map)
			.map_err(Into::into)
	}

	pub fn set<T: Serialize>(items: &BTreeSet<T>) -> Result<Self, AccessError> {
		items
			.iter()
			.map(serde_json::to_value)
			.collect::<Result<Vec<_>, _>>()
			.map(Self::Set)
			.map_err(Into::into)
	}

	#[must_use]
	pub fn into_value(self) -> Value {
		match self {
			Self::Map(map) => Value::Object(map),
			Self::Set(items) => Value::Array(items),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
	Data,
	Collection,
	Object,
	SyncMethod,
	AsyncMethod,
}

impl fmt::Display for MemberKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Data => "data",
			Self::Collection => "collection",
			Self::Object => "object",
			Self::SyncMethod => "sync method",
			Self::AsyncMethod => "async method",
		})
	}
}

/// Positional arguments received by a host method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Vec<Value>);

impl Arguments {
	#[must_use]
	pub const fn new(values: Vec<Value>) -> Self {
		Self(values)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[must_use]
	pub fn raw(&self, index: usize) -> Option<&Value> {
		self.0.get(index)
	}

	/// Decodes the argument at `index`. A missing argument decodes from `null`, so optional
	/// trailing parameters can be omitted by the caller.
	pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, MethodError> {
		let value = self.0.get(index).cloned().unwrap_or(Value::Null);

		serde_json::from_value(value)
			.map_err(|e| format!("invalid argument <index='{index}'>: {e}").into())
	}

	#[must_use]
	pub fn into_inner(self) -> Vec<Value> {
		self.0
	}
}

impl From<Vec<Value>> for Arguments {
	fn from(values: Vec<Value>) -> Self {
		Self(values)
	}
}
