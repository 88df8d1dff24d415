//!
//! # Bridge
//!
//! Exposes live objects owned by a privileged host process to an isolated client process,
//! over nothing but a message passing transport that carries plain data.
//!
//! The host walks an object once, lists its properties, sync methods and async methods under
//! dotted paths, and registers one transport handler per path. The client fetches that listing
//! once per API and builds a mirror object with the same shape, where reading a property or
//! calling a method is a round trip to the host acting on the live object.
//!
//! - Property reads are blocking round trips and always observe the current host value;
//! - Sync methods block, async methods return futures that can run concurrently;
//! - Host failures come back as their message text only;
//! - Exposing an API twice, or binding it twice, is a no-op.
//!
//! ## Basic example
//!
//! ```
//! use std::sync::{
//! 	atomic::{AtomicI64, Ordering},
//! 	Arc,
//! };
//!
//! use bs_bridge::{AccessError, Binder, Exposer, Level, Loopback, Member, Reflect};
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct Counter {
//! 	counter: AtomicI64,
//! }
//!
//! impl Reflect for Counter {
//! 	fn type_name(&self) -> &'static str {
//! 		"Counter"
//! 	}
//!
//! 	fn levels(&self) -> Vec<Level> {
//! 		vec![Level::new("Counter", &["counter", "increment"])]
//! 	}
//!
//! 	fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError> {
//! 		match name {
//! 			"counter" => Ok(Member::data(self.counter.load(Ordering::SeqCst))),
//! 			"increment" => Ok(Member::sync_method(move |_| {
//! 				Ok(json!(self.counter.fetch_add(1, Ordering::SeqCst) + 1))
//! 			})),
//! 			_ => Err(AccessError::missing(name)),
//! 		}
//! 	}
//! }
//!
//! let transport = Loopback::new();
//!
//! let exposer = Exposer::new(transport.clone());
//! exposer.expose_api(Arc::new(Counter::default()));
//!
//! let binder = Binder::new(transport);
//! let counter = binder.bind("Counter")?;
//!
//! assert_eq!(counter.get("counter")?, json!(0));
//! counter.call("increment", Vec::new())?;
//! assert_eq!(counter.get("counter")?, json!(1));
//! # Ok::<(), bs_bridge::Error>(())
//! ```

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod channel;
mod client;
mod config;
mod descriptor;
mod envelope;
mod error;
mod flatten;
mod host;
mod path;
mod scope;
mod surface;

pub mod reflect;
pub mod transport;

pub use channel::{ChannelNamer, SEPARATOR as CHANNEL_SEPARATOR};
pub use client::{Binder, Mirror, MirrorMember, MirrorObject};
pub use config::{BridgeConfig, CHANNEL_PREFIX_ENV_VAR, DEFAULT_CHANNEL_PREFIX};
pub use descriptor::{Descriptor, PATH_SEPARATOR};
pub use envelope::Envelope;
pub use error::{Error, MirrorKind, RemoteInvocationError, STRINGIFIED_DATA_ONLY};
pub use flatten::flatten;
pub use host::{Exposer, Exposure};
pub use path::{read_data, resolve, resolve_method, snapshot, ResolveError};
pub use reflect::{
	AccessError, Arguments, Collection, Level, Member, MemberKind, Method, MethodError,
	MethodResult, Reflect,
};
pub use surface::{discover, member_names, Surface};
pub use transport::{ClientTransport, HostTransport, Loopback, TransportError};
