use thiserror::Error;

use crate::transport::TransportError;

/// Notice carried by every failed property read: the host's error identity is lost on the
/// way, only its message text makes it across.
pub const STRINGIFIED_DATA_ONLY: &str = "only stringified data crosses the bridge";

#[derive(Debug, Error)]
pub enum Error {
	#[error("API {0} is not exposed to the client")]
	NotExposed(String),
	#[error(transparent)]
	Remote(#[from] RemoteInvocationError),
	#[error(transparent)]
	Transport(#[from] TransportError),
	#[error("malformed reply <channel='{channel}'>: {source}")]
	MalformedReply {
		channel: String,
		#[source]
		source: serde_json::Error,
	},
	#[error("no such member on the mirror <api='{api}', path='{path}'>")]
	NoSuchMember { api: String, path: String },
	#[error("member <path='{path}'> is a {found}, expected {expected}")]
	WrongMemberKind {
		path: String,
		expected: MirrorKind,
		found: MirrorKind,
	},
	#[error("failed to decode remote value: {0}")]
	Decode(#[source] serde_json::Error),
}

/// Failure reported by the host inside an `error` envelope.
///
/// Only the message survives the trip: no error type, no stack.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteInvocationError {
	pub channel: String,
	pub message: String,
}

impl RemoteInvocationError {
	pub fn method(channel: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			channel: channel.into(),
			message: message.into(),
		}
	}

	pub fn property(channel: impl Into<String>, message: impl AsRef<str>) -> Self {
		Self {
			channel: channel.into(),
			message: format!("{STRINGIFIED_DATA_ONLY}: {}", message.as_ref()),
		}
	}
}

/// Shape of a member on a mirror object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorKind {
	Object,
	Property,
	SyncMethod,
	AsyncMethod,
}

impl std::fmt::Display for MirrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			Self::Object => "nested object",
			Self::Property => "property",
			Self::SyncMethod => "sync method",
			Self::AsyncMethod => "async method",
		})
	}
}
