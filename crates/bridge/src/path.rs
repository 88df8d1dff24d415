//! Resolution of dotted member paths against a live object.
//!
//! Nothing here caches: every resolution walks the object as it is at call time.

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::trace;

use crate::{
	descriptor::PATH_SEPARATOR,
	reflect::{is_hidden_member, read_member, AccessError, Member, MemberKind, Method, Reflect},
	surface::member_names,
};

const ROOT: &str = "<root>";

/// Failure to resolve a member path. Never leaves the host, handlers turn it into an
/// `error` envelope.
#[derive(Debug, Error)]
pub enum ResolveError {
	#[error("empty member path")]
	EmptyPath,
	#[error("cannot read '{segment}' of '{parent}': {source}")]
	Access {
		parent: String,
		segment: String,
		#[source]
		source: AccessError,
	},
	#[error("'{segment}' is not defined on '{parent}'")]
	Undefined { parent: String, segment: String },
	#[error("cannot read '{segment}' of '{parent}': it holds {kind}, not an object")]
	NotAnObject {
		parent: String,
		segment: String,
		kind: MemberKind,
	},
	#[error("'{path}' is not a function, it holds {kind}")]
	NotCallable { path: String, kind: MemberKind },
	#[error("'{path}' holds a {kind}, which is not transferable data")]
	NotData { path: String, kind: MemberKind },
	#[error("cyclic object reference below '{path}' can't be copied")]
	Cyclic { path: String },
}

/// Walks `path` from `root`, through nested objects and plain JSON objects alike.
pub fn resolve(root: &Arc<dyn Reflect>, path: &str) -> Result<Member, ResolveError> {
	if path.is_empty() {
		return Err(ResolveError::EmptyPath);
	}

	let mut current = Member::Object(Arc::clone(root));
	let mut parent = ROOT;

	for (idx, segment) in segment_ends(path) {
		current = match current {
			Member::Object(object) => {
				read_member(&object, segment).map_err(|source| ResolveError::Access {
					parent: parent.to_string(),
					segment: segment.to_string(),
					source,
				})?
			}

			Member::Data(Value::Object(mut map)) => map
				.remove(segment)
				.map(Member::Data)
				.ok_or_else(|| ResolveError::Undefined {
					parent: parent.to_string(),
					segment: segment.to_string(),
				})?,

			other => {
				return Err(ResolveError::NotAnObject {
					parent: parent.to_string(),
					segment: segment.to_string(),
					kind: other.kind(),
				})
			}
		};

		parent = &path[..idx];
	}

	Ok(current)
}

/// Reads the plain value at `path`. Nested objects are copied into plain JSON objects.
///
/// Hidden keys of JSON objects are dropped, the same way discovery never lists them.
pub fn read_data(root: &Arc<dyn Reflect>, path: &str) -> Result<Value, ResolveError> {
	match resolve(root, path)? {
		Member::Data(value) => Ok(without_hidden_keys(value)),
		Member::Collection(collection) => Ok(collection.into_value()),
		Member::Object(object) => snapshot(&object, path),
		member @ Member::Method(_) => Err(ResolveError::NotData {
			path: path.to_string(),
			kind: member.kind(),
		}),
	}
}

/// Resolves the callable at `path`, bound to the object that holds it.
pub fn resolve_method(root: &Arc<dyn Reflect>, path: &str) -> Result<Method, ResolveError> {
	match resolve(root, path)? {
		Member::Method(method) => Ok(method),
		other => Err(ResolveError::NotCallable {
			path: path.to_string(),
			kind: other.kind(),
		}),
	}
}

/// Copies the readable data members of `object` into a plain JSON object.
///
/// Methods are dropped and unreadable members are left out, so what remains is exactly
/// what a structured copy across the bridge would carry.
pub fn snapshot(object: &Arc<dyn Reflect>, path: &str) -> Result<Value, ResolveError> {
	fn inner(
		object: &Arc<dyn Reflect>,
		path: &str,
		ancestry: &mut Vec<*const ()>,
	) -> Result<Value, ResolveError> {
		let address = Arc::as_ptr(object).cast::<()>();
		if ancestry.contains(&address) {
			return Err(ResolveError::Cyclic {
				path: path.to_string(),
			});
		}

		ancestry.push(address);

		let mut copy = Map::new();

		for name in member_names(object.as_ref()) {
			let value = match read_member(object, name) {
				Ok(Member::Data(value)) => without_hidden_keys(value),
				Ok(Member::Collection(collection)) => collection.into_value(),
				Ok(Member::Object(nested)) => {
					inner(&nested, &format!("{path}{PATH_SEPARATOR}{name}"), ancestry)?
				}
				Ok(Member::Method(_)) => continue,
				Err(e) => {
					trace!(%path, name, ?e, "Leaving unreadable member out of snapshot");
					continue;
				}
			};

			copy.insert(name.to_string(), value);
		}

		ancestry.pop();

		Ok(Value::Object(copy))
	}

	inner(object, path, &mut Vec::new())
}

/// Drops hidden keys from a JSON object and from the objects nested in it. Sequences are
/// leaves and are kept as they are.
fn without_hidden_keys(value: Value) -> Value {
	match value {
		Value::Object(map) => Value::Object(
			map.into_iter()
				.filter(|(key, _)| !is_hidden_member(key))
				.map(|(key, value)| (key, without_hidden_keys(value)))
				.collect(),
		),
		other => other,
	}
}

/// Yields each segment of `path` with the byte offset where it ends.
fn segment_ends(path: &str) -> impl Iterator<Item = (usize, &str)> {
	let mut start = 0;

	path.split(PATH_SEPARATOR).map(move |segment| {
		let end = start + segment.len();
		start = end + PATH_SEPARATOR.len_utf8();
		(end, segment)
	})
}
