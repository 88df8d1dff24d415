//! Surface discovery: walks an object graph and classifies every reachable member.

use std::{collections::HashSet, sync::Arc};

use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::{
	descriptor::PATH_SEPARATOR,
	reflect::{is_hidden_member, read_member, Member, Method, Reflect},
};

/// Unflattened result of a discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Surface {
	pub properties: Vec<String>,
	pub sync_methods: Vec<String>,
	pub async_methods: Vec<String>,
}

/// Names of the visible members of `object`, walking its levels from the most specific one.
///
/// A name declared on several levels is listed once, at its first occurrence.
#[must_use]
pub fn member_names(object: &dyn Reflect) -> Vec<&'static str> {
	let mut seen = HashSet::new();

	object
		.levels()
		.into_iter()
		.flat_map(|level| level.members.iter().copied())
		.filter(|name| !is_hidden_member(name) && seen.insert(*name))
		.collect()
}

/// Discovers every property and method reachable from `root`.
///
/// Nested objects and plain JSON objects are expanded into their members and never listed
/// themselves. Sequences and collections are leaves. Members that fail to read are skipped.
#[must_use]
pub fn discover(root: &Arc<dyn Reflect>) -> Surface {
	let mut discoverer = Discoverer::default();
	discoverer.object(root, None);
	discoverer.surface
}

#[derive(Default)]
struct Discoverer {
	surface: Surface,
	// Objects currently being walked, to break reference cycles.
	ancestry: Vec<*const ()>,
}

impl Discoverer {
	fn object(&mut self, object: &Arc<dyn Reflect>, prefix: Option<&str>) {
		let address = Arc::as_ptr(object).cast::<()>();
		if self.ancestry.contains(&address) {
			warn!(
				path = prefix.unwrap_or_default(),
				type_name = object.type_name(),
				"Cyclic object reference, not exposing it again"
			);
			return;
		}

		self.ancestry.push(address);

		for name in member_names(object.as_ref()) {
			let path = join(prefix, name);

			match read_member(object, name) {
				Ok(member) => self.member(member, path),
				Err(e) => trace!(%path, ?e, "Skipping unreadable member"),
			}
		}

		self.ancestry.pop();
	}

	fn member(&mut self, member: Member, path: String) {
		match member {
			Member::Method(Method::Sync(_)) => self.surface.sync_methods.push(path),
			Member::Method(Method::Async(_)) => self.surface.async_methods.push(path),
			Member::Data(Value::Object(map)) => self.map(&map, &path),
			Member::Data(_) | Member::Collection(_) => self.surface.properties.push(path),
			Member::Object(child) => self.object(&child, Some(&path)),
		}
	}

	fn map(&mut self, map: &Map<String, Value>, prefix: &str) {
		for (key, value) in map.iter().filter(|(key, _)| !is_hidden_member(key)) {
			let path = join(Some(prefix), key);

			if let Value::Object(nested) = value {
				self.map(nested, &path);
			} else {
				self.surface.properties.push(path);
			}
		}
	}
}

fn join(prefix: Option<&str>, name: &str) -> String {
	prefix.map_or_else(
		|| name.to_string(),
		|prefix| format!("{prefix}{PATH_SEPARATOR}{name}"),
	)
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use serde_json::json;
	use tracing_test::traced_test;

	use super::*;
	use crate::reflect::{AccessError, Collection, Level};

	struct Ledger;

	impl Reflect for Ledger {
		fn type_name(&self) -> &'static str {
			"Ledger"
		}

		fn levels(&self) -> Vec<Level> {
			vec![Level::new("Ledger", &["model", "connect", "_transport"])]
		}

		fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError> {
			match name {
				"model" => Ok(Member::data("nano-x")),
				"connect" => Ok(Member::sync_method(|_| Ok(Value::Bool(true)))),
				"_transport" => Ok(Member::data("hid")),
				_ => Err(AccessError::missing(name)),
			}
		}
	}

	struct Account {
		ledger: Arc<Ledger>,
	}

	impl Reflect for Account {
		fn type_name(&self) -> &'static str {
			"Account"
		}

		fn levels(&self) -> Vec<Level> {
			vec![
				Level::new(
					"Account",
					&[
						"constructor",
						"label",
						"history",
						"tags",
						"meta",
						"ledger",
						"broken",
						"sign",
					],
				),
				Level::new("BaseAccount", &["label", "version", "sync"]),
			]
		}

		fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError> {
			match name {
				"constructor" => Ok(Member::data("Account")),
				"label" => Ok(Member::data("main")),
				"version" => Ok(Member::data(3)),
				"history" => Ok(Member::data(json!([{ "hash": "0x01" }]))),
				"tags" => Ok(Member::Collection(Collection::set(&BTreeSet::from([
					"hot", "neo",
				]))?)),
				"meta" => Ok(Member::data(json!({
					"created": 1,
					"colors": { "fg": "#fff" },
					"_cache": true,
				}))),
				"ledger" => Ok(Member::Object(Arc::clone(&self.ledger) as Arc<dyn Reflect>)),
				"broken" => Err(AccessError::unreadable(name, "getter failed")),
				"sign" => Ok(Member::sync_method(|_| Ok(Value::Null))),
				"sync" => Ok(Member::async_method(|_| async { Ok(Value::Null) })),
				_ => Err(AccessError::missing(name)),
			}
		}
	}

	fn account() -> Arc<dyn Reflect> {
		Arc::new(Account {
			ledger: Arc::new(Ledger),
		})
	}

	#[test]
	fn names_are_collected_once_across_levels() {
		assert_eq!(
			member_names(account().as_ref()),
			[
				"label", "history", "tags", "meta", "ledger", "broken", "sign", "version", "sync"
			]
		);
	}

	#[test]
	fn classifies_and_expands_members() {
		let surface = discover(&account());

		assert_eq!(
			surface.properties,
			[
				"label",
				"history",
				"tags",
				"meta.colors.fg",
				"meta.created",
				"ledger.model",
				"version",
			]
		);
		assert_eq!(surface.sync_methods, ["ledger.connect", "sign"]);
		assert_eq!(surface.async_methods, ["sync"]);
	}

	struct Sensor;

	impl Reflect for Sensor {
		fn type_name(&self) -> &'static str {
			"Sensor"
		}

		fn levels(&self) -> Vec<Level> {
			vec![Level::new("Sensor", &["reading", "calibration", "reset"])]
		}

		fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError> {
			match name {
				"reading" => Ok(Member::data(21.5)),
				"calibration" => panic!("calibration table missing"),
				"reset" => Ok(Member::sync_method(|_| Ok(Value::Null))),
				_ => Err(AccessError::missing(name)),
			}
		}
	}

	#[test]
	#[traced_test]
	fn panicking_getters_are_skipped() {
		let sensor: Arc<dyn Reflect> = Arc::new(Sensor);

		let surface = discover(&sensor);

		assert_eq!(surface.properties, ["reading"]);
		assert_eq!(surface.sync_methods, ["reset"]);
		assert!(logs_contain("Member getter panicked"));
	}

	struct Looped;

	impl Reflect for Looped {
		fn type_name(&self) -> &'static str {
			"Looped"
		}

		fn levels(&self) -> Vec<Level> {
			vec![Level::new("Looped", &["me", "value"])]
		}

		fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError> {
			match name {
				"me" => Ok(Member::Object(self)),
				"value" => Ok(Member::data(1)),
				_ => Err(AccessError::missing(name)),
			}
		}
	}

	#[test]
	#[traced_test]
	fn reference_cycles_are_cut() {
		let looped: Arc<dyn Reflect> = Arc::new(Looped);

		let surface = discover(&looped);

		assert_eq!(surface.properties, ["value"]);
		assert!(logs_contain("Cyclic object reference"));
	}
}
