//! Collapses pure-data subtrees into single property paths.
//!
//! A subtree without callable members travels cheaper as one value in one round trip, while a
//! subtree holding behaviour has to stay expanded down to its leaves, as behaviour can't be
//! serialized.

use std::collections::HashSet;

use crate::descriptor::PATH_SEPARATOR;

/// Flattens discovered property paths against the paths of every method (sync or async).
///
/// Root level properties are kept as they are. A nested property is replaced by its shortest
/// ancestor that has no method anywhere below it; when every ancestor holds a method the leaf
/// itself is kept. Output order follows first appearance and holds no duplicates.
pub fn flatten<'a>(
	properties: &[String],
	methods: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
	let methods = methods.into_iter().collect::<Vec<_>>();

	let mut kept = HashSet::with_capacity(properties.len());
	let mut flattened = Vec::with_capacity(properties.len());

	for property in properties {
		let path = collapsed_prefix(property, &methods).unwrap_or(property.as_str());

		if kept.insert(path) {
			flattened.push(path.to_string());
		}
	}

	flattened
}

fn collapsed_prefix<'p>(property: &'p str, methods: &[&str]) -> Option<&'p str> {
	property
		.match_indices(PATH_SEPARATOR)
		.map(|(idx, _)| &property[..idx])
		.find(|prefix| !methods.iter().any(|method| is_within(method, prefix)))
}

/// Whether `path` is `prefix` itself or lies anywhere below it, segment-wise.
fn is_within(path: &str, prefix: &str) -> bool {
	path.strip_prefix(prefix)
		.is_some_and(|rest| rest.is_empty() || rest.starts_with(PATH_SEPARATOR))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn run(properties: &[&str], methods: &[&str]) -> Vec<String> {
		let properties = properties
			.iter()
			.map(ToString::to_string)
			.collect::<Vec<_>>();

		flatten(&properties, methods.iter().copied())
	}

	#[test]
	fn root_properties_are_kept() {
		assert_eq!(run(&["a", "b"], &["c"]), ["a", "b"]);
	}

	#[test]
	fn pure_data_subtree_collapses() {
		assert_eq!(
			run(&["name", "tokens.neo", "tokens.gas"], &["transfer"]),
			["name", "tokens"]
		);
	}

	#[test]
	fn subtree_with_behaviour_stays_expanded() {
		assert_eq!(
			run(&["ledger.model", "ledger.version"], &["ledger.connect"]),
			["ledger.model", "ledger.version"]
		);
	}

	#[test]
	fn deep_data_subtree_collapses_to_its_highest_pure_ancestor() {
		assert_eq!(
			run(&["settings.ui.theme", "settings.ui.lang", "settings.rpc"], &[]),
			["settings"]
		);

		assert_eq!(
			run(
				&["wallet.meta.label", "wallet.meta.tags", "wallet.address"],
				&["wallet.sign"]
			),
			["wallet.meta", "wallet.address"]
		);
	}

	#[test]
	fn prefix_match_respects_segment_boundaries() {
		// `walletManager.connect` does not live under `wallet`.
		assert_eq!(
			run(&["wallet.address", "wallet.label"], &["walletManager.connect"]),
			["wallet"]
		);
	}

	#[test]
	fn no_properties() {
		assert!(run(&[], &["a", "b.c"]).is_empty());
	}
}
