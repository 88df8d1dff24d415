use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{flatten::flatten, surface::Surface};

/// Separator between the segments of a member path.
pub const PATH_SEPARATOR: char = '.';

/// Classified, flattened description of one exposed API surface.
///
/// The three lists are pairwise disjoint. Once computed a descriptor never changes, even
/// though the object it describes may.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
	pub properties: Vec<String>,
	pub sync_methods: Vec<String>,
	pub async_methods: Vec<String>,
}

impl Descriptor {
	/// Collapses the pure-data subtrees of a discovered surface.
	#[must_use]
	pub fn from_surface(surface: Surface) -> Self {
		let Surface {
			properties,
			sync_methods,
			async_methods,
		} = surface;

		let properties = flatten(
			&properties,
			sync_methods.iter().chain(&async_methods).map(String::as_str),
		);

		Self {
			properties,
			sync_methods,
			async_methods,
		}
	}

	#[must_use]
	pub fn is_disjoint(&self) -> bool {
		let mut seen = HashSet::new();

		self.properties
			.iter()
			.chain(&self.sync_methods)
			.chain(&self.async_methods)
			.all(|path| seen.insert(path.as_str()))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.properties.len() + self.sync_methods.len() + self.async_methods.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
