use std::env;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CHANNEL_PREFIX: &str = "bsBridge";

pub const CHANNEL_PREFIX_ENV_VAR: &str = "BS_BRIDGE_CHANNEL_PREFIX";

/// Settings shared by both sides of a bridge. Host and client must agree on them, otherwise
/// none of the derived channel names will match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
	pub channel_prefix: String,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		Self {
			channel_prefix: DEFAULT_CHANNEL_PREFIX.to_string(),
		}
	}
}

impl BridgeConfig {
	/// Default config, with the channel prefix overridden by `BS_BRIDGE_CHANNEL_PREFIX` when set
	#[must_use]
	pub fn from_env() -> Self {
		env::var(CHANNEL_PREFIX_ENV_VAR)
			.ok()
			.filter(|prefix| !prefix.is_empty())
			.map_or_else(Self::default, |channel_prefix| Self { channel_prefix })
	}
}
