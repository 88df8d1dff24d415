//! Transport endpoint names.
//!
//! Member channels are `<prefix>:<api>:<path>`, the descriptor lookup channel is
//! `<prefix>:getExposedApi`. API names and path segments must not contain [`SEPARATOR`];
//! nothing is escaped.

use crate::config::BridgeConfig;

pub const SEPARATOR: char = ':';

const DESCRIPTOR_LOOKUP: &str = "getExposedApi";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelNamer {
	prefix: String,
	descriptor_channel: String,
}

impl ChannelNamer {
	pub fn new(prefix: impl Into<String>) -> Self {
		let prefix = prefix.into();
		let descriptor_channel = format!("{prefix}{SEPARATOR}{DESCRIPTOR_LOOKUP}");

		Self {
			prefix,
			descriptor_channel,
		}
	}

	#[must_use]
	pub fn from_config(config: &BridgeConfig) -> Self {
		Self::new(config.channel_prefix.clone())
	}

	#[must_use]
	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	#[must_use]
	pub fn member(&self, api_name: &str, path: &str) -> String {
		format!("{}{SEPARATOR}{api_name}{SEPARATOR}{path}", self.prefix)
	}

	#[must_use]
	pub fn descriptor(&self) -> &str {
		&self.descriptor_channel
	}
}

impl Default for ChannelNamer {
	fn default() -> Self {
		Self::from_config(&BridgeConfig::default())
	}
}
