//! Router configuration.
//!
//! [`RouterConfig`] can be built in code with the `with_*` setters or loaded from
//! JSON, e.g. an inline `<script type="application/json">` block rendered by the
//! server:
//!
//! ```
//! use reinhardt_spa::{FragmentPolicy, RouterConfig};
//!
//! let config = RouterConfig::from_json(r#"{ "fragment_changes": "ignore" }"#).unwrap();
//! assert_eq!(config.fragment_changes, FragmentPolicy::Ignore);
//! assert!(config.listen_hash_change);
//! ```

use crate::error::{Result, SpaError};
use crate::history::NativeEvent;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// How fragment-only URL changes (`/page#a` to `/page#b`) are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentPolicy {
	/// Any difference in the full href starts a new dispatch cycle.
	#[default]
	Dispatch,
	/// The fragment is excluded from change detection.
	Ignore,
}

/// Settings for a [`Router`](crate::Router).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
	/// Treatment of fragment-only changes.
	pub fragment_changes: FragmentPolicy,
	/// Whether the native `hashchange` event is observed.
	pub listen_hash_change: bool,
}

impl Default for RouterConfig {
	fn default() -> Self {
		Self {
			fragment_changes: FragmentPolicy::Dispatch,
			listen_hash_change: true,
		}
	}
}

impl RouterConfig {
	/// Creates the default configuration.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the fragment policy.
	pub fn with_fragment_changes(mut self, policy: FragmentPolicy) -> Self {
		self.fragment_changes = policy;
		self
	}

	/// Sets whether `hashchange` is observed.
	pub fn with_hash_change_listener(mut self, enabled: bool) -> Self {
		self.listen_hash_change = enabled;
		self
	}

	/// Parses a configuration from JSON. Missing fields take their defaults.
	///
	/// # Errors
	///
	/// Returns [`SpaError::Config`] for malformed JSON or unknown enum values.
	pub fn from_json(json: &str) -> Result<Self> {
		serde_json::from_str(json).map_err(|e| SpaError::Config(e.to_string()))
	}

	/// The key compared against the last seen location to decide whether a
	/// notification is an actual change.
	pub fn change_key<'a>(&self, href: &'a str) -> Cow<'a, str> {
		match self.fragment_changes {
			FragmentPolicy::Dispatch => Cow::Borrowed(href),
			FragmentPolicy::Ignore => match href.split_once('#') {
				Some((before, _)) => Cow::Borrowed(before),
				None => Cow::Borrowed(href),
			},
		}
	}

	/// Native events the change detector subscribes to.
	pub(crate) fn native_events(&self) -> Vec<NativeEvent> {
		let mut events = vec![NativeEvent::PopState];
		if self.listen_hash_change {
			events.push(NativeEvent::HashChange);
		}
		events
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_default_config() {
		let config = RouterConfig::default();
		assert_eq!(config.fragment_changes, FragmentPolicy::Dispatch);
		assert!(config.listen_hash_change);
	}

	#[rstest]
	#[case(FragmentPolicy::Dispatch, "https://a.test/p#x", "https://a.test/p#x")]
	#[case(FragmentPolicy::Dispatch, "https://a.test/p", "https://a.test/p")]
	#[case(FragmentPolicy::Ignore, "https://a.test/p#x", "https://a.test/p")]
	#[case(FragmentPolicy::Ignore, "https://a.test/p?q=1#", "https://a.test/p?q=1")]
	#[case(FragmentPolicy::Ignore, "https://a.test/p", "https://a.test/p")]
	fn test_change_key(#[case] policy: FragmentPolicy, #[case] href: &str, #[case] expected: &str) {
		let config = RouterConfig::new().with_fragment_changes(policy);
		assert_eq!(config.change_key(href), expected);
	}

	#[rstest]
	fn test_from_json_partial() {
		let config = RouterConfig::from_json(r#"{"listen_hash_change": false}"#).unwrap();
		assert_eq!(config.fragment_changes, FragmentPolicy::Dispatch);
		assert!(!config.listen_hash_change);
	}

	#[rstest]
	fn test_from_json_empty_object() {
		assert_eq!(RouterConfig::from_json("{}").unwrap(), RouterConfig::default());
	}

	#[rstest]
	#[case("not json")]
	#[case(r#"{"fragment_changes": "sometimes"}"#)]
	fn test_from_json_rejects_invalid(#[case] json: &str) {
		assert!(matches!(RouterConfig::from_json(json), Err(SpaError::Config(_))));
	}

	#[rstest]
	fn test_native_events() {
		assert_eq!(
			RouterConfig::default().native_events(),
			vec![NativeEvent::PopState, NativeEvent::HashChange]
		);
		assert_eq!(
			RouterConfig::new()
				.with_hash_change_listener(false)
				.native_events(),
			vec![NativeEvent::PopState]
		);
	}

	#[rstest]
	fn test_config_round_trips_through_json() {
		let config = RouterConfig::new().with_fragment_changes(FragmentPolicy::Ignore);
		let json = serde_json::to_string(&config).unwrap();
		assert_eq!(RouterConfig::from_json(&json).unwrap(), config);
	}
}
