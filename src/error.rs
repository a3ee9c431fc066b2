//! Error types for the navigation router.

/// Errors surfaced by the router's public API.
///
/// Failures of user callbacks inside a dispatch cycle are never returned through
/// this type; they are logged and the cycle continues.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpaError {
	/// A route was registered without a required callback.
	#[error("Invalid argument: {0}")]
	InvalidArgument(&'static str),

	/// The current location could not be read from the navigation surface.
	#[error("Failed to read current location: {0}")]
	Location(String),

	/// An href could not be parsed as an absolute URL.
	#[error("Failed to parse URL '{href}': {source}")]
	UrlParse {
		/// The rejected href.
		href: String,
		/// The underlying parse failure.
		#[source]
		source: url::ParseError,
	},

	/// The navigation surface rejected an operation.
	#[error("Navigation failed: {0}")]
	Navigation(String),

	/// Router configuration could not be loaded.
	#[error("Invalid router configuration: {0}")]
	Config(String),
}

impl SpaError {
	pub(crate) fn url_parse(href: &str, source: url::ParseError) -> Self {
		Self::UrlParse {
			href: href.to_string(),
			source,
		}
	}
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SpaError>;
