//! Route entries and the ordered route registry.
//!
//! A route pairs a caller-supplied predicate with a handler. Patterns are not
//! parsed here: the predicate receives the parsed [`Url`] and the raw href and
//! decides for itself.

use crate::cleanup::Cleanup;
use crate::error::{Result, SpaError};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use url::Url;

/// Route predicate: `(url, raw_href) -> matches`.
pub type Predicate = Rc<dyn Fn(&Url, &str) -> bool>;

type Handler = Rc<dyn Fn(&Url, &str) -> std::result::Result<Activation, String>>;

/// What a handler leaves behind after activating.
#[derive(Debug, Clone, Default)]
pub enum Activation {
	/// Nothing to tear down.
	#[default]
	Idle,
	/// Teardown to run when the activation ends.
	Cleanup(Cleanup),
}

impl Activation {
	/// Shorthand for `Activation::Cleanup(Cleanup::new(f))`.
	pub fn cleanup<F>(f: F) -> Self
	where
		F: Fn() + 'static,
	{
		Self::Cleanup(Cleanup::new(f))
	}

	/// Returns the cleanup, if any.
	pub fn into_cleanup(self) -> Option<Cleanup> {
		match self {
			Self::Idle => None,
			Self::Cleanup(cleanup) => Some(cleanup),
		}
	}
}

/// Conversion from a handler's return value into an [`Activation`].
///
/// Implemented for `()`, [`Activation`], [`Cleanup`], `Option<Cleanup>` and
/// `Result<T, E>` where `T: IntoActivation`. An `Err` is reported as a handler
/// failure: it is logged and no cleanup is registered for that activation.
pub trait IntoActivation {
	/// Converts the value, yielding the failure message for an error.
	fn into_activation(self) -> std::result::Result<Activation, String>;
}

impl IntoActivation for () {
	fn into_activation(self) -> std::result::Result<Activation, String> {
		Ok(Activation::Idle)
	}
}

impl IntoActivation for Activation {
	fn into_activation(self) -> std::result::Result<Activation, String> {
		Ok(self)
	}
}

impl IntoActivation for Cleanup {
	fn into_activation(self) -> std::result::Result<Activation, String> {
		Ok(Activation::Cleanup(self))
	}
}

impl IntoActivation for Option<Cleanup> {
	fn into_activation(self) -> std::result::Result<Activation, String> {
		Ok(self.map_or(Activation::Idle, Activation::Cleanup))
	}
}

impl<T, E> IntoActivation for std::result::Result<T, E>
where
	T: IntoActivation,
	E: fmt::Display,
{
	fn into_activation(self) -> std::result::Result<Activation, String> {
		match self {
			Ok(value) => value.into_activation(),
			Err(err) => Err(err.to_string()),
		}
	}
}

fn into_handler<H, R>(handler: H) -> Handler
where
	H: Fn(&Url, &str) -> R + 'static,
	R: IntoActivation,
{
	Rc::new(move |url, href| handler(url, href).into_activation())
}

/// Per-route options.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
	/// Explicit teardown registered every time the route activates, in addition
	/// to any cleanup the handler returns.
	pub cleanup: Option<Cleanup>,
	/// When the route matches, later routes are not evaluated in that cycle.
	pub once: bool,
}

impl RouteOptions {
	/// Options with no cleanup and `once == false`.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the explicit teardown.
	pub fn with_cleanup<F>(mut self, f: F) -> Self
	where
		F: Fn() + 'static,
	{
		self.cleanup = Some(Cleanup::new(f));
		self
	}

	/// Sets the explicit teardown from an existing [`Cleanup`].
	pub fn with_cleanup_action(mut self, cleanup: Cleanup) -> Self {
		self.cleanup = Some(cleanup);
		self
	}

	/// Sets the short-circuit flag.
	pub fn with_once(mut self, once: bool) -> Self {
		self.once = once;
		self
	}
}

/// A registered predicate/handler pair.
pub struct Route {
	predicate: Predicate,
	handler: Handler,
	cleanup: Option<Cleanup>,
	once: bool,
}

impl fmt::Debug for Route {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Route")
			.field("has_cleanup", &self.cleanup.is_some())
			.field("once", &self.once)
			.finish()
	}
}

impl Route {
	/// Creates a route with default options.
	pub fn new<F, H, R>(predicate: F, handler: H) -> Self
	where
		F: Fn(&Url, &str) -> bool + 'static,
		H: Fn(&Url, &str) -> R + 'static,
		R: IntoActivation,
	{
		Self {
			predicate: Rc::new(predicate),
			handler: into_handler(handler),
			cleanup: None,
			once: false,
		}
	}

	/// Starts a builder where predicate and handler are supplied separately.
	pub fn builder() -> RouteBuilder {
		RouteBuilder::default()
	}

	/// Applies options.
	pub fn with_options(mut self, options: RouteOptions) -> Self {
		self.cleanup = options.cleanup;
		self.once = options.once;
		self
	}

	/// Returns `true` if a match stops evaluation of later routes.
	pub fn is_once(&self) -> bool {
		self.once
	}

	/// The explicit teardown, if configured.
	pub fn cleanup(&self) -> Option<&Cleanup> {
		self.cleanup.as_ref()
	}

	/// Evaluates the predicate.
	pub fn matches(&self, url: &Url, href: &str) -> bool {
		(self.predicate)(url, href)
	}

	/// Runs the handler.
	///
	/// # Errors
	///
	/// Returns the failure message when the handler reported an error.
	pub fn activate(&self, url: &Url, href: &str) -> std::result::Result<Activation, String> {
		(self.handler)(url, href)
	}
}

/// Builder for [`Route`] that validates required callbacks at [`build`](Self::build).
#[derive(Default)]
pub struct RouteBuilder {
	predicate: Option<Predicate>,
	handler: Option<Handler>,
	options: RouteOptions,
}

impl fmt::Debug for RouteBuilder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteBuilder")
			.field("has_predicate", &self.predicate.is_some())
			.field("has_handler", &self.handler.is_some())
			.field("options", &self.options)
			.finish()
	}
}

impl RouteBuilder {
	/// Sets the predicate.
	pub fn predicate<F>(mut self, predicate: F) -> Self
	where
		F: Fn(&Url, &str) -> bool + 'static,
	{
		self.predicate = Some(Rc::new(predicate));
		self
	}

	/// Sets the handler.
	pub fn handler<H, R>(mut self, handler: H) -> Self
	where
		H: Fn(&Url, &str) -> R + 'static,
		R: IntoActivation,
	{
		self.handler = Some(into_handler(handler));
		self
	}

	/// Replaces the options.
	pub fn options(mut self, options: RouteOptions) -> Self {
		self.options = options;
		self
	}

	/// Sets the short-circuit flag.
	pub fn once(mut self, once: bool) -> Self {
		self.options.once = once;
		self
	}

	/// Sets the explicit teardown.
	pub fn cleanup<F>(mut self, f: F) -> Self
	where
		F: Fn() + 'static,
	{
		self.options.cleanup = Some(Cleanup::new(f));
		self
	}

	/// Builds the route.
	///
	/// # Errors
	///
	/// Returns [`SpaError::InvalidArgument`] if the predicate or handler is missing.
	pub fn build(self) -> Result<Route> {
		let predicate = self
			.predicate
			.ok_or(SpaError::InvalidArgument("predicate must be a function"))?;
		let handler = self
			.handler
			.ok_or(SpaError::InvalidArgument("handler must be a function"))?;
		Ok(Route {
			predicate,
			handler,
			cleanup: self.options.cleanup,
			once: self.options.once,
		})
	}
}

type Entries = Rc<RefCell<Vec<Rc<Route>>>>;

/// Ordered route storage. Entries are evaluated in registration order.
#[derive(Clone, Default)]
pub struct RouteRegistry {
	entries: Entries,
}

impl fmt::Debug for RouteRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteRegistry")
			.field("routes_count", &self.len())
			.finish()
	}
}

impl RouteRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a route.
	pub fn add(&self, route: Route) -> RouteHandle {
		let entry = Rc::new(route);
		self.entries.borrow_mut().push(Rc::clone(&entry));
		RouteHandle {
			entries: Rc::downgrade(&self.entries),
			entry,
		}
	}

	/// The current entries, in order. Changes made after the call do not affect
	/// the returned list.
	pub fn snapshot(&self) -> Vec<Rc<Route>> {
		self.entries.borrow().clone()
	}

	/// Number of registered routes.
	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	/// Returns `true` if no route is registered.
	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}
}

/// Handle returned when a route is registered.
pub struct RouteHandle {
	entries: Weak<RefCell<Vec<Rc<Route>>>>,
	entry: Rc<Route>,
}

impl fmt::Debug for RouteHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteHandle")
			.field("route", &self.entry)
			.field("registered", &self.is_registered())
			.finish()
	}
}

impl RouteHandle {
	/// Removes this route from the registry. Returns `false` if it was not present.
	///
	/// A dispatch cycle already in progress keeps evaluating its own snapshot.
	pub fn unregister(&self) -> bool {
		let Some(entries) = self.entries.upgrade() else {
			return false;
		};
		let mut entries = entries.borrow_mut();
		match entries.iter().position(|e| Rc::ptr_eq(e, &self.entry)) {
			Some(index) => {
				entries.remove(index);
				true
			}
			None => false,
		}
	}

	/// Returns `true` while the route is registered.
	pub fn is_registered(&self) -> bool {
		let Some(entries) = self.entries.upgrade() else {
			return false;
		};
		let registered = entries.borrow().iter().any(|e| Rc::ptr_eq(e, &self.entry));
		registered
	}

	/// The registered route.
	pub fn route(&self) -> &Route {
		&self.entry
	}
}
