//! The router controller and its dispatch loop.
//!
//! A [`Router`] binds together the [`HistoryInterceptor`], the
//! [`ChangeNotifier`], the [`RouteRegistry`] and the [`CleanupTracker`]. While
//! started, every navigation signal runs one dispatch cycle:
//!
//! 1. read the current href and return early if it equals the last one seen
//! 2. record it as last seen
//! 3. flush the cleanups produced by the previous cycle
//! 4. evaluate routes in registration order and activate the matches
//!
//! ```
//! use reinhardt_spa::{MemoryHistory, RouteOptions, Router};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let history = MemoryHistory::new("https://app.test/").unwrap();
//! let router = Router::new(history.clone());
//!
//! let visits = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&visits);
//! router.register_route(
//! 	|url, _| url.path() == "/inbox",
//! 	move |_, _| counter.set(counter.get() + 1),
//! 	RouteOptions::new(),
//! );
//!
//! router.start();
//! history.push_state("/inbox").unwrap();
//! assert_eq!(visits.get(), 1);
//! router.stop();
//! ```

use crate::cleanup::CleanupTracker;
use crate::config::RouterConfig;
use crate::error::{Result, SpaError};
use crate::history::{HistoryInterceptor, NavigationPrimitives};
use crate::logging::{CallbackKind, debug_log, error_log, isolate, report};
use crate::notifier::{ChangeNotifier, Subscription};
use crate::route::{IntoActivation, Route, RouteBuilder, RouteHandle, RouteOptions, RouteRegistry};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use url::Url;

/// Outcome of one [`Router::run`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
	/// The href matched the last one seen; nothing ran.
	Unchanged,
	/// A full cycle ran.
	Completed(DispatchSummary),
}

impl Dispatch {
	/// Returns `true` for [`Dispatch::Unchanged`].
	pub fn is_unchanged(&self) -> bool {
		matches!(self, Self::Unchanged)
	}

	/// The cycle summary, if a cycle ran.
	pub fn summary(&self) -> Option<&DispatchSummary> {
		match self {
			Self::Completed(summary) => Some(summary),
			Self::Unchanged => None,
		}
	}
}

/// What a completed dispatch cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
	/// The href the cycle ran against.
	pub href: String,
	/// Number of predicates evaluated.
	pub evaluated: usize,
	/// Number of routes whose predicate matched.
	pub matched: usize,
	/// `true` if a matching `once` route ended the cycle early.
	pub short_circuited: bool,
}

#[derive(Debug, Default)]
struct RunState {
	started: bool,
	// Nesting depth of cycles currently evaluating routes.
	dispatching: usize,
	last_seen: Option<String>,
}

/// Marks a cycle as in progress until dropped.
struct DispatchGuard<'a> {
	state: &'a RefCell<RunState>,
}

impl<'a> DispatchGuard<'a> {
	fn enter(state: &'a RefCell<RunState>) -> Self {
		state.borrow_mut().dispatching += 1;
		Self { state }
	}
}

impl Drop for DispatchGuard<'_> {
	fn drop(&mut self) {
		self.state.borrow_mut().dispatching -= 1;
	}
}

struct RouterInner<P: NavigationPrimitives> {
	config: RouterConfig,
	interceptor: HistoryInterceptor<P>,
	routes: RouteRegistry,
	notifier: ChangeNotifier,
	cleanups: CleanupTracker,
	state: RefCell<RunState>,
}

/// Client-side navigation router.
///
/// Cloning yields another handle to the same router.
pub struct Router<P: NavigationPrimitives> {
	inner: Rc<RouterInner<P>>,
}

impl<P: NavigationPrimitives> Clone for Router<P> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<P: NavigationPrimitives> fmt::Debug for Router<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.inner.state.borrow();
		f.debug_struct("Router")
			.field("started", &state.started)
			.field("last_seen", &state.last_seen)
			.field("routes", &self.inner.routes.len())
			.field("pending_cleanups", &self.inner.cleanups.len())
			.field("config", &self.inner.config)
			.finish()
	}
}

impl<P: NavigationPrimitives + 'static> Router<P> {
	/// Creates a stopped router over `primitives` with the default configuration.
	pub fn new(primitives: P) -> Self {
		Self::with_config(primitives, RouterConfig::default())
	}

	/// Creates a stopped router with an explicit configuration.
	pub fn with_config(primitives: P, config: RouterConfig) -> Self {
		Self {
			inner: Rc::new(RouterInner {
				config,
				interceptor: HistoryInterceptor::new(primitives),
				routes: RouteRegistry::new(),
				notifier: ChangeNotifier::new(),
				cleanups: CleanupTracker::new(),
				state: RefCell::new(RunState::default()),
			}),
		}
	}

	/// Registers a route at the end of the evaluation order.
	///
	/// If the router is started, the current URL is dispatched again right away
	/// so the new route takes effect without waiting for a navigation. A route
	/// registered from inside a dispatch cycle (e.g. by a handler) is first
	/// evaluated on the next change.
	pub fn register_route<F, H, R>(
		&self,
		predicate: F,
		handler: H,
		options: RouteOptions,
	) -> RouteHandle
	where
		F: Fn(&Url, &str) -> bool + 'static,
		H: Fn(&Url, &str) -> R + 'static,
		R: IntoActivation,
	{
		self.insert(Route::new(predicate, handler).with_options(options))
	}

	/// Registers a route assembled with [`Route::builder`].
	///
	/// # Errors
	///
	/// Returns [`SpaError::InvalidArgument`] if the predicate or handler is missing.
	pub fn register(&self, builder: RouteBuilder) -> Result<RouteHandle> {
		let route = builder.build()?;
		Ok(self.insert(route))
	}

	fn insert(&self, route: Route) -> RouteHandle {
		let handle = self.inner.routes.add(route);
		let rerun = {
			let mut state = self.inner.state.borrow_mut();
			// Inside a cycle the route waits for the next navigation.
			let rerun = state.started && state.dispatching == 0;
			if rerun {
				state.last_seen = None;
			}
			rerun
		};
		if rerun {
			self.inner.run_logged();
		}
		handle
	}

	/// Subscribes to every navigation signal, independently of routing.
	pub fn on_url_change<F>(&self, listener: F) -> Subscription
	where
		F: Fn() + 'static,
	{
		self.inner.notifier.subscribe(listener)
	}

	/// Starts intercepting navigation and dispatches the current URL.
	/// Calling it again while started does nothing.
	pub fn start(&self) {
		{
			let mut state = self.inner.state.borrow_mut();
			if state.started {
				return;
			}
			state.started = true;
		}

		let inner = &self.inner;
		inner
			.interceptor
			.enable(inner.notifier.emitter(), &inner.config.native_events());

		let weak: Weak<RouterInner<P>> = Rc::downgrade(inner);
		inner.notifier.subscribe(move || {
			if let Some(inner) = weak.upgrade() {
				inner.run_logged();
			}
		});

		debug_log!("router started with {} route(s)", inner.routes.len());
		inner.run_logged();
	}

	/// Stops routing: drops all change subscriptions, runs pending cleanups and
	/// restores the navigation surface. Registered routes are kept.
	/// Calling it while stopped does nothing.
	pub fn stop(&self) {
		{
			let mut state = self.inner.state.borrow_mut();
			if !state.started {
				return;
			}
			state.started = false;
		}

		self.inner.notifier.clear();
		self.inner.cleanups.flush();
		self.inner.interceptor.disable();
		self.inner.state.borrow_mut().last_seen = None;
		debug_log!("router stopped");
	}

	/// Runs one dispatch cycle against the current URL.
	///
	/// # Errors
	///
	/// Returns [`SpaError::Location`] if the href cannot be read and
	/// [`SpaError::UrlParse`] if it is not an absolute URL. Callback failures are
	/// logged, never returned.
	pub fn run(&self) -> Result<Dispatch> {
		self.inner.run()
	}

	/// Returns `true` between [`start`](Self::start) and [`stop`](Self::stop).
	pub fn is_started(&self) -> bool {
		self.inner.state.borrow().started
	}

	/// Number of registered routes.
	pub fn route_count(&self) -> usize {
		self.inner.routes.len()
	}

	/// The change key recorded by the last completed cycle.
	///
	/// This is the full href unless fragments are ignored by the configuration.
	pub fn last_seen_href(&self) -> Option<String> {
		self.inner.state.borrow().last_seen.clone()
	}

	/// The router configuration.
	pub fn config(&self) -> &RouterConfig {
		&self.inner.config
	}

	/// The navigation surface the router observes.
	pub fn primitives(&self) -> &P {
		self.inner.interceptor.primitives()
	}
}

impl<P: NavigationPrimitives> RouterInner<P> {
	fn run(&self) -> Result<Dispatch> {
		let href = self.interceptor.primitives().current_href()?;

		{
			let key = self.config.change_key(&href);
			let mut state = self.state.borrow_mut();
			if state.last_seen.as_deref() == Some(key.as_ref()) {
				return Ok(Dispatch::Unchanged);
			}
			state.last_seen = Some(key.into_owned());
		}
		let _guard = DispatchGuard::enter(&self.state);

		self.cleanups.flush();

		let url = Url::parse(&href).map_err(|source| SpaError::url_parse(&href, source))?;

		let mut summary = DispatchSummary {
			href,
			evaluated: 0,
			matched: 0,
			short_circuited: false,
		};

		for route in self.routes.snapshot() {
			summary.evaluated += 1;
			let href = summary.href.as_str();
			let matched = isolate(CallbackKind::Predicate, Some(href), || route.matches(&url, href))
				.unwrap_or(false);
			if !matched {
				continue;
			}
			summary.matched += 1;

			match isolate(CallbackKind::Handler, Some(href), || route.activate(&url, href)) {
				Some(Ok(activation)) => {
					if let Some(cleanup) = activation.into_cleanup() {
						self.cleanups.register(cleanup);
					}
					if let Some(cleanup) = route.cleanup().cloned() {
						self.cleanups.register(cleanup);
					}
				}
				Some(Err(message)) => report(CallbackKind::Handler, Some(href), &message),
				None => {}
			}

			if route.is_once() {
				summary.short_circuited = true;
				break;
			}
		}

		debug_log!(
			"dispatched {}: {} evaluated, {} matched",
			summary.href,
			summary.evaluated,
			summary.matched
		);
		Ok(Dispatch::Completed(summary))
	}

	fn run_logged(&self) {
		if let Err(err) = self.run() {
			error_log!("dispatch failed: {}", err);
		}
	}
}

#[cfg(target_arch = "wasm32")]
impl Router<crate::history::BrowserHistory> {
	/// Creates a stopped router over the current window's history.
	///
	/// # Errors
	///
	/// Returns [`SpaError::Navigation`] outside a browsing context.
	pub fn browser() -> Result<Self> {
		Self::browser_with_config(RouterConfig::default())
	}

	/// Creates a stopped router over the current window's history with an
	/// explicit configuration.
	///
	/// # Errors
	///
	/// Returns [`SpaError::Navigation`] outside a browsing context.
	pub fn browser_with_config(config: RouterConfig) -> Result<Self> {
		Ok(Self::with_config(crate::history::BrowserHistory::new()?, config))
	}
}
