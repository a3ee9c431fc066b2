//! # Reinhardt SPA
//!
//! Minimal client-side navigation router for single-page applications.
//!
//! The router observes every way the URL of a page can change (programmatic
//! `pushState`/`replaceState`, back/forward traversal and fragment changes),
//! funnels them into one change notification, and on each change runs the
//! registered routes against the new URL. Routes are predicate/handler pairs;
//! a handler may hand back a cleanup that runs before the next dispatch.
//!
//! ## Quick Start
//!
//! ```
//! use reinhardt_spa::{Activation, MemoryHistory, RouteOptions, Router};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let history = MemoryHistory::new("https://app.test/").unwrap();
//! let router = Router::new(history.clone());
//!
//! let teardowns = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&teardowns);
//! let _handle = router.register_route(
//! 	|url, _href| url.path().starts_with("/docs/"),
//! 	move |_url, _href| {
//! 		let counter = Rc::clone(&counter);
//! 		Activation::cleanup(move || counter.set(counter.get() + 1))
//! 	},
//! 	RouteOptions::new(),
//! );
//!
//! router.start();
//! history.push_state("/docs/intro").unwrap();
//! history.push_state("/about").unwrap();
//! assert_eq!(teardowns.get(), 1);
//! router.stop();
//! ```
//!
//! In the browser, build the router with `Router::browser()` (wasm32 only);
//! it patches `window.history` while started and restores it on
//! [`Router::stop`].
//!
//! ## Feature Flags
//!
//! - `debug-hooks` - debug-level tracing of dispatch cycles (debug builds only)

#![warn(missing_docs)]

pub mod cleanup;
pub mod config;
pub mod error;
pub mod history;
mod logging;
pub mod notifier;
pub mod route;
pub mod router;

pub use cleanup::{Cleanup, CleanupTracker};
pub use config::{FragmentPolicy, RouterConfig};
pub use error::{Result, SpaError};
#[cfg(target_arch = "wasm32")]
pub use history::BrowserHistory;
pub use history::{
	HistoryInterceptor, MemoryHistory, NativeEvent, NavigationPrimitives, Notify, PrimitiveKind,
};
pub use notifier::{ChangeNotifier, Listener, Subscription};
pub use route::{Activation, IntoActivation, Route, RouteBuilder, RouteHandle, RouteOptions};
pub use router::{Dispatch, DispatchSummary, Router};
