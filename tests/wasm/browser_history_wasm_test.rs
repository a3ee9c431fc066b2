//! Browser History WASM Tests
//!
//! Exercises interception of the real `window.history` object.
//!
//! **Run with**: `wasm-pack test --headless --chrome`

#![cfg(target_arch = "wasm32")]

use reinhardt_spa::{
	BrowserHistory, NavigationPrimitives, PrimitiveKind, RouteOptions, Router,
};
use std::cell::Cell;
use std::rc::Rc;
use url::Url;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn push(history: &BrowserHistory, url: &str) {
	history
		.history()
		.push_state_with_url(&JsValue::NULL, "", Some(url))
		.unwrap();
}

/// Test start patches pushState and stop restores the identical function
#[wasm_bindgen_test]
fn test_patch_restore_round_trip() {
	let history = BrowserHistory::new().unwrap();
	let push_before = history.primitive(PrimitiveKind::PushState).unwrap();
	let replace_before = history.primitive(PrimitiveKind::ReplaceState).unwrap();
	let router = Router::new(history.clone());

	router.start();
	let patched = history.primitive(PrimitiveKind::PushState).unwrap();
	assert!(!JsValue::from(patched).loose_eq(&JsValue::from(push_before.clone())));

	router.stop();
	let restored = history.primitive(PrimitiveKind::PushState).unwrap();
	assert!(JsValue::from(restored).loose_eq(&JsValue::from(push_before)));
	let restored = history.primitive(PrimitiveKind::ReplaceState).unwrap();
	assert!(JsValue::from(restored).loose_eq(&JsValue::from(replace_before)));
}

/// Test a pushState call dispatches matching routes synchronously
#[wasm_bindgen_test]
fn test_push_state_dispatches() {
	let history = BrowserHistory::new().unwrap();
	let router = Router::new(history.clone());
	let hits = Rc::new(Cell::new(0));
	let counter = Rc::clone(&hits);
	router.register_route(
		|url: &Url, _: &str| url.path() == "/spa-wasm-test",
		move |_: &Url, _: &str| counter.set(counter.get() + 1),
		RouteOptions::new(),
	);

	router.start();
	push(&history, "/spa-wasm-test");
	assert_eq!(hits.get(), 1);
	router.stop();

	push(&history, "/");
	push(&history, "/spa-wasm-test");
	assert_eq!(hits.get(), 1);
}

/// Test the current href comes from window.location
#[wasm_bindgen_test]
fn test_current_href_reads_location() {
	let history = BrowserHistory::new().unwrap();
	push(&history, "/spa-location?q=1");
	let href = history.current_href().unwrap();
	assert!(href.ends_with("/spa-location?q=1"));
}
