//! Dispatch Property Tests
//!
//! Property-based checks of change de-duplication and route ordering over
//! arbitrary navigation sequences.

use proptest::prelude::*;
use reinhardt_spa::{MemoryHistory, RouteOptions, Router};
use std::cell::RefCell;
use std::rc::Rc;
use url::Url;

const PATHS: [&str; 4] = ["/", "/a", "/b", "/c"];

fn navigation() -> impl Strategy<Value = Vec<usize>> {
	prop::collection::vec(0..PATHS.len(), 1..24)
}

proptest! {
	/// Routes activate exactly once per actual change of URL
	#[test]
	fn prop_dispatches_once_per_change(targets in navigation()) {
		let history = MemoryHistory::new("https://app.test/").unwrap();
		let router = Router::new(history.clone());
		let visited = Rc::new(RefCell::new(Vec::new()));
		router.register_route(
			|_: &Url, _: &str| true,
			{
				let visited = Rc::clone(&visited);
				move |url: &Url, _: &str| visited.borrow_mut().push(url.path().to_string())
			},
			RouteOptions::new(),
		);
		router.start();

		let mut expected = vec!["/".to_string()];
		for &target in &targets {
			let path = PATHS[target];
			if expected.last().map(String::as_str) != Some(path) {
				expected.push(path.to_string());
			}
			if target % 2 == 0 {
				history.push_state(path).unwrap();
			} else {
				history.replace_state(path).unwrap();
			}
		}
		router.stop();

		prop_assert_eq!(&*visited.borrow(), &expected);
	}

	/// Matching routes run in registration order up to the first matching `once` route
	#[test]
	fn prop_routes_follow_registration_order(
		routes in prop::collection::vec((any::<bool>(), any::<bool>()), 0..12),
	) {
		let history = MemoryHistory::new("https://app.test/").unwrap();
		let router = Router::new(history);
		let order = Rc::new(RefCell::new(Vec::new()));

		for (index, &(matches, once)) in routes.iter().enumerate() {
			let order = Rc::clone(&order);
			router.register_route(
				move |_: &Url, _: &str| matches,
				move |_: &Url, _: &str| order.borrow_mut().push(index),
				RouteOptions::new().with_once(once),
			);
		}

		let mut expected = Vec::new();
		for (index, &(matches, once)) in routes.iter().enumerate() {
			if matches {
				expected.push(index);
				if once {
					break;
				}
			}
		}

		let dispatch = router.run().unwrap();
		let summary = dispatch.summary().unwrap();
		prop_assert_eq!(&*order.borrow(), &expected);
		prop_assert_eq!(summary.matched, expected.len());
		prop_assert!(router.run().unwrap().is_unchanged());
	}
}
