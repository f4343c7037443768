//! # Router Module
//!
//! A [`RouterInstance`] is one independent virtual router: it owns a route
//! registry, a [`PathMatcher`](crate::matcher::PathMatcher), a render-list
//! cache, and a reactive pair made of the active path and the derived
//! [`RouteSnapshot`].
//!
//! ## Data flow
//!
//! ```text
//! replace("/bar?x=1") ─► active_path (Signal<String>)
//!                              │  push
//!                              ▼
//!                    route (Derived<RouteSnapshot>)
//!                      split_url ─► matcher.find(path)
//!                                       │
//!                                       ▼
//!                              RenderListCache::resolve
//! ```
//!
//! The snapshot is recomputed synchronously inside `replace`, so a read
//! right after it observes the new route. Only the pathname takes part in
//! matching; `search` and `hash` are carried through untouched.
//!
//! ## Example
//!
//! ```rust
//! use vrouter::component::ComponentRef;
//! use vrouter::route::RouteNode;
//! use vrouter::router::{RouterInstance, RouterOptions};
//!
//! let routes = vec![
//!     RouteNode::new("/foo", ComponentRef::named("Foo")),
//!     RouteNode::new("/bar", ComponentRef::named("Bar"))
//!         .child(RouteNode::new("", ComponentRef::named("Baz"))),
//! ];
//! let router = RouterInstance::create("main", &routes, RouterOptions::default()).unwrap();
//!
//! router.replace("/bar?tab=1").unwrap();
//! let route = router.route();
//! assert_eq!(route.path, "/bar");
//! assert_eq!(route.component_names(), vec!["Bar", "Baz"]);
//! ```

mod instance;
mod snapshot;

pub use instance::{RouteTableEntry, RouterInstance, RouterOptions};
pub use snapshot::{split_url, RouteSnapshot};
