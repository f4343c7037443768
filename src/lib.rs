//! # vrouter
//!
//! **vrouter** is an in-memory router for component-based UIs. It matches a
//! path against a registered route tree and resolves the nested chain of
//! components to render, without touching browser history or the URL bar.
//! One application can host many independent router instances, each
//! addressed by a string key (master/detail shells, widgets with their own
//! navigation, and so on).
//!
//! ## Architecture
//!
//! - **[`route`]** - route tree input (`RouteNode`) and route identity (`RouteId`)
//! - **[`registry`]** - flattens a route tree into a registry and a matcher
//! - **[`matcher`]** - radix-tree path matching with `:param`, `*` and `**` segments
//! - **[`render`]** - root-to-leaf render lists, memoised per route
//! - **[`reactive`]** - the observable cell and derived value routers are built on
//! - **[`router`]** - router instances and route snapshots
//! - **[`directory`]** - keyed instance table, consumer scopes and reference counting
//! - **[`component`]** - opaque component references, eager or lazy
//! - **[`config`]** - router configuration files and runtime switches
//! - **[`telemetry`]** - logging setup
//! - **[`cli`]** - the `vrouter` command line
//!
//! ### Resolution Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Consumer
//!     participant Scope
//!     participant Directory
//!     participant Router as RouterInstance
//!     participant Matcher as RadixMatcher
//!     participant Cache as RenderListCache
//!
//!     Consumer->>Scope: acquire_named("main", routes, options)
//!     Scope->>Directory: acquire (create or attach)
//!     Directory-->>Scope: Arc<RouterInstance>, ref_count + 1
//!     Scope-->>Consumer: RouterHandle { route, router }
//!     Consumer->>Router: replace("/bar/qux")
//!     Router->>Matcher: find("/bar/qux")
//!     Matcher-->>Router: MatchedRouteData + params
//!     Router->>Cache: resolve(matched)
//!     Cache-->>Router: [Bar, Qux]
//!     Consumer->>Scope: dispose()
//!     Scope->>Directory: release("main")
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use vrouter::component::ComponentRef;
//! use vrouter::directory::{Directory, Scope};
//! use vrouter::route::RouteNode;
//! use vrouter::router::RouterOptions;
//!
//! let routes = vec![
//!     RouteNode::new("/foo", ComponentRef::named("Foo")),
//!     RouteNode::new("/bar", ComponentRef::named("Bar"))
//!         .child(RouteNode::new("", ComponentRef::named("Baz")))
//!         .child(RouteNode::new("qux", ComponentRef::named("Qux"))),
//! ];
//!
//! let directory = Arc::new(Directory::new());
//! let app = Scope::root(Arc::clone(&directory));
//! let shell = app.child();
//!
//! let handle = shell
//!     .acquire_named("main", &routes, RouterOptions::default().with_initial_path("/foo"))
//!     .unwrap();
//! assert_eq!(handle.current().component_names(), vec!["Foo"]);
//!
//! handle.router.replace("/bar").unwrap();
//! assert_eq!(handle.current().component_names(), vec!["Bar", "Baz"]);
//!
//! // A nested consumer finds the same router without naming it.
//! let slot = shell.child().attach_contextual().unwrap();
//! assert_eq!(slot.router.key(), "main");
//!
//! shell.dispose();
//! assert!(!directory.contains("main"));
//! ```
//!
//! ## Errors
//!
//! Misuse is reported synchronously through [`RouterError`]. A path that
//! matches nothing is not an error: the snapshot simply has an empty render
//! list.

pub mod cli;
pub mod component;
pub mod config;
pub mod directory;
pub mod error;
pub mod matcher;
pub mod reactive;
pub mod registry;
pub mod render;
pub mod route;
pub mod router;
pub mod telemetry;

pub use component::{ComponentRef, ComponentTable};
pub use config::{load_routers_config, RoutersConfig, RuntimeConfig};
pub use directory::{Directory, RouterHandle, Scope};
pub use error::{Result, RouterError};
pub use route::{RouteId, RouteNode};
pub use router::{RouteSnapshot, RouterInstance, RouterOptions};
