//! # CLI Module
//!
//! Command-line access to router configuration files, mostly useful to check
//! what a configuration registers and how a path resolves without starting
//! the host application.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Print every registered route of every configured router:
//!
//! ```bash
//! vrouter routes --config routers.yaml
//! vrouter routes --config routers.yaml --router main --json
//! ```
//!
//! Parents shadowed by a default child are listed as `shadowed`; requesting
//! their path resolves to the default child instead.
//!
//! ### `resolve`
//!
//! Resolve a path against one router and print the route snapshot as JSON:
//!
//! ```bash
//! vrouter resolve --config routers.yaml --router main --path '/bar?x=1#top'
//! ```
//!
//! Components are referenced by name only; the CLI has nothing to render, so
//! every name used in the file is accepted.

mod commands;


pub use commands::{resolve_report, routes_report, run, run_cli, Cli, Commands};
