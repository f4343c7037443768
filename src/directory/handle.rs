use std::sync::Arc;

use crate::error::Result;
use crate::reactive::{Derived, SubscriptionId};
use crate::route::{RouteId, RouteNode};
use crate::router::{RouteSnapshot, RouterInstance};

/// What a consumer gets back from [`Scope::acquire_named`](super::Scope::acquire_named):
/// a live view of the current route and a control handle.
#[derive(Clone)]
pub struct RouterHandle {
    pub route: RouteView,
    pub router: RouterControl,
}

impl RouterHandle {
    pub(crate) fn new(key: Arc<str>, instance: Arc<RouterInstance>) -> Self {
        Self {
            route: RouteView {
                route: instance.route_signal(),
            },
            router: RouterControl { key, instance },
        }
    }

    /// Shortcut for `self.route.get()`.
    #[must_use]
    pub fn current(&self) -> Arc<RouteSnapshot> {
        self.route.get()
    }
}

/// Read-only live view of a router's current route.
#[derive(Clone)]
pub struct RouteView {
    route: Derived<RouteSnapshot>,
}

impl RouteView {
    #[must_use]
    pub fn get(&self) -> Arc<RouteSnapshot> {
        self.route.get()
    }

    /// Called with every new snapshot.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Arc<RouteSnapshot>) + Send + Sync + 'static,
    {
        self.route.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.route.unsubscribe(id)
    }
}

/// Control surface a consumer uses to drive its router.
#[derive(Clone)]
pub struct RouterControl {
    key: Arc<str>,
    instance: Arc<RouterInstance>,
}

impl RouterControl {
    /// Key of the router this handle controls.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn replace(&self, path: impl Into<String>) -> Result<()> {
        self.instance.replace(path)
    }

    pub fn add_route(&self, node: RouteNode) -> Result<Vec<RouteId>> {
        self.instance.add_route(node)
    }

    pub fn add_child_route(&self, parent: &RouteId, node: RouteNode) -> Result<Vec<RouteId>> {
        self.instance.add_child_route(parent, node)
    }

    /// The underlying instance.
    #[must_use]
    pub fn instance(&self) -> &Arc<RouterInstance> {
        &self.instance
    }
}

impl std::fmt::Debug for RouterControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterControl").field("key", &self.key).finish()
    }
}

impl std::fmt::Debug for RouteView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteView").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for RouterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterHandle")
            .field("route", &self.route)
            .field("router", &self.router)
            .finish()
    }
}
