use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::snapshot::{split_url, RouteSnapshot};
use crate::config::RuntimeConfig;
use crate::error::{Result, RouterError};
use crate::matcher::{PathMatcher, RadixMatcher};
use crate::reactive::{Derived, Signal};
use crate::registry::{register_routes, RouteRegistry};
use crate::render::{CacheStats, RenderListCache};
use crate::route::{RouteId, RouteNode};

/// Options accepted when a router instance is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterOptions {
    /// Active path right after creation.
    #[serde(alias = "initialPath")]
    pub initial_path: String,
    /// Global instances stay in the directory after their last consumer leaves.
    #[serde(alias = "isGlobal")]
    pub is_global: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            initial_path: "/".to_string(),
            is_global: false,
        }
    }
}

impl RouterOptions {
    #[must_use]
    pub fn with_initial_path(mut self, path: impl Into<String>) -> Self {
        self.initial_path = path.into();
        self
    }

    #[must_use]
    pub fn global(mut self) -> Self {
        self.is_global = true;
        self
    }
}

/// One row of [`RouterInstance::route_table`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTableEntry {
    pub full_path: String,
    pub depth: usize,
    pub component: String,
    pub parent: Option<String>,
    /// Whether requesting `full_path` resolves to this very route. Parents
    /// shadowed by a default child are not addressable.
    pub addressable: bool,
}

/// Routing state shared between the instance and its derived snapshot.
struct RouterState {
    matcher: RwLock<Box<dyn PathMatcher>>,
    registry: RwLock<RouteRegistry>,
    cache: RenderListCache,
}

impl RouterState {
    fn snapshot(&self, active_path: &str) -> RouteSnapshot {
        let (path, search, hash) = split_url(active_path);
        // Lock order: matcher, then registry.
        let matcher = self.matcher.read().expect("router matcher lock poisoned");
        let registry = self.registry.read().expect("router registry lock poisoned");

        let found = matcher.find(&path);
        let render_list = self
            .cache
            .resolve(found.as_ref().map(|m| &*m.data), &registry);

        let (matched, meta, params) = match found {
            Some(found) => (Some(found.data.id.clone()), found.data.meta.clone(), found.params),
            None => {
                debug!(path = %path, "No route matched");
                (None, None, None)
            }
        };

        RouteSnapshot {
            full_path: active_path.to_string(),
            path: path.into_owned(),
            search: search.to_string(),
            hash: hash.to_string(),
            meta,
            params,
            matched,
            render_list,
        }
    }
}

/// One independent virtual router.
///
/// Owns a route registry, a path matcher, the render-list cache and the
/// reactive pair `active_path` / `route`. Changing the active path with
/// [`replace`](Self::replace) recomputes the snapshot synchronously, so the
/// next [`route`](Self::route) read already reflects it.
///
/// The instance also carries the reference count the
/// [`Directory`](crate::directory::Directory) uses to decide when to dispose
/// it.
pub struct RouterInstance {
    key: Arc<str>,
    state: Arc<RouterState>,
    active_path: Signal<String>,
    route: Derived<RouteSnapshot>,
    is_global: bool,
    ref_count: AtomicUsize,
    disposed: AtomicBool,
}

impl RouterInstance {
    /// Create an instance with the default runtime configuration.
    pub fn create(key: &str, routes: &[RouteNode], options: RouterOptions) -> Result<Self> {
        Self::create_with_runtime(key, routes, options, &RuntimeConfig::default())
    }

    /// Create an instance, registering `routes` into a fresh [`RadixMatcher`].
    pub fn create_with_runtime(
        key: &str,
        routes: &[RouteNode],
        options: RouterOptions,
        runtime: &RuntimeConfig,
    ) -> Result<Self> {
        Self::create_with_matcher(key, routes, options, runtime, Box::new(RadixMatcher::new()))
    }

    /// Create an instance on top of a custom matcher.
    pub fn create_with_matcher(
        key: &str,
        routes: &[RouteNode],
        options: RouterOptions,
        runtime: &RuntimeConfig,
        mut matcher: Box<dyn PathMatcher>,
    ) -> Result<Self> {
        let mut registry = RouteRegistry::new();
        register_routes(&mut *matcher, &mut registry, routes, None)?;

        let state = Arc::new(RouterState {
            matcher: RwLock::new(matcher),
            registry: RwLock::new(registry),
            cache: RenderListCache::new(runtime.render_cache),
        });

        let active_path = Signal::new(options.initial_path.clone());
        let snapshot_state = Arc::clone(&state);
        let route = Derived::new(&active_path, move |path: &String| snapshot_state.snapshot(path));

        info!(
            key = %key,
            routes_count = state.registry.read().expect("router registry lock poisoned").len(),
            initial_path = %options.initial_path,
            is_global = options.is_global,
            render_cache = runtime.render_cache,
            "Router instance created"
        );

        Ok(Self {
            key: Arc::from(key),
            state,
            active_path,
            route,
            is_global: options.is_global,
            ref_count: AtomicUsize::new(0),
            disposed: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current route snapshot.
    #[must_use]
    pub fn route(&self) -> Arc<RouteSnapshot> {
        self.route.get()
    }

    /// The derived snapshot itself, for observers.
    #[must_use]
    pub fn route_signal(&self) -> Derived<RouteSnapshot> {
        self.route.clone()
    }

    #[must_use]
    pub fn active_path(&self) -> String {
        self.active_path.get()
    }

    /// Set the active path. The snapshot is recomputed before this returns.
    pub fn replace(&self, path: impl Into<String>) -> Result<()> {
        self.ensure_live()?;
        let path = path.into();
        if self.active_path.set(path.clone()) {
            debug!(key = %self.key, path = %path, "Active path replaced");
        }
        Ok(())
    }

    /// Register `node` (and its subtree) at the top level.
    pub fn add_route(&self, node: RouteNode) -> Result<Vec<RouteId>> {
        self.add_routes(std::slice::from_ref(&node), None)
    }

    /// Register `node` (and its subtree) below an existing route.
    pub fn add_child_route(&self, parent: &RouteId, node: RouteNode) -> Result<Vec<RouteId>> {
        self.add_routes(std::slice::from_ref(&node), Some(parent))
    }

    fn add_routes(&self, routes: &[RouteNode], parent: Option<&RouteId>) -> Result<Vec<RouteId>> {
        self.ensure_live()?;
        let inserted = {
            let mut matcher = self.state.matcher.write().expect("router matcher lock poisoned");
            let mut registry = self.state.registry.write().expect("router registry lock poisoned");
            register_routes(&mut **matcher, &mut registry, routes, parent)?
        };

        // Only the top of the new subtree can change what an existing path
        // resolves to, and every affected id lies below it.
        if let Some(root) = inserted.first() {
            self.state.cache.invalidate_within(root.full_path());
        }
        self.route.refresh();

        debug!(key = %self.key, added = inserted.len(), "Routes added to live router");
        Ok(inserted)
    }

    /// Every registered route, ordered by full path then depth.
    #[must_use]
    pub fn route_table(&self) -> Vec<RouteTableEntry> {
        let matcher = self.state.matcher.read().expect("router matcher lock poisoned");
        let registry = self.state.registry.read().expect("router registry lock poisoned");

        registry
            .sorted_ids()
            .into_iter()
            .filter_map(|id| {
                let route = registry.get(&id)?;
                let addressable = matcher
                    .find(id.full_path())
                    .is_some_and(|found| found.data.id == id);
                Some(RouteTableEntry {
                    full_path: id.full_path().to_string(),
                    depth: id.depth(),
                    component: route.component.name().to_string(),
                    parent: route.parent_id.as_ref().map(ToString::to_string),
                    addressable,
                })
            })
            .collect()
    }

    /// Number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.state.registry.read().expect("router registry lock poisoned").len()
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.state.cache.stats()
    }

    #[must_use]
    pub fn is_global(&self) -> bool {
        self.is_global
    }

    #[must_use]
    pub fn ref_count(&self) -> usize {
        self.ref_count.load(Ordering::Acquire)
    }

    /// Register one more consumer. Returns the new count.
    pub fn attach(&self) -> usize {
        let count = self.ref_count.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(key = %self.key, ref_count = count, "Router consumer attached");
        count
    }

    /// Drop one consumer. Returns the remaining count, never below zero.
    pub fn detach(&self) -> usize {
        let previous = self
            .ref_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| Some(n.saturating_sub(1)))
            .unwrap_or_default();
        let count = previous.saturating_sub(1);
        debug!(key = %self.key, ref_count = count, "Router consumer detached");
        count
    }

    /// Tear down the derived snapshot and drop cached render lists.
    ///
    /// The last snapshot stays readable; `replace` and `add_route` fail with
    /// [`RouterError::Disposed`] afterwards.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.route.dispose();
        self.state.cache.clear();
        info!(key = %self.key, "Router instance disposed");
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(RouterError::Disposed {
                key: self.key.to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for RouterInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterInstance")
            .field("key", &self.key)
            .field("active_path", &self.active_path.get())
            .field("is_global", &self.is_global)
            .field("ref_count", &self.ref_count())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
