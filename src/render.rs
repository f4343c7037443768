//! # Render-List Resolution
//!
//! Turns a matched route into the ordered root-to-leaf list of components the
//! view layer mounts, one per nesting level.
//!
//! ## Caching
//!
//! Lists are memoised per [`RouteId`] in a [`RenderListCache`] owned by the
//! router instance, so the cache is dropped together with the registry it
//! describes. A cache hit returns the *same* `Arc`, which lets the view layer
//! skip re-rendering with a pointer comparison.
//!
//! Registry entries are never mutated, so a cached list can only go stale when
//! routes are added. [`RenderListCache::invalidate_within`] evicts every entry
//! whose full path lies inside the added subtree.
//!
//! The cache can be switched off with `VROUTER_RENDER_CACHE=off` (see
//! [`RuntimeConfig`](crate::config::RuntimeConfig)); lists are then rebuilt on
//! every resolution.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::component::ComponentRef;
use crate::registry::RouteRegistry;
use crate::route::{MatchedRouteData, RouteId};

/// Ordered root-to-leaf component list.
pub type RenderList = Arc<[ComponentRef]>;

/// Hit/miss counters, mostly useful in tests and debug logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Per-registry memo of render lists keyed by route id.
pub struct RenderListCache {
    entries: RwLock<HashMap<RouteId, RenderList>>,
    empty: RenderList,
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RenderListCache {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            empty: Arc::from(Vec::new()),
            enabled,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Render list for `matched`, or the shared empty list when nothing matched.
    pub fn resolve(&self, matched: Option<&MatchedRouteData>, registry: &RouteRegistry) -> RenderList {
        let Some(matched) = matched else {
            return Arc::clone(&self.empty);
        };

        if !self.enabled {
            return build_render_list(&matched.id, registry);
        }

        if let Some(list) = self
            .entries
            .read()
            .expect("render cache lock poisoned")
            .get(&matched.id)
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(route_id = %matched.id, "Render list cache hit");
            return Arc::clone(list);
        }

        let list = build_render_list(&matched.id, registry);
        let mut entries = self.entries.write().expect("render cache lock poisoned");
        let list = Arc::clone(entries.entry(matched.id.clone()).or_insert(list));
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(
            route_id = %matched.id,
            render_depth = list.len(),
            cache_size = entries.len(),
            "Render list cache miss"
        );
        list
    }

    /// Evict every entry whose route lies at or below `prefix`.
    ///
    /// Returns the number of evicted entries.
    pub fn invalidate_within(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().expect("render cache lock poisoned");
        let before = entries.len();
        entries.retain(|id, _| !id.is_within(prefix));
        let evicted = before - entries.len();
        if evicted > 0 {
            info!(prefix = %prefix, evicted, "Render list cache entries invalidated");
        }
        evicted
    }

    /// Drop every cached list.
    pub fn clear(&self) {
        self.entries.write().expect("render cache lock poisoned").clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().expect("render cache lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Walk the parent chain of `id` and build its render list without caching.
///
/// The leaf lands at index `depth`, each ancestor one slot lower.
#[must_use]
pub fn build_render_list(id: &RouteId, registry: &RouteRegistry) -> RenderList {
    let mut slots: Vec<Option<ComponentRef>> = vec![None; id.depth() + 1];
    let mut index = Some(id.depth());
    let mut cursor = registry.get(id);

    while let (Some(route), Some(slot)) = (cursor, index) {
        slots[slot] = Some(route.component.clone());
        index = slot.checked_sub(1);
        cursor = route.parent_id.as_ref().and_then(|parent| registry.get(parent));
    }

    if slots.iter().any(Option::is_none) {
        warn!(route_id = %id, "Route chain is incomplete, render list truncated");
    }
    slots.into_iter().flatten().collect()
}
