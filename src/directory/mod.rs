//! # Router Directory
//!
//! The [`Directory`] is the application-wide table of router instances, keyed
//! by string. It is the only shared mutable structure between consumers, so
//! every create / attach / dispose transition goes through the `DashMap`
//! entry API and is atomic per key: two consumers racing to create the same
//! key can never both succeed.
//!
//! ## Lifecycle
//!
//! ```text
//! acquire(key, Some(routes)) ─► Active (ref_count = 1)
//! acquire(key, None)         ─► Active (ref_count + 1)
//! release(key)               ─► ref_count - 1
//!      ref_count == 0 && !is_global ─► Disposed (removed, snapshot torn down)
//!      ref_count == 0 &&  is_global ─► Persistent (kept, still usable)
//! ```
//!
//! Consumers do not call the directory directly; they go through a [`Scope`],
//! which validates the call, propagates the key to nested scopes and releases
//! the instance when the scope is disposed.
//!
//! ## Pre-registration
//!
//! Routers known at startup (for example from a configuration file, see
//! [`Directory::from_config`]) are created up front as global instances.

mod handle;
mod scope;

pub use handle::{RouteView, RouterControl, RouterHandle};
pub use scope::Scope;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::component::ComponentTable;
use crate::config::{RoutersConfig, RuntimeConfig};
use crate::error::{Result, RouterError};
use crate::route::RouteNode;
use crate::router::{RouterInstance, RouterOptions};

/// Route tree plus options, everything needed to create a router instance.
#[derive(Debug, Clone, Default)]
pub struct RouterDefinition {
    pub routes: Vec<RouteNode>,
    pub options: RouterOptions,
}

impl RouterDefinition {
    pub fn new(routes: Vec<RouteNode>, options: RouterOptions) -> Self {
        Self { routes, options }
    }
}

/// Keyed table of router instances for one application.
pub struct Directory {
    routers: DashMap<String, Arc<RouterInstance>>,
    runtime: RuntimeConfig,
    next_id: AtomicU64,
}

impl Directory {
    /// Empty directory with the default runtime configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_runtime(RuntimeConfig::default())
    }

    #[must_use]
    pub fn with_runtime(runtime: RuntimeConfig) -> Self {
        Self {
            routers: DashMap::new(),
            runtime,
            next_id: AtomicU64::new(0),
        }
    }

    /// Create every router in `routers` as a global instance.
    ///
    /// If any of them fails to register, the error is returned and the
    /// directory is dropped, so no partial set of routers is ever visible.
    pub fn with_routers<I>(self, routers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, RouterDefinition)>,
    {
        for (key, definition) in routers {
            self.register_global(&key, &definition.routes, definition.options)?;
        }
        Ok(self)
    }

    /// Build a directory from a parsed configuration file.
    pub fn from_config(
        config: &RoutersConfig,
        components: &ComponentTable,
        runtime: RuntimeConfig,
    ) -> Result<Self> {
        let definitions = config.to_definitions(components)?;
        Self::with_runtime(runtime).with_routers(definitions)
    }

    /// Eagerly create a global instance under `key`.
    pub fn register_global(
        &self,
        key: &str,
        routes: &[RouteNode],
        options: RouterOptions,
    ) -> Result<Arc<RouterInstance>> {
        validate_key(key)?;
        match self.routers.entry(key.to_string()) {
            Entry::Occupied(_) => Err(RouterError::AlreadyExists {
                key: key.to_string(),
            }),
            Entry::Vacant(slot) => {
                let instance = Arc::new(RouterInstance::create_with_runtime(
                    key,
                    routes,
                    options.global(),
                    &self.runtime,
                )?);
                slot.insert(Arc::clone(&instance));
                info!(key = %key, "Global router pre-registered");
                Ok(instance)
            }
        }
    }

    /// Attach one consumer to `key`, creating the instance when `routes` is
    /// a non-empty tree.
    ///
    /// An empty tree counts as no tree.
    pub(crate) fn acquire(
        &self,
        key: &str,
        routes: Option<&[RouteNode]>,
        options: RouterOptions,
    ) -> Result<Arc<RouterInstance>> {
        let routes = routes.filter(|routes| !routes.is_empty());

        match (self.routers.entry(key.to_string()), routes) {
            (Entry::Occupied(_), Some(_)) => {
                warn!(key = %key, "Router defined twice");
                Err(RouterError::AlreadyExists {
                    key: key.to_string(),
                })
            }
            (Entry::Occupied(existing), None) => {
                let instance = Arc::clone(existing.get());
                instance.attach();
                Ok(instance)
            }
            (Entry::Vacant(_), None) => Err(RouterError::NotFound {
                key: key.to_string(),
            }),
            (Entry::Vacant(slot), Some(routes)) => {
                let instance = Arc::new(RouterInstance::create_with_runtime(
                    key,
                    routes,
                    options,
                    &self.runtime,
                )?);
                instance.attach();
                slot.insert(Arc::clone(&instance));
                Ok(instance)
            }
        }
    }

    /// Detach one consumer from whatever instance is registered under `key`.
    ///
    /// Returns `true` when this was the last consumer of a non-global
    /// instance, which is then disposed and removed.
    pub fn release(&self, key: &str) -> bool {
        match self.get(key) {
            Some(instance) => self.release_instance(key, &instance),
            None => {
                warn!(key = %key, "Release of unknown router ignored");
                false
            }
        }
    }

    /// Detach one consumer from `instance`, which was acquired under `key`.
    ///
    /// The entry is only touched while it still holds that same instance. A
    /// consumer whose instance was already removed (or replaced by a newer one
    /// under the same key) only detaches from its own instance.
    pub fn release_instance(&self, key: &str, instance: &Arc<RouterInstance>) -> bool {
        // Detaching inside the predicate keeps decrement and removal under one
        // shard lock, so a concurrent acquire sees either the live instance or
        // no entry at all.
        let mut registered = false;
        let removed = self.routers.remove_if(key, |_, current| {
            if !Arc::ptr_eq(current, instance) {
                return false;
            }
            registered = true;
            current.detach() == 0 && !current.is_global()
        });

        match removed {
            Some((_, instance)) => {
                instance.dispose();
                info!(key = %key, "Router released and disposed");
                true
            }
            None if registered => {
                debug!(key = %key, "Router released");
                false
            }
            None => {
                instance.detach();
                debug!(key = %key, "Release of a router no longer registered under its key");
                false
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<RouterInstance>> {
        self.routers.get(key).map(|entry| Arc::clone(entry.value()))
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.routers.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routers.is_empty()
    }

    /// Registered keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.routers.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    #[must_use]
    pub fn runtime(&self) -> &RuntimeConfig {
        &self.runtime
    }

    /// Dispose and remove every instance, global ones included. Called when
    /// the application shuts down.
    pub fn dispose_all(&self) {
        let keys = self.keys();
        for key in &keys {
            if let Some((_, instance)) = self.routers.remove(key) {
                instance.dispose();
            }
        }
        info!(disposed = keys.len(), "Router directory torn down");
    }

    /// Next application-unique contextual key.
    pub(crate) fn generate_key(&self) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("{}-{id}", self.runtime.key_prefix)
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory")
            .field("keys", &self.keys())
            .field("runtime", &self.runtime)
            .finish()
    }
}

pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(RouterError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}
