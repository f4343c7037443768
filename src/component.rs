//! # Component References
//!
//! The router never renders anything itself. It hands the view layer an ordered
//! list of [`ComponentRef`]s and lets the render slot decide how to mount them.
//! A `ComponentRef` is therefore an opaque, cheaply clonable handle:
//!
//! - **Eager** components carry an optional payload that is available at once.
//! - **Lazy** components carry a loader which runs at most once, the first time
//!   the view layer calls [`ComponentRef::load`].
//!
//! Two handles are equal only when they point at the same component, which is
//! what the render-list cache and the view layer's identity checks rely on.
//!
//! [`ComponentTable`] maps names to components so routes declared in
//! configuration files can refer to components by name.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use tracing::debug;

use crate::error::{Result, RouterError};

/// Type-erased component payload handed to the view layer.
pub type ComponentPayload = Arc<dyn Any + Send + Sync>;

/// Loader for a lazily resolved component.
pub type ComponentLoader = Arc<dyn Fn() -> ComponentPayload + Send + Sync>;

enum ComponentSource {
    Eager(Option<ComponentPayload>),
    Lazy {
        loader: ComponentLoader,
        loaded: OnceLock<ComponentPayload>,
    },
}

struct ComponentInner {
    name: Arc<str>,
    source: ComponentSource,
}

/// Opaque handle to a renderable unit.
#[derive(Clone)]
pub struct ComponentRef {
    inner: Arc<ComponentInner>,
}

impl ComponentRef {
    /// A component known only by name, with no payload attached.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self::from_source(name, ComponentSource::Eager(None))
    }

    /// An eager component carrying `payload`.
    pub fn with_payload<T: Any + Send + Sync>(name: impl Into<Arc<str>>, payload: T) -> Self {
        Self::from_source(name, ComponentSource::Eager(Some(Arc::new(payload))))
    }

    /// A lazy component. `loader` runs the first time [`load`](Self::load) is called.
    pub fn lazy<F>(name: impl Into<Arc<str>>, loader: F) -> Self
    where
        F: Fn() -> ComponentPayload + Send + Sync + 'static,
    {
        Self::from_source(
            name,
            ComponentSource::Lazy {
                loader: Arc::new(loader),
                loaded: OnceLock::new(),
            },
        )
    }

    fn from_source(name: impl Into<Arc<str>>, source: ComponentSource) -> Self {
        Self {
            inner: Arc::new(ComponentInner {
                name: name.into(),
                source,
            }),
        }
    }

    /// Display name of the component.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether the component is resolved through a loader.
    #[must_use]
    pub fn is_lazy(&self) -> bool {
        matches!(self.inner.source, ComponentSource::Lazy { .. })
    }

    /// Whether the payload is available without running a loader.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        match &self.inner.source {
            ComponentSource::Eager(_) => true,
            ComponentSource::Lazy { loaded, .. } => loaded.get().is_some(),
        }
    }

    /// Resolve the payload, running the loader on first use for lazy components.
    ///
    /// Returns `None` for eager components declared without a payload.
    pub fn load(&self) -> Option<ComponentPayload> {
        match &self.inner.source {
            ComponentSource::Eager(payload) => payload.clone(),
            ComponentSource::Lazy { loader, loaded } => {
                let payload = loaded.get_or_init(|| {
                    debug!(component = %self.inner.name, "Loading lazy component");
                    loader()
                });
                Some(Arc::clone(payload))
            }
        }
    }

    /// Identity comparison.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for ComponentRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ComponentRef {}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.inner.source {
            ComponentSource::Eager(_) => "eager",
            ComponentSource::Lazy { .. } => "lazy",
        };
        f.debug_struct("ComponentRef")
            .field("name", &self.name())
            .field("kind", &kind)
            .finish()
    }
}

/// Name to component lookup used when routes come from configuration.
///
/// A strict table rejects unknown names. A permissive table (used by the CLI,
/// which has nothing to render) declares a placeholder the first time a name
/// is seen and hands out that same placeholder afterwards.
pub struct ComponentTable {
    components: RwLock<HashMap<String, ComponentRef>>,
    permissive: bool,
}

impl ComponentTable {
    /// A table that only resolves declared names.
    #[must_use]
    pub fn new() -> Self {
        Self {
            components: RwLock::new(HashMap::new()),
            permissive: false,
        }
    }

    /// A table that creates named placeholders on demand.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            components: RwLock::new(HashMap::new()),
            permissive: true,
        }
    }

    /// Declare `component` under its own name, replacing any previous entry.
    pub fn declare(&self, component: ComponentRef) -> &Self {
        let name = component.name().to_string();
        self.components
            .write()
            .expect("component table lock poisoned")
            .insert(name, component);
        self
    }

    /// Look up a component by name.
    pub fn resolve(&self, name: &str) -> Result<ComponentRef> {
        if let Some(found) = self
            .components
            .read()
            .expect("component table lock poisoned")
            .get(name)
        {
            return Ok(found.clone());
        }

        if !self.permissive {
            return Err(RouterError::UnknownComponent {
                name: name.to_string(),
            });
        }

        let mut components = self.components.write().expect("component table lock poisoned");
        let component = components
            .entry(name.to_string())
            .or_insert_with(|| ComponentRef::named(name))
            .clone();
        Ok(component)
    }

    /// Number of declared components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.read().expect("component table lock poisoned").len()
    }

    /// Whether no component has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ComponentTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_identity_equality() {
        let a = ComponentRef::named("A");
        let a2 = a.clone();
        let other_a = ComponentRef::named("A");
        assert_eq!(a, a2);
        assert_ne!(a, other_a);
    }

    #[test]
    fn test_lazy_loader_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let lazy = ComponentRef::lazy("Lazy", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new("payload") as ComponentPayload
        });

        assert!(lazy.is_lazy());
        assert!(!lazy.is_loaded());
        let first = lazy.load().unwrap();
        let second = lazy.load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(lazy.is_loaded());
        assert_eq!(first.downcast_ref::<&str>(), Some(&"payload"));
    }

    #[test]
    fn test_eager_payload() {
        let eager = ComponentRef::with_payload("Home", 42u32);
        assert!(!eager.is_lazy());
        assert!(eager.is_loaded());
        let payload = eager.load().unwrap();
        assert_eq!(payload.downcast_ref::<u32>(), Some(&42));
        assert!(ComponentRef::named("Bare").load().is_none());
    }

    #[test]
    fn test_strict_table_rejects_unknown() {
        let table = ComponentTable::new();
        let home = ComponentRef::named("Home");
        table.declare(home.clone());
        assert_eq!(table.resolve("Home").unwrap(), home);
        assert_eq!(
            table.resolve("Missing").unwrap_err(),
            RouterError::UnknownComponent {
                name: "Missing".into()
            }
        );
    }

    #[test]
    fn test_permissive_table_reuses_placeholders() {
        let table = ComponentTable::permissive();
        let first = table.resolve("Foo").unwrap();
        let second = table.resolve("Foo").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.name(), "Foo");
        assert_eq!(table.len(), 1);
    }
}
