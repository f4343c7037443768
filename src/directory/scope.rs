//! Consumer scopes.
//!
//! A [`Scope`] stands for one consumer in the host's component tree. It gives
//! the router the two things it needs from the host:
//!
//! - a place to register teardown hooks, run when the scope is disposed,
//! - a parent chain through which a router key is passed down to nested
//!   consumers, so a nested render slot finds its enclosing router without
//!   naming it.
//!
//! Scopes are cheap handles; clones refer to the same scope.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use tracing::debug;

use super::handle::RouterHandle;
use super::{validate_key, Directory};
use crate::error::{Result, RouterError};
use crate::route::RouteNode;
use crate::router::RouterOptions;

type DisposeHook = Box<dyn FnOnce() + Send>;

struct ScopeInner {
    parent: Option<Scope>,
    directory: Option<Arc<Directory>>,
    provided_key: RwLock<Option<Arc<str>>>,
    hooks: Mutex<Vec<DisposeHook>>,
    children: Mutex<Vec<Weak<ScopeInner>>>,
    disposed: AtomicBool,
}

/// One consumer's lifecycle and context.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    /// Root scope of an application using `directory`.
    #[must_use]
    pub fn root(directory: Arc<Directory>) -> Self {
        Self::build(None, Some(directory), false)
    }

    /// Root scope with no directory installed. Every acquire fails with
    /// [`RouterError::DirectoryMissing`].
    #[must_use]
    pub fn detached() -> Self {
        Self::build(None, None, false)
    }

    fn build(parent: Option<Scope>, directory: Option<Arc<Directory>>, disposed: bool) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                parent,
                directory,
                provided_key: RwLock::new(None),
                hooks: Mutex::new(Vec::new()),
                children: Mutex::new(Vec::new()),
                disposed: AtomicBool::new(disposed),
            }),
        }
    }

    /// Nested scope. It is disposed together with this one as long as the
    /// caller keeps it alive.
    #[must_use]
    pub fn child(&self) -> Scope {
        let child = Self::build(
            Some(self.clone()),
            self.inner.directory.clone(),
            self.is_disposed(),
        );
        let mut children = self.inner.children.lock().expect("scope children lock poisoned");
        children.retain(|weak| weak.strong_count() > 0);
        children.push(Arc::downgrade(&child.inner));
        child
    }

    #[must_use]
    pub fn directory(&self) -> Option<&Arc<Directory>> {
        self.inner.directory.as_ref()
    }

    /// Make `key` the ambient router key for every nested scope.
    pub fn provide_key(&self, key: impl Into<Arc<str>>) {
        *self
            .inner
            .provided_key
            .write()
            .expect("scope key lock poisoned") = Some(key.into());
    }

    /// Key provided by the nearest enclosing scope, if any. A scope does not
    /// see its own provided key.
    #[must_use]
    pub fn inject_key(&self) -> Option<Arc<str>> {
        let mut cursor = self.inner.parent.as_ref();
        while let Some(scope) = cursor {
            if let Some(key) = scope
                .inner
                .provided_key
                .read()
                .expect("scope key lock poisoned")
                .clone()
            {
                return Some(key);
            }
            cursor = scope.inner.parent.as_ref();
        }
        None
    }

    /// Register `hook` to run when this scope is disposed.
    pub fn on_dispose<F>(&self, hook: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut hooks = self.inner.hooks.lock().expect("scope hooks lock poisoned");
        if self.is_disposed() {
            return Err(RouterError::ScopeDisposed);
        }
        hooks.push(Box::new(hook));
        Ok(())
    }

    /// Dispose nested scopes, then run this scope's hooks in reverse
    /// registration order. Disposing twice is a no-op.
    pub fn dispose(&self) {
        let hooks = {
            let mut hooks = self.inner.hooks.lock().expect("scope hooks lock poisoned");
            if self.inner.disposed.swap(true, Ordering::AcqRel) {
                return;
            }
            std::mem::take(&mut *hooks)
        };

        let children: Vec<Weak<ScopeInner>> = std::mem::take(
            &mut *self.inner.children.lock().expect("scope children lock poisoned"),
        );
        for child in children.iter().rev().filter_map(Weak::upgrade) {
            Scope { inner: child }.dispose();
        }

        debug!(hooks = hooks.len(), "Scope disposed");
        for hook in hooks.into_iter().rev() {
            hook();
        }
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Attach to (or create) the router named `key`.
    ///
    /// A non-empty `routes` creates the instance and fails with
    /// [`RouterError::AlreadyExists`] if `key` is taken. An empty `routes`
    /// attaches to an existing instance and fails with
    /// [`RouterError::NotFound`] if there is none. `key` becomes the ambient
    /// key of nested scopes, and the consumer is released when this scope is
    /// disposed.
    pub fn acquire_named(
        &self,
        key: &str,
        routes: &[RouteNode],
        options: RouterOptions,
    ) -> Result<RouterHandle> {
        validate_key(key)?;
        if self.is_disposed() {
            return Err(RouterError::ScopeDisposed);
        }
        let directory = Arc::clone(self.directory().ok_or(RouterError::DirectoryMissing)?);

        let key: Arc<str> = Arc::from(key);
        self.provide_key(Arc::clone(&key));

        let instance = directory.acquire(&key, Some(routes), options)?;

        let release_key = Arc::clone(&key);
        let release_directory = Arc::clone(&directory);
        let release_instance = Arc::clone(&instance);
        if let Err(err) = self.on_dispose(move || {
            release_directory.release_instance(&release_key, &release_instance);
        }) {
            directory.release_instance(&key, &instance);
            return Err(err);
        }

        Ok(RouterHandle::new(key, instance))
    }

    /// Attach to the router an enclosing scope provided.
    ///
    /// With no enclosing key a fresh one is generated (`<prefix>-<n>`), which
    /// only succeeds when `routes` creates the instance.
    pub fn acquire_contextual(
        &self,
        routes: &[RouteNode],
        options: RouterOptions,
    ) -> Result<RouterHandle> {
        let key = match self.inject_key() {
            Some(key) => key,
            None => {
                let directory = self.directory().ok_or(RouterError::DirectoryMissing)?;
                Arc::from(directory.generate_key())
            }
        };
        self.acquire_named(&key, routes, options)
    }

    /// [`acquire_named`](Self::acquire_named) without a route tree.
    pub fn attach_named(&self, key: &str) -> Result<RouterHandle> {
        self.acquire_named(key, &[], RouterOptions::default())
    }

    /// [`acquire_contextual`](Self::acquire_contextual) without a route tree.
    pub fn attach_contextual(&self) -> Result<RouterHandle> {
        self.acquire_contextual(&[], RouterOptions::default())
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("provided_key", &*self.inner.provided_key.read().expect("scope key lock poisoned"))
            .field("has_directory", &self.inner.directory.is_some())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
