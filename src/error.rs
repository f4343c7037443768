//! # Error Module
//!
//! Every failure the router core can detect is a programmer or configuration
//! error, so there is a single [`RouterError`] enum and no retry machinery.
//! Messages share the `[vrouter] [<operation>]` prefix so they are easy to grep
//! in logs and stable enough to assert on in tests.
//!
//! A path that matches no route is *not* an error; it is represented by a
//! [`RouteSnapshot`](crate::router::RouteSnapshot) with an empty render list.

use thiserror::Error;

/// Errors raised by route registration, router instances and the directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// The router key was empty or otherwise unusable.
    #[error("[vrouter] [useRouter] key must be a non-empty string: {key:?}")]
    InvalidKey {
        /// The rejected key
        key: String,
    },

    /// `acquire` was called on a scope that has already been torn down, so no
    /// detach hook could be registered.
    #[error("[vrouter] [useRouter] must be called within an active scope")]
    ScopeDisposed,

    /// The scope has no router directory (the host integration is missing).
    #[error("[vrouter] [useRouter] router directory not installed")]
    DirectoryMissing,

    /// A route tree was supplied for a key that already has a live instance.
    #[error("[vrouter] [useRouter] router with key \"{key}\" already exists")]
    AlreadyExists {
        /// The conflicting key
        key: String,
    },

    /// No instance exists for the key and no route tree was supplied.
    #[error("[vrouter] [useRouter] router with key \"{key}\" not found")]
    NotFound {
        /// The missing key
        key: String,
    },

    /// A route node is missing required data or carries an invalid path.
    #[error("[vrouter] [register] malformed route at \"{path}\": {reason}")]
    MalformedRoute {
        /// Path of the offending node (as declared, or `<missing>`)
        path: String,
        /// What is wrong with it
        reason: String,
    },

    /// The `(full_path, depth)` identity is already present in the registry.
    #[error("[vrouter] [register] route \"{full_path}\" at depth {depth} is already registered")]
    DuplicateRoute {
        /// Canonical full path of the duplicate
        full_path: String,
        /// Depth of the duplicate
        depth: usize,
    },

    /// A configured route referenced a component name that was never declared.
    #[error("[vrouter] [config] unknown component \"{name}\"")]
    UnknownComponent {
        /// The unresolved component name
        name: String,
    },

    /// The instance was disposed and can no longer be mutated.
    #[error("[vrouter] [router] router \"{key}\" has been disposed")]
    Disposed {
        /// Key (or debug label) of the disposed instance
        key: String,
    },

    /// Invalid router configuration.
    #[error("[vrouter] [config] {0}")]
    Config(String),
}

impl RouterError {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        RouterError::MalformedRoute {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = RouterError> = std::result::Result<T, E>;
