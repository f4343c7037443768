//! # Route Types
//!
//! Declarative input ([`RouteNode`]) and the normalised data the registry and
//! matcher keep for it ([`RouteId`], [`NormalizedRoute`], [`MatchedRouteData`]).

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::component::ComponentRef;

/// Arbitrary per-route metadata.
pub type RouteMeta = serde_json::Map<String, Value>;

/// Identity of a registered route node: canonical full path plus depth.
///
/// Depth is the number of ancestors, so top-level routes have depth 0. Two ids
/// are equal when both parts are equal, which is what lets a default child
/// (`/parent` at depth 1) coexist with its parent (`/parent` at depth 0).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId {
    full_path: Arc<str>,
    depth: usize,
}

impl RouteId {
    pub fn new(full_path: impl Into<Arc<str>>, depth: usize) -> Self {
        Self {
            full_path: full_path.into(),
            depth,
        }
    }

    #[must_use]
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether this id lives at or below `prefix`, comparing whole segments.
    #[must_use]
    pub fn is_within(&self, prefix: &str) -> bool {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return true;
        }
        match self.full_path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl fmt::Debug for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RouteId({:?}, {})", self.full_path, self.depth)
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.full_path, self.depth)
    }
}

/// One node of a declarative route tree.
///
/// `path` is relative to the nearest ancestor. An empty path or `/` marks a
/// default (index) child, which takes over its parent's address.
#[derive(Clone, Debug, Default)]
pub struct RouteNode {
    pub path: String,
    pub component: Option<ComponentRef>,
    pub meta: Option<RouteMeta>,
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    pub fn new(path: impl Into<String>, component: ComponentRef) -> Self {
        Self {
            path: path.into(),
            component: Some(component),
            meta: None,
            children: Vec::new(),
        }
    }

    /// Attach metadata, replacing any previous map.
    #[must_use]
    pub fn with_meta(mut self, meta: RouteMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Set a single metadata entry.
    #[must_use]
    pub fn meta_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta
            .get_or_insert_with(RouteMeta::new)
            .insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<RouteNode>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn child(mut self, child: RouteNode) -> Self {
        self.children.push(child);
        self
    }

    /// Whether this node addresses its parent's own path.
    #[must_use]
    pub fn is_default_child(&self) -> bool {
        self.path.is_empty() || self.path == "/"
    }
}

/// Registry entry for one route node. Never mutated once inserted.
#[derive(Clone, Debug)]
pub struct NormalizedRoute {
    pub meta: Option<Arc<RouteMeta>>,
    pub component: ComponentRef,
    pub parent_id: Option<RouteId>,
}

/// Payload stored in the path matcher for every addressable route.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchedRouteData {
    pub id: RouteId,
    pub meta: Option<Arc<RouteMeta>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_route_id_value_equality() {
        let a = RouteId::new("/parent", 0);
        let b = RouteId::new(String::from("/parent"), 0);
        let child = RouteId::new("/parent", 1);
        assert_eq!(a, b);
        assert_ne!(a, child);

        let set: HashSet<RouteId> = [a, b, child].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_route_id_is_within() {
        let id = RouteId::new("/bar/qux", 1);
        assert!(id.is_within("/bar"));
        assert!(id.is_within("/bar/"));
        assert!(id.is_within("/bar/qux"));
        assert!(id.is_within("/"));
        assert!(!id.is_within("/ba"));
        assert!(!id.is_within("/bar/qux/deeper"));
    }

    #[test]
    fn test_route_node_builder() {
        let node = RouteNode::new("/bar", ComponentRef::named("Bar"))
            .meta_entry("title", "Bar")
            .child(RouteNode::new("", ComponentRef::named("Baz")))
            .child(RouteNode::new("qux", ComponentRef::named("Qux")));

        assert_eq!(node.children.len(), 2);
        assert!(node.children[0].is_default_child());
        assert!(!node.children[1].is_default_child());
        assert_eq!(node.meta.unwrap().get("title"), Some(&json!("Bar")));
    }
}
