//! # Route Registry
//!
//! Flattens a declarative [`RouteNode`] tree into a [`RouteRegistry`] (id to
//! normalised route) and feeds the addressable routes into a [`PathMatcher`].
//!
//! ## Registration
//!
//! The tree is walked depth-first with an explicit stack, siblings in
//! declaration order. For every node:
//!
//! 1. `full_path` = parent's full path joined with the node's relative path,
//!    `depth` = parent depth + 1 (top level is 0).
//! 2. The registry entry is inserted before any child is visited, so children
//!    can point at their parent.
//! 3. If one of the node's children is a default child (`""` or `/`), the
//!    node is *shadowed*: it stays in the registry (it is still rendered as an
//!    ancestor) but its full path is not added to the matcher. Addressing
//!    `/parent` therefore always resolves through the default child chain.
//!
//! The whole batch is validated before anything is mutated. A malformed node
//! or a duplicate `(full_path, depth)` rejects the batch and leaves registry
//! and matcher untouched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::component::ComponentRef;
use crate::error::{Result, RouterError};
use crate::matcher::{split_segments, validate_pattern, PathMatcher};
use crate::route::{MatchedRouteData, NormalizedRoute, RouteId, RouteNode};

/// Mapping from route identity to normalised route data.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: HashMap<RouteId, NormalizedRoute>,
}

impl RouteRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &RouteId) -> Option<&NormalizedRoute> {
        self.routes.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &RouteId) -> bool {
        self.routes.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RouteId, &NormalizedRoute)> {
        self.routes.iter()
    }

    /// All ids ordered by full path, then depth.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<RouteId> {
        let mut ids: Vec<RouteId> = self.routes.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn insert(&mut self, id: RouteId, route: NormalizedRoute) {
        self.routes.insert(id, route);
    }
}

/// Join a parent full path and a relative segment into a canonical full path.
///
/// Duplicate and trailing slashes are dropped and the result always starts
/// with `/`: `join_path("/parent", "")` is `/parent`, `join_path("/", "/foo/")`
/// is `/foo`.
#[must_use]
pub fn join_path(base: &str, segment: &str) -> String {
    let mut joined = String::with_capacity(base.len() + segment.len() + 1);
    for part in split_segments(base).chain(split_segments(segment)) {
        joined.push('/');
        joined.push_str(part);
    }
    if joined.is_empty() {
        joined.push('/');
    }
    joined
}

struct PlannedRoute<'a> {
    id: RouteId,
    parent_id: Option<RouteId>,
    component: &'a ComponentRef,
    node: &'a RouteNode,
    shadowed: bool,
}

/// Register `routes` under `parent` (or at the top level when `None`).
///
/// Returns the ids inserted into the registry, in traversal order.
pub fn register_routes<M>(
    matcher: &mut M,
    registry: &mut RouteRegistry,
    routes: &[RouteNode],
    parent: Option<&RouteId>,
) -> Result<Vec<RouteId>>
where
    M: PathMatcher + ?Sized,
{
    let planned = plan(registry, routes, parent)?;
    let mut inserted = Vec::with_capacity(planned.len());

    for route in planned {
        let meta = route.node.meta.clone().map(Arc::new);
        registry.insert(
            route.id.clone(),
            NormalizedRoute {
                meta: meta.clone(),
                component: route.component.clone(),
                parent_id: route.parent_id.clone(),
            },
        );

        if route.shadowed {
            debug!(
                route_id = %route.id,
                component = route.component.name(),
                "Route registered (shadowed by default child)"
            );
        } else {
            matcher.add_route(
                route.id.full_path(),
                MatchedRouteData {
                    id: route.id.clone(),
                    meta,
                },
            );
            debug!(
                route_id = %route.id,
                component = route.component.name(),
                "Route registered"
            );
        }
        inserted.push(route.id);
    }

    info!(
        routes_count = inserted.len(),
        registry_size = registry.len(),
        parent = ?parent.map(ToString::to_string),
        "Route tree registered"
    );
    Ok(inserted)
}

/// Validate the whole batch and compute ids without mutating anything.
fn plan<'a>(
    registry: &RouteRegistry,
    routes: &'a [RouteNode],
    parent: Option<&RouteId>,
) -> Result<Vec<PlannedRoute<'a>>> {
    if let Some(parent) = parent {
        if !registry.contains(parent) {
            return Err(RouterError::malformed(
                parent.full_path(),
                format!("parent route {parent} is not registered"),
            ));
        }
    }

    let mut planned = Vec::new();
    let mut seen: HashSet<RouteId> = HashSet::new();
    let mut stack: Vec<(&'a RouteNode, Option<RouteId>)> = routes
        .iter()
        .rev()
        .map(|node| (node, parent.cloned()))
        .collect();

    while let Some((node, parent_id)) = stack.pop() {
        let base = parent_id.as_ref().map_or("/", RouteId::full_path);
        let depth = parent_id.as_ref().map_or(0, |p| p.depth() + 1);
        let full_path = join_path(base, &node.path);

        let component = node
            .component
            .as_ref()
            .ok_or_else(|| RouterError::malformed(&full_path, "missing component"))?;
        // The joined path is what reaches the matcher, so a child below a
        // catch-all parent is rejected here.
        validate_pattern(&full_path).map_err(|reason| RouterError::malformed(&full_path, reason))?;

        let id = RouteId::new(full_path, depth);
        if registry.contains(&id) || !seen.insert(id.clone()) {
            return Err(RouterError::DuplicateRoute {
                full_path: id.full_path().to_string(),
                depth,
            });
        }

        for child in node.children.iter().rev() {
            stack.push((child, Some(id.clone())));
        }

        planned.push(PlannedRoute {
            shadowed: node.children.iter().any(RouteNode::is_default_child),
            id,
            parent_id,
            component,
            node,
        });
    }

    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::RadixMatcher;
    use serde_json::json;

    fn setup() -> (RadixMatcher, RouteRegistry) {
        (RadixMatcher::new(), RouteRegistry::new())
    }

    fn c(name: &str) -> ComponentRef {
        ComponentRef::named(name)
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/", ""), "/");
        assert_eq!(join_path("/", "/"), "/");
        assert_eq!(join_path("/", "/foo"), "/foo");
        assert_eq!(join_path("/", "foo"), "/foo");
        assert_eq!(join_path("/parent", ""), "/parent");
        assert_eq!(join_path("/parent", "/"), "/parent");
        assert_eq!(join_path("/parent", "grand"), "/parent/grand");
        assert_eq!(join_path("/parent/", "//grand//"), "/parent/grand");
        assert_eq!(join_path("/users", ":id"), "/users/:id");
    }

    #[test]
    fn test_register_top_level_route() {
        let (mut matcher, mut registry) = setup();
        let home = c("Home");
        let routes = vec![RouteNode::new("/", home.clone()).meta_entry("title", "Home")];

        let ids = register_routes(&mut matcher, &mut registry, &routes, None).unwrap();

        assert_eq!(ids, vec![RouteId::new("/", 0)]);
        assert_eq!(registry.len(), 1);
        let route = registry.get(&RouteId::new("/", 0)).unwrap();
        assert_eq!(route.component, home);
        assert_eq!(route.meta.as_ref().unwrap().get("title"), Some(&json!("Home")));
        assert!(route.parent_id.is_none());

        let found = matcher.find("/").unwrap();
        assert_eq!(found.data.id, RouteId::new("/", 0));
    }

    #[test]
    fn test_register_nested_routes() {
        let (mut matcher, mut registry) = setup();
        let routes = vec![RouteNode::new("/parent", c("Parent"))
            .child(RouteNode::new("", c("Child")).meta_entry("depth", 1))
            .child(RouteNode::new("grand", c("Grandchild")))];

        let ids = register_routes(&mut matcher, &mut registry, &routes, None).unwrap();
        assert_eq!(
            ids,
            vec![
                RouteId::new("/parent", 0),
                RouteId::new("/parent", 1),
                RouteId::new("/parent/grand", 1),
            ]
        );

        let child = registry.get(&RouteId::new("/parent", 1)).unwrap();
        assert_eq!(child.parent_id, Some(RouteId::new("/parent", 0)));
        assert_eq!(child.meta.as_ref().unwrap().get("depth"), Some(&json!(1)));
        let grand = registry.get(&RouteId::new("/parent/grand", 1)).unwrap();
        assert_eq!(grand.parent_id, Some(RouteId::new("/parent", 0)));

        assert_eq!(matcher.find("/parent").unwrap().data.id, RouteId::new("/parent", 1));
        assert_eq!(
            matcher.find("/parent/grand").unwrap().data.id,
            RouteId::new("/parent/grand", 1)
        );
    }

    #[test]
    fn test_default_child_shadows_parent() {
        let (mut matcher, mut registry) = setup();
        let routes = vec![RouteNode::new("/parent", c("Parent"))
            .meta_entry("foo", "bar")
            .child(RouteNode::new("", c("Child")).meta_entry("foo", "baz"))];

        register_routes(&mut matcher, &mut registry, &routes, None).unwrap();

        let found = matcher.find("/parent").unwrap();
        assert_eq!(found.data.id, RouteId::new("/parent", 1));
        assert_eq!(found.data.meta.as_ref().unwrap().get("foo"), Some(&json!("baz")));
        assert_eq!(matcher.patterns(), vec!["/parent".to_string()]);
    }

    #[test]
    fn test_default_child_chain_registers_deepest_only() {
        let (mut matcher, mut registry) = setup();
        let routes = vec![RouteNode::new("/a", c("A"))
            .child(RouteNode::new("/", c("B")).child(RouteNode::new("", c("C"))))];

        register_routes(&mut matcher, &mut registry, &routes, None).unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(matcher.len(), 1);
        assert_eq!(matcher.find("/a").unwrap().data.id, RouteId::new("/a", 2));
    }

    #[test]
    fn test_missing_component_rejects_whole_batch() {
        let (mut matcher, mut registry) = setup();
        let routes = vec![
            RouteNode::new("/ok", c("Ok")),
            RouteNode::new("/broken", c("Broken")).child(RouteNode {
                path: "leaf".into(),
                ..RouteNode::default()
            }),
        ];

        let err = register_routes(&mut matcher, &mut registry, &routes, None).unwrap_err();
        assert_eq!(err, RouterError::malformed("/broken/leaf", "missing component"));
        assert!(registry.is_empty());
        assert!(matcher.is_empty());
    }

    #[test]
    fn test_invalid_path_is_malformed() {
        let (mut matcher, mut registry) = setup();
        let routes = vec![RouteNode::new("/search?q=1", c("Search"))];
        let err = register_routes(&mut matcher, &mut registry, &routes, None).unwrap_err();
        assert!(matches!(err, RouterError::MalformedRoute { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_child_below_catch_all_is_malformed() {
        for parent in ["/files/**", "/files/**:rest"] {
            let (mut matcher, mut registry) = setup();
            let routes = vec![RouteNode::new(parent, c("Files")).child(RouteNode::new("x", c("X")))];

            let err = register_routes(&mut matcher, &mut registry, &routes, None).unwrap_err();
            assert!(
                matches!(&err, RouterError::MalformedRoute { path, .. } if path == &format!("{parent}/x")),
                "unexpected error: {err}"
            );
            assert!(registry.is_empty());
            assert!(matcher.is_empty());
        }
    }

    #[test]
    fn test_child_added_below_catch_all_keeps_parent_match() {
        let (mut matcher, mut registry) = setup();
        register_routes(&mut matcher, &mut registry, &[RouteNode::new("/files/**", c("Files"))], None)
            .unwrap();
        let parent = RouteId::new("/files/**", 0);

        let err = register_routes(
            &mut matcher,
            &mut registry,
            &[RouteNode::new("x", c("X"))],
            Some(&parent),
        )
        .unwrap_err();
        assert!(matches!(err, RouterError::MalformedRoute { .. }));
        assert_eq!(matcher.find("/files/readme.md").unwrap().data.id, parent);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_default_child_below_catch_all_is_allowed() {
        let (mut matcher, mut registry) = setup();
        let routes =
            vec![RouteNode::new("/files/**:rest", c("Files")).child(RouteNode::new("", c("Index")))];

        register_routes(&mut matcher, &mut registry, &routes, None).unwrap();
        let found = matcher.find("/files/a/b").unwrap();
        assert_eq!(found.data.id, RouteId::new("/files/**:rest", 1));
        assert_eq!(found.params.unwrap().get("rest"), Some("a/b"));
    }

    #[test]
    fn test_duplicate_route_id_is_rejected() {
        let (mut matcher, mut registry) = setup();
        register_routes(&mut matcher, &mut registry, &[RouteNode::new("/foo", c("Foo"))], None)
            .unwrap();

        let err = register_routes(
            &mut matcher,
            &mut registry,
            &[RouteNode::new("/bar", c("Bar")), RouteNode::new("foo/", c("Foo2"))],
            None,
        )
        .unwrap_err();

        assert_eq!(
            err,
            RouterError::DuplicateRoute {
                full_path: "/foo".into(),
                depth: 0
            }
        );
        assert_eq!(registry.len(), 1);
        assert!(matcher.find("/bar").is_none());
    }

    #[test]
    fn test_duplicate_within_one_batch_is_rejected() {
        let (mut matcher, mut registry) = setup();
        let routes = vec![RouteNode::new("/x", c("X1")), RouteNode::new("/x", c("X2"))];
        assert!(matches!(
            register_routes(&mut matcher, &mut registry, &routes, None),
            Err(RouterError::DuplicateRoute { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_under_existing_parent() {
        let (mut matcher, mut registry) = setup();
        register_routes(&mut matcher, &mut registry, &[RouteNode::new("/users", c("Users"))], None)
            .unwrap();
        let parent = RouteId::new("/users", 0);

        let ids = register_routes(
            &mut matcher,
            &mut registry,
            &[RouteNode::new(":id", c("User"))],
            Some(&parent),
        )
        .unwrap();

        assert_eq!(ids, vec![RouteId::new("/users/:id", 1)]);
        let found = matcher.find("/users/7").unwrap();
        assert_eq!(found.data.id, RouteId::new("/users/:id", 1));
        assert_eq!(found.params.unwrap().get("id"), Some("7"));
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let (mut matcher, mut registry) = setup();
        let missing = RouteId::new("/nowhere", 0);
        let err = register_routes(
            &mut matcher,
            &mut registry,
            &[RouteNode::new("x", c("X"))],
            Some(&missing),
        )
        .unwrap_err();
        assert!(matches!(err, RouterError::MalformedRoute { .. }));
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let (mut matcher, mut registry) = setup();
        let mut node = RouteNode::new("leaf", c("Leaf"));
        for i in 0..2_000 {
            node = RouteNode::new(format!("n{i}"), c("Level")).child(node);
        }

        register_routes(&mut matcher, &mut registry, &[node], None).unwrap();
        assert_eq!(registry.len(), 2_001);
        assert!(registry.iter().any(|(id, _)| id.depth() == 2_000));
    }
}
