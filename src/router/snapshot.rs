use std::borrow::Cow;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::component::ComponentRef;
use crate::matcher::RouteParams;
use crate::render::RenderList;
use crate::route::{RouteId, RouteMeta};

/// Read-only view of the current route.
///
/// A new snapshot is produced every time the active path changes. Consumers
/// get it behind an `Arc` and must treat each version as immutable; changing
/// the route goes through [`RouterInstance::replace`](super::RouterInstance::replace).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSnapshot {
    /// The active path exactly as it was set, including query and hash.
    pub full_path: String,
    /// Pathname only, used for matching.
    pub path: String,
    /// `?query` part, or empty.
    pub search: String,
    /// `#fragment` part, or empty.
    pub hash: String,
    /// Metadata of the matched route.
    pub meta: Option<Arc<RouteMeta>>,
    /// Parameters extracted by the matcher. `None` when nothing matched or the
    /// pattern has no parameters.
    pub params: Option<RouteParams>,
    /// Identity of the matched route.
    #[serde(serialize_with = "serialize_route_id")]
    pub matched: Option<RouteId>,
    /// Components to mount, root to leaf. Empty when nothing matched.
    #[serde(serialize_with = "serialize_render_list")]
    pub render_list: RenderList,
}

impl RouteSnapshot {
    /// Whether the active path resolved to a registered route.
    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }

    /// Component the render slot at nesting `depth` should mount.
    #[must_use]
    pub fn component_at(&self, depth: usize) -> Option<&ComponentRef> {
        self.render_list.get(depth)
    }

    /// Convenience accessor for a single parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.as_ref().and_then(|params| params.get(name))
    }

    /// Decoded query pairs from [`search`](Self::search), in order.
    #[must_use]
    pub fn query(&self) -> Vec<(String, String)> {
        let raw = self.search.strip_prefix('?').unwrap_or(&self.search);
        url::form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Names of the components in the render list.
    #[must_use]
    pub fn component_names(&self) -> Vec<&str> {
        self.render_list.iter().map(ComponentRef::name).collect()
    }
}

/// Split `full_path` into pathname, `?search` and `#hash`.
///
/// The hash is cut first, so a `?` after `#` belongs to the hash. A missing
/// pathname becomes `/`.
#[must_use]
pub fn split_url(full_path: &str) -> (Cow<'_, str>, &str, &str) {
    let (rest, hash) = match full_path.find('#') {
        Some(index) => full_path.split_at(index),
        None => (full_path, ""),
    };
    let (path, search) = match rest.find('?') {
        Some(index) => rest.split_at(index),
        None => (rest, ""),
    };
    let path = if path.is_empty() {
        Cow::Borrowed("/")
    } else if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{path}"))
    };
    (path, search, hash)
}

fn serialize_render_list<S: Serializer>(list: &RenderList, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(list.iter().map(ComponentRef::name))
}

fn serialize_route_id<S: Serializer>(id: &Option<RouteId>, serializer: S) -> Result<S::Ok, S::Error> {
    match id {
        Some(id) => serializer.collect_str(id),
        None => serializer.serialize_none(),
    }
}
