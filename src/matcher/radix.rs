//! Radix tree implementation of [`PathMatcher`].
//!
//! Each node represents one path segment. Lookup cost is proportional to the
//! number of segments in the path, not the number of registered routes, and
//! shared prefixes such as `/settings/` are stored once.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{split_segments, validate_pattern, ParamVec, PathMatch, PathMatcher, RouteParams};
use crate::route::MatchedRouteData;

/// Node in the radix tree.
#[derive(Clone, Default)]
struct RadixNode {
    /// The path segment this node represents (without leading /)
    segment: String,
    /// Payload when a pattern terminates at this node
    payload: Option<Arc<MatchedRouteData>>,
    /// Parameter name if this node is a `:name` or `*` segment
    param_name: Option<Arc<str>>,
    /// Static children
    children: Vec<RadixNode>,
    /// Parameter children. Several are kept so that `/users/:id/posts` and
    /// `/users/:user_id/comments` each extract their own name.
    param_children: Vec<RadixNode>,
    /// Catch-all child (`**`), holding the parameter name it binds
    catch_all: Option<Box<RadixNode>>,
}

impl RadixNode {
    fn new(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            ..Self::default()
        }
    }

    fn new_param(name: Arc<str>) -> Self {
        Self {
            param_name: Some(name),
            ..Self::default()
        }
    }

    /// Insert a pattern, returning the payload it replaced, if any.
    fn insert(
        &mut self,
        segments: &[&str],
        unnamed: usize,
        payload: Arc<MatchedRouteData>,
    ) -> Option<Arc<MatchedRouteData>> {
        let Some((&segment, remaining)) = segments.split_first() else {
            return self.payload.replace(payload);
        };

        if let Some(rest) = segment.strip_prefix("**") {
            let name: Arc<str> = Arc::from(rest.strip_prefix(':').unwrap_or("_"));
            let node = self
                .catch_all
                .get_or_insert_with(|| Box::new(RadixNode::new_param(Arc::clone(&name))));
            node.param_name = Some(name);
            return node.payload.replace(payload);
        }

        let (param, next_unnamed): (Option<Cow<'_, str>>, usize) = match segment {
            "*" => (Some(Cow::Owned(format!("_{unnamed}"))), unnamed + 1),
            s => (s.strip_prefix(':').map(Cow::Borrowed), unnamed),
        };

        if let Some(param_name) = param {
            for child in &mut self.param_children {
                if child.param_name.as_deref() == Some(param_name.as_ref()) {
                    return child.insert(remaining, next_unnamed, payload);
                }
            }
            let mut child = RadixNode::new_param(Arc::from(param_name.as_ref()));
            let replaced = child.insert(remaining, next_unnamed, payload);
            self.param_children.push(child);
            return replaced;
        }

        for child in &mut self.children {
            if child.segment == segment {
                return child.insert(remaining, next_unnamed, payload);
            }
        }

        let mut child = RadixNode::new(segment);
        let replaced = child.insert(remaining, next_unnamed, payload);
        self.children.push(child);
        replaced
    }

    /// Search for the best match, filling `params` on the way down.
    fn search(&self, segments: &[&str], params: &mut ParamVec) -> Option<Arc<MatchedRouteData>> {
        let Some((&segment, remaining)) = segments.split_first() else {
            if let Some(payload) = &self.payload {
                return Some(Arc::clone(payload));
            }
            // A trailing catch-all also matches zero segments.
            return self.search_catch_all(segments, params);
        };

        for child in &self.children {
            if child.segment == segment {
                if let Some(found) = child.search(remaining, params) {
                    return Some(found);
                }
            }
        }

        for child in &self.param_children {
            if let Some(name) = &child.param_name {
                params.push((Arc::clone(name), decode_segment(segment)));
                if let Some(found) = child.search(remaining, params) {
                    return Some(found);
                }
                // Backtrack
                params.pop();
            }
        }

        self.search_catch_all(segments, params)
    }

    fn search_catch_all(
        &self,
        segments: &[&str],
        params: &mut ParamVec,
    ) -> Option<Arc<MatchedRouteData>> {
        let node = self.catch_all.as_ref()?;
        let payload = node.payload.as_ref()?;
        if let Some(name) = &node.param_name {
            let joined = segments
                .iter()
                .map(|s| decode_segment(s))
                .collect::<Vec<_>>()
                .join("/");
            params.push((Arc::clone(name), joined));
        }
        Some(Arc::clone(payload))
    }
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| segment.to_string())
}

/// Radix tree router keyed on path patterns.
#[derive(Clone, Default)]
pub struct RadixMatcher {
    root: RadixNode,
    patterns: Vec<String>,
}

impl RadixMatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct registered patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl PathMatcher for RadixMatcher {
    fn add_route(&mut self, pattern: &str, payload: MatchedRouteData) {
        if let Err(reason) = validate_pattern(pattern) {
            warn!(pattern = %pattern, route_id = %payload.id, reason = %reason, "Invalid matcher pattern ignored");
            return;
        }
        let segments: Vec<&str> = split_segments(pattern).collect();
        let id = payload.id.clone();
        match self.root.insert(&segments, 0, Arc::new(payload)) {
            Some(previous) => {
                warn!(
                    pattern = %pattern,
                    previous = %previous.id,
                    replacement = %id,
                    "Matcher pattern registered twice, keeping the latest payload"
                );
            }
            None => {
                debug!(pattern = %pattern, route_id = %id, "Matcher pattern added");
                self.patterns.push(pattern.to_string());
            }
        }
    }

    fn find(&self, path: &str) -> Option<PathMatch> {
        let segments: Vec<&str> = split_segments(path).collect();
        let mut params = ParamVec::new();
        let data = self.root.search(&segments, &mut params)?;
        let params = (!params.is_empty()).then(|| RouteParams::from_vec(params));
        Some(PathMatch { data, params })
    }

    fn patterns(&self) -> Vec<String> {
        self.patterns.clone()
    }
}
