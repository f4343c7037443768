//! # Path Matcher
//!
//! The router core only needs two things from a matcher: register a pattern
//! with a payload, and find the best payload for a concrete path together with
//! the extracted parameters. [`PathMatcher`] captures exactly that, and
//! [`RadixMatcher`] is the implementation every router instance uses.
//!
//! ## Pattern syntax
//!
//! | Segment | Meaning |
//! | --- | --- |
//! | `users` | static segment, matched exactly (case-sensitive) |
//! | `:id` | named parameter, matches one segment |
//! | `*` | unnamed parameter, matches one segment, stored as `_0`, `_1`, ... |
//! | `**` / `**:rest` | catch-all, matches the remaining segments (zero or more), stored as `_` or `rest` |
//!
//! ## Precedence
//!
//! At every level static children are tried first, then parameters, then the
//! catch-all, with backtracking. The same path therefore always resolves to
//! the same payload no matter the registration order.
//!
//! Empty segments are ignored on both sides, so `/a//b/` matches `/a/b`. Only
//! the pathname is considered; callers strip `?query` and `#hash` first.

mod radix;

pub use radix::RadixMatcher;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;

use crate::route::MatchedRouteData;

/// Maximum number of parameters stored inline before spilling to the heap.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Inline parameter storage. Names are shared with the matcher tree.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Capability the router core consumes for path matching.
pub trait PathMatcher: Send + Sync {
    /// Register `pattern`. Registering an existing pattern replaces its payload.
    fn add_route(&mut self, pattern: &str, payload: MatchedRouteData);

    /// Best match for `path`, or `None`.
    fn find(&self, path: &str) -> Option<PathMatch>;

    /// Every registered pattern, in registration order.
    fn patterns(&self) -> Vec<String>;
}

/// Successful match of a concrete path.
#[derive(Debug, Clone)]
pub struct PathMatch {
    pub data: Arc<MatchedRouteData>,
    /// `None` when the matched pattern declares no parameters.
    pub params: Option<RouteParams>,
}

/// Parameters extracted from a matched path.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RouteParams(ParamVec);

impl RouteParams {
    pub(crate) fn from_vec(params: ParamVec) -> Self {
        Self(params)
    }

    /// Value of parameter `name`. The last occurrence wins if a name repeats.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Owned copy as a map. Allocates; prefer [`get`](Self::get) when possible.
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

impl fmt::Debug for RouteParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Serialize for RouteParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Check that `pattern` is well-formed for [`RadixMatcher`].
///
/// Returns a human readable reason on failure.
pub fn validate_pattern(pattern: &str) -> Result<(), String> {
    if pattern.contains(['?', '#']) {
        return Err("path must not contain '?' or '#'".to_string());
    }

    let segments: Vec<&str> = split_segments(pattern).collect();
    for (index, segment) in segments.iter().enumerate() {
        if let Some(rest) = segment.strip_prefix("**") {
            if index + 1 != segments.len() {
                return Err(format!("catch-all \"{segment}\" must be the last segment"));
            }
            if !rest.is_empty() {
                let name = rest
                    .strip_prefix(':')
                    .ok_or_else(|| format!("invalid catch-all segment \"{segment}\""))?;
                check_param_name(name, segment)?;
            }
        } else if let Some(name) = segment.strip_prefix(':') {
            check_param_name(name, segment)?;
        } else if segment.contains(':') || (segment.contains('*') && *segment != "*") {
            return Err(format!("invalid segment \"{segment}\""));
        }
    }
    Ok(())
}

fn check_param_name(name: &str, segment: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err(format!("parameter segment \"{segment}\" has no name"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("parameter name in \"{segment}\" must be alphanumeric"));
    }
    Ok(())
}

pub(crate) fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
