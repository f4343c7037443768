//! # Configuration
//!
//! Two kinds of configuration live here:
//!
//! - **Router definitions** ([`RoutersConfig`]): routers declared in a YAML,
//!   TOML or JSON file and pre-registered as global instances when the
//!   application starts. Components are referenced by name and resolved
//!   through a [`ComponentTable`].
//! - **Runtime switches** ([`RuntimeConfig`]): process-wide knobs read from the
//!   environment.
//!
//! ## File format
//!
//! ```yaml
//! routers:
//!   main:
//!     options:
//!       initialPath: /foo
//!     routes:
//!       - path: /foo
//!         component: Foo
//!       - path: /bar
//!         component: Bar
//!         meta: { title: Bar }
//!         children:
//!           - path: ""
//!             component: Baz
//!           - path: qux
//!             component: Qux
//! ```
//!
//! The format is picked from the file extension: `.yaml` / `.yml`, `.toml`,
//! anything else is parsed as JSON.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Meaning |
//! | --- | --- | --- |
//! | `VROUTER_RENDER_CACHE` | `on` | `off` / `false` / `0` rebuilds render lists on every resolution |
//! | `VROUTER_KEY_PREFIX` | `v` | prefix of generated contextual router keys |

use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::component::ComponentTable;
use crate::directory::RouterDefinition;
use crate::error::{Result, RouterError};
use crate::route::{RouteMeta, RouteNode};
use crate::router::RouterOptions;

/// Declarative route node as it appears in a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteSpec {
    pub path: Option<String>,
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<RouteMeta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteSpec>,
}

impl RouteSpec {
    /// Convert into a [`RouteNode`], resolving component names through `components`.
    pub fn to_node(&self, components: &ComponentTable) -> Result<RouteNode> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| RouterError::malformed("<missing>", "missing path"))?;
        let name = self
            .component
            .as_deref()
            .ok_or_else(|| RouterError::malformed(&path, "missing component"))?;
        let component = components.resolve(name)?;

        let children = self
            .children
            .iter()
            .map(|child| child.to_node(components))
            .collect::<Result<Vec<_>>>()?;

        Ok(RouteNode {
            path,
            component: Some(component),
            meta: self.meta.clone(),
            children,
        })
    }
}

/// One configured router.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
    #[serde(default)]
    pub options: RouterOptions,
}

impl RouterConfig {
    pub fn to_definition(&self, components: &ComponentTable) -> Result<RouterDefinition> {
        let routes = self
            .routes
            .iter()
            .map(|spec| spec.to_node(components))
            .collect::<Result<Vec<_>>>()?;
        Ok(RouterDefinition {
            routes,
            options: self.options.clone(),
        })
    }
}

/// Top-level configuration file: router key to router definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutersConfig {
    #[serde(default)]
    pub routers: BTreeMap<String, RouterConfig>,
}

impl RoutersConfig {
    /// Resolve every router. Fails on the first invalid router, so either all
    /// of them are usable or none is.
    pub fn to_definitions(
        &self,
        components: &ComponentTable,
    ) -> Result<Vec<(String, RouterDefinition)>> {
        self.routers
            .iter()
            .map(|(key, router)| {
                if key.trim().is_empty() {
                    return Err(RouterError::Config("router keys must be non-empty".into()));
                }
                Ok((key.clone(), router.to_definition(components)?))
            })
            .collect()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RouterConfig> {
        self.routers.get(key)
    }
}

/// Serialisation format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    /// Format implied by the file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => ConfigFormat::Yaml,
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Parse a routers configuration document.
pub fn parse_routers_config(content: &str, format: ConfigFormat) -> anyhow::Result<RoutersConfig> {
    let config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
        ConfigFormat::Toml => toml::from_str(content)?,
        ConfigFormat::Json => serde_json::from_str(content)?,
    };
    Ok(config)
}

/// Load a routers configuration file.
pub fn load_routers_config(path: impl AsRef<Path>) -> anyhow::Result<RoutersConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read router config {}", path.display()))?;
    parse_routers_config(&content, ConfigFormat::from_path(path))
        .with_context(|| format!("Failed to parse router config {}", path.display()))
}

/// Runtime configuration loaded from environment variables.
///
/// Load this at startup using [`RuntimeConfig::from_env()`] and hand it to the
/// [`Directory`](crate::directory::Directory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Memoise render lists per route (default: on)
    pub render_cache: bool,
    /// Prefix of generated contextual router keys (default: `v`)
    pub key_prefix: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            render_cache: true,
            key_prefix: "v".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let render_cache = match lookup("VROUTER_RENDER_CACHE") {
            Some(value) => !matches!(
                value.trim().to_lowercase().as_str(),
                "off" | "false" | "0" | "no"
            ),
            None => defaults.render_cache,
        };
        let key_prefix = lookup("VROUTER_KEY_PREFIX")
            .map(|prefix| prefix.trim().to_string())
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or(defaults.key_prefix);
        RuntimeConfig {
            render_cache,
            key_prefix,
        }
    }
}
