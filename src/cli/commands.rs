use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::component::ComponentTable;
use crate::config::{load_routers_config, RuntimeConfig};
use crate::directory::Directory;
use crate::error::RouterError;
use crate::router::RouteTableEntry;

/// Command-line interface for vrouter
///
/// Inspects router configuration files: lists registered routes and resolves
/// paths the way a running application would.
#[derive(Parser, Debug)]
#[command(name = "vrouter")]
#[command(about = "Virtual router inspection tool", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the routes registered by a configuration file
    Routes {
        /// Router configuration file (YAML, TOML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Only list this router
        #[arg(short, long)]
        router: Option<String>,

        /// Print JSON instead of a text table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Resolve a path and print the resulting route snapshot as JSON
    Resolve {
        /// Router configuration file (YAML, TOML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Router key to resolve against
        #[arg(short, long)]
        router: String,

        /// Path to resolve, may include `?query` and `#hash`
        #[arg(short, long)]
        path: String,
    },
}

/// Parse the process arguments and run the selected command, writing to stdout.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(&cli, &mut stdout.lock())
}

/// Run `cli`, writing command output to `out`.
pub fn run(cli: &Cli, out: &mut impl Write) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Routes {
            config,
            router,
            json,
        } => {
            let report = routes_report(config, router.as_deref())?;
            if *json {
                writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            } else {
                for (key, entries) in &report {
                    for entry in entries {
                        let status = if entry.addressable { "" } else { "\tshadowed" };
                        writeln!(
                            out,
                            "{key}\t{}@{}\t{}{status}",
                            entry.full_path, entry.depth, entry.component
                        )?;
                    }
                }
            }
        }
        Commands::Resolve {
            config,
            router,
            path,
        } => {
            let snapshot = resolve_report(config, router, path)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&snapshot)?)?;
        }
    }
    Ok(())
}

/// Route tables of every configured router (or only `router`), keyed by router.
pub fn routes_report(
    config: &Path,
    router: Option<&str>,
) -> anyhow::Result<BTreeMap<String, Vec<RouteTableEntry>>> {
    let directory = load_directory(config)?;
    let keys = match router {
        Some(key) => {
            if !directory.contains(key) {
                return Err(RouterError::NotFound {
                    key: key.to_string(),
                }
                .into());
            }
            vec![key.to_string()]
        }
        None => directory.keys(),
    };

    Ok(keys
        .into_iter()
        .filter_map(|key| {
            let table = directory.get(&key)?.route_table();
            Some((key, table))
        })
        .collect())
}

/// Snapshot of `router` after replacing its active path with `path`, as JSON.
pub fn resolve_report(config: &Path, router: &str, path: &str) -> anyhow::Result<serde_json::Value> {
    let directory = load_directory(config)?;
    let instance = directory.get(router).ok_or_else(|| RouterError::NotFound {
        key: router.to_string(),
    })?;
    instance.replace(path)?;
    let snapshot = instance.route();
    info!(router = %router, path = %path, matched = snapshot.is_matched(), "Path resolved");
    Ok(serde_json::to_value(&*snapshot)?)
}

fn load_directory(config: &Path) -> anyhow::Result<Directory> {
    let routers = load_routers_config(config)?;
    let components = ComponentTable::permissive();
    Directory::from_config(&routers, &components, RuntimeConfig::from_env())
        .with_context(|| format!("Invalid router config {}", config.display()))
}
