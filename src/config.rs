//! Configuration management for the standard language server.
//!
//! Handles:
//! - Command-line argument parsing
//! - Engine module lookup directories

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the standard language server
#[derive(Debug, Parser)]
#[command(name = "standard-language-server")]
#[command(about = "Language server publishing JavaScript Standard Style diagnostics")]
#[command(version)]
pub struct Args {
    /// Name of the Node package providing `lintText`
    #[arg(
        long,
        default_value = "standard",
        help = "Linting engine package (e.g., 'standard', 'semistandard', 'modern-standard')"
    )]
    pub engine: String,

    /// Node.js executable used to run the engine
    #[arg(long, default_value = "node", help = "Path to the node executable")]
    pub node: String,

    /// Extra directories searched for the engine after the workspace
    #[arg(
        long = "module-dir",
        help = "Additional node_modules directory to search"
    )]
    pub module_dirs: Vec<PathBuf>,

    /// File names whose changes trigger a full revalidation
    #[arg(
        long = "watch",
        default_value = "package.json",
        help = "File name to watch for changes"
    )]
    pub watch_files: Vec<String>,

    /// Log level for the language server
    #[arg(
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    /// Package name of the linting engine
    pub engine_module: String,
    /// Node.js executable
    pub node_binary: String,
    /// Directories searched after the workspace `node_modules` chain
    pub module_dirs: Vec<PathBuf>,
    /// Watched file names
    pub watch_files: Vec<String>,
    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine_module: "standard".to_string(),
            node_binary: "node".to_string(),
            module_dirs: Vec::new(),
            watch_files: vec!["package.json".to_string()],
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Create configuration from command-line arguments and environment
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        let mut module_dirs = args.module_dirs;

        // NODE_PATH entries come next, like Node's own lookup
        if let Some(node_path) = std::env::var_os("NODE_PATH") {
            module_dirs.extend(
                std::env::split_paths(&node_path).filter(|p| !p.as_os_str().is_empty()),
            );
        }

        // Node's legacy global folders
        if let Some(home) = dirs::home_dir() {
            module_dirs.push(home.join(".node_modules"));
            module_dirs.push(home.join(".node_libraries"));
        }

        if args.engine.trim().is_empty() {
            anyhow::bail!("--engine must name a package");
        }

        Ok(Config {
            engine_module: args.engine,
            node_binary: args.node,
            module_dirs,
            watch_files: args.watch_files,
            log_level: args.log_level,
        })
    }

    /// Glob patterns registered with the client for watched files
    pub fn watch_globs(&self) -> Vec<String> {
        self.watch_files
            .iter()
            .map(|name| format!("**/{}", name))
            .collect()
    }
}
