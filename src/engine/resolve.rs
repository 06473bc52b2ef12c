//! Module Resolution
//!
//! Locates an engine package the way Node does: `node_modules/<name>` in the
//! workspace root and each of its ancestors, then the extra module
//! directories from the configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::lenient::lenient;

/// An engine package found on disk
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedModule {
    pub name: String,
    /// Package directory, suitable for `require()`
    pub path: PathBuf,
    pub version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    #[serde(default, deserialize_with = "lenient")]
    version: Option<String>,
}

/// Candidate package directories, in lookup order
fn candidates<'a>(
    name: &'a str,
    root: Option<&'a Path>,
    module_dirs: &'a [PathBuf],
) -> impl Iterator<Item = PathBuf> + 'a {
    let from_root = root
        .into_iter()
        .flat_map(Path::ancestors)
        .filter(|dir| dir.file_name().is_none_or(|n| n != "node_modules"))
        .map(move |dir| dir.join("node_modules").join(name));

    let from_dirs = module_dirs.iter().map(move |dir| dir.join(name));

    from_root.chain(from_dirs)
}

/// Find `name` starting at `root`.
///
/// A candidate only counts when it holds a `package.json`.
pub fn resolve_module(
    name: &str,
    root: Option<&Path>,
    module_dirs: &[PathBuf],
) -> Option<ResolvedModule> {
    let path = candidates(name, root, module_dirs).find(|dir| dir.join("package.json").is_file())?;

    let version = std::fs::read_to_string(path.join("package.json"))
        .ok()
        .and_then(|content| serde_json::from_str::<PackageManifest>(&content).ok())
        .and_then(|manifest| manifest.version);

    log::debug!("resolved {} at {}", name, path.display());

    Some(ResolvedModule {
        name: name.to_string(),
        path,
        version,
    })
}
