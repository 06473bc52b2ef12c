//! Workspace Watcher
//!
//! Fallback for clients that can't send `workspace/didChangeWatchedFiles`:
//! watch the workspace tree for the configured file names ourselves.
//! Installed packages under `node_modules` are ignored.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{
    Config as WatchConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use tokio::sync::mpsc;

/// Keeps the underlying watcher alive; dropping it stops the events
pub struct WorkspaceWatcher {
    _watcher: RecommendedWatcher,
}

impl std::fmt::Debug for WorkspaceWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceWatcher").finish_non_exhaustive()
    }
}

impl WorkspaceWatcher {
    /// Start watching `root` and everything below it.
    ///
    /// Paths of changed watched files arrive on the receiver.
    pub fn start(
        root: &Path,
        file_names: &[String],
    ) -> notify::Result<(Self, mpsc::UnboundedReceiver<PathBuf>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let names: HashSet<OsString> = file_names.iter().map(OsString::from).collect();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if let EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) =
                        event.kind
                    {
                        for path in event.paths {
                            if is_watched(&path, &names) {
                                let _ = tx.send(path);
                            }
                        }
                    }
                }
                Err(e) => log::warn!("Workspace watcher error: {}", e),
            },
            WatchConfig::default().with_poll_interval(Duration::from_secs(1)),
        )?;

        watcher.watch(root, RecursiveMode::Recursive)?;
        log::info!("Watching {} for {}", root.display(), file_names.join(", "));

        Ok((Self { _watcher: watcher }, rx))
    }
}

const INSTALLED_PACKAGES: &str = "node_modules";

fn is_watched(path: &Path, names: &HashSet<OsString>) -> bool {
    path.file_name().is_some_and(|name| names.contains(name))
        && !path.iter().any(|part| part == INSTALLED_PACKAGES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_file_name_only() {
        let names: HashSet<OsString> = ["package.json".into()].into_iter().collect();
        assert!(is_watched(Path::new("/work/package.json"), &names));
        assert!(!is_watched(Path::new("/work/package.json.swp"), &names));
        assert!(!is_watched(Path::new("/work/src/app.js"), &names));
    }

    #[test]
    fn test_nested_manifests_watched_but_not_installed_ones() {
        let names: HashSet<OsString> = ["package.json".into()].into_iter().collect();
        assert!(is_watched(Path::new("/work/packages/app/package.json"), &names));
        assert!(!is_watched(
            Path::new("/work/node_modules/standard/package.json"),
            &names
        ));
    }

    #[tokio::test]
    async fn test_reports_manifest_changes() {
        let workspace = tempfile::tempdir().unwrap();
        let (_watcher, mut events) =
            WorkspaceWatcher::start(workspace.path(), &["package.json".to_string()]).unwrap();

        tokio::fs::write(workspace.path().join("notes.txt"), "ignored")
            .await
            .unwrap();
        tokio::fs::write(workspace.path().join("package.json"), "{}")
            .await
            .unwrap();

        let path = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("watcher event")
            .expect("channel open");
        assert_eq!(path.file_name().unwrap(), "package.json");
    }

    #[tokio::test]
    async fn test_reports_nested_manifest_changes() {
        let workspace = tempfile::tempdir().unwrap();
        let nested = workspace.path().join("packages").join("app");
        std::fs::create_dir_all(&nested).unwrap();
        let (_watcher, mut events) =
            WorkspaceWatcher::start(workspace.path(), &["package.json".to_string()]).unwrap();

        tokio::fs::write(nested.join("package.json"), "{}")
            .await
            .unwrap();

        let path = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("watcher event")
            .expect("channel open");
        assert!(path.ends_with("packages/app/package.json"));
    }
}
