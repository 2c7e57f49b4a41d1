//! Hot reload of the gateway list.
//!
//! Only the gateway candidates are picked up live: each valid rewrite of the
//! file is handed to the liveness checker, which sweeps the new list right
//! away. The parent directory is watched so editors that save by renaming a
//! temporary file over the original are still seen.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::RelayConfig;

/// Sends every valid rewrite of the config file to the liveness checker.
pub struct ConfigWatcher {
    path: PathBuf,
    updates: mpsc::UnboundedSender<RelayConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end the checker listens on.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RelayConfig>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            updates,
        };
        (watcher, rx)
    }

    /// Start watching. Updates stop when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(OsStr::to_os_string);

        let path = self.path.clone();
        let updates = self.updates;
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if rewrites(&event, file_name.as_deref()) => reload_gateways(&path, &updates),
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Watching config for gateway list changes");
        Ok(watcher)
    }
}

/// Whether `event` wrote to (or renamed onto) the config file.
fn rewrites(event: &Event, file_name: Option<&OsStr>) -> bool {
    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
        return false;
    }
    event.paths.iter().any(|changed| changed.file_name() == file_name)
}

/// Load the file and forward its gateway list. A file that does not parse or
/// validate is logged and dropped, leaving the current list in place.
fn reload_gateways(path: &Path, updates: &mpsc::UnboundedSender<RelayConfig>) {
    match load_config(path) {
        Ok(config) => {
            tracing::info!(gateways = config.gateways.len(), "Config changed, reloading gateway list");
            if updates.send(config).is_err() {
                tracing::debug!("Liveness checker gone, dropping reloaded gateway list");
            }
        }
        Err(e) => tracing::error!(error = %e, "Failed to reload config, keeping current gateways"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tokio::time::timeout;

    /// Replace the file the way editors do: write a sibling, then rename.
    fn save(path: &Path, content: &str) {
        let staging = path.with_extension("toml.swp");
        fs::write(&staging, content).unwrap();
        fs::rename(&staging, path).unwrap();
    }

    fn gateways(list: &[&str]) -> String {
        let quoted: Vec<String> = list.iter().map(|g| format!("{g:?}")).collect();
        format!("gateways = [{}]\n", quoted.join(", "))
    }

    #[tokio::test]
    async fn rewritten_gateway_list_is_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        fs::write(&path, gateways(&["https://a.example/ipfs/"])).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _handle = watcher.run().unwrap();

        // Invalid rewrites are never forwarded.
        save(&path, "gateways = [\"ftp://nope.example/\"]\n");
        save(&path, "gateways = [ this is not toml");
        assert!(timeout(Duration::from_millis(500), updates.recv()).await.is_err());

        let wanted = ["https://b.example/ipfs/", "https://c.example/ipfs/{cid}"];
        save(&path, &gateways(&wanted));

        let config = timeout(Duration::from_secs(5), updates.recv())
            .await
            .expect("reload should arrive")
            .unwrap();
        assert_eq!(config.gateways, wanted);
    }

    #[tokio::test]
    async fn other_files_in_the_directory_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        fs::write(&path, gateways(&["https://a.example/ipfs/"])).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _handle = watcher.run().unwrap();

        fs::write(dir.path().join("other.toml"), gateways(&["https://z.example/ipfs/"])).unwrap();
        assert!(timeout(Duration::from_millis(500), updates.recv()).await.is_err());
    }
}
