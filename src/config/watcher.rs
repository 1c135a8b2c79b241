//! Settings file watcher for hot reload.
//!
//! Editors and `notify` backends often report one save as several modify
//! events. Only maps that differ from the last published one are sent.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_settings;
use crate::config::schema::Settings;

/// Monitors a settings file and publishes every changed, loadable map.
pub struct SettingsWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<Settings>,
    last: Option<Settings>,
}

impl SettingsWatcher {
    /// Create a new watcher.
    ///
    /// Returns the watcher and a receiver for settings updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<Settings>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
                last: None,
            },
            update_rx,
        )
    }

    /// Treat `settings` as already published, so reloading it sends nothing.
    pub fn starting_from(mut self, settings: Settings) -> Self {
        self.last = Some(settings);
        self
    }

    /// Start watching the file. The returned watcher must be kept alive.
    pub fn run(mut self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    self.reload();
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Settings watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Settings watcher started");
        Ok(watcher)
    }

    /// Load the file and publish it unless it matches the last published map.
    ///
    /// Returns whether an update was sent.
    fn reload(&mut self) -> bool {
        let settings = match load_settings(&self.path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Failed to reload settings, keeping current client");
                return false;
            }
        };

        if self.last.as_ref() == Some(&settings) {
            tracing::debug!(path = ?self.path, "Settings file unchanged");
            return false;
        }

        tracing::info!(path = ?self.path, keys = settings.len(), "Settings file changed, publishing update");
        if self.update_tx.send(settings.clone()).is_err() {
            return false;
        }
        self.last = Some(settings);
        true
    }
}
