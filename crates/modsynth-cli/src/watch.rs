//! Patch file watching for hot reload.
//!
//! Editors save in many ways (write in place, write-and-rename, delete and
//! recreate), so the watcher observes the patch's parent directory and
//! filters events by file name. Bursts of events from a single save are
//! coalesced by the receiver with [`PatchWatcher::settle`].

use crossbeam_channel::{Receiver, bounded};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Watches one patch file and signals when it may have changed.
pub struct PatchWatcher {
    _watcher: RecommendedWatcher,
    changes: Receiver<()>,
}

impl PatchWatcher {
    /// Start watching `path`.
    pub fn new(path: &Path) -> anyhow::Result<Self> {
        let target = path.to_path_buf();
        let (tx, rx) = bounded(16);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) if concerns(&event, &target) => {
                    // A full channel already holds a pending reload.
                    let _ = tx.try_send(());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "watch error"),
            }
        })?;

        let dir = watch_dir(path);
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(dir = %dir.display(), "watching for patch changes");

        Ok(Self {
            _watcher: watcher,
            changes: rx,
        })
    }

    /// Change signals.
    pub fn changes(&self) -> &Receiver<()> {
        &self.changes
    }

    /// Wait `quiet` and drop any further signals from the same save.
    pub fn settle(&self, quiet: Duration) {
        std::thread::sleep(quiet);
        self.changes.try_iter().for_each(drop);
    }
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// True if `event` may have changed `target`.
fn concerns(event: &Event, target: &Path) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Any
    );
    relevant
        && (event.paths.is_empty()
            || event
                .paths
                .iter()
                .any(|p| p == target || p.file_name() == target.file_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn modify_of_target_counts() {
        let target = Path::new("/patches/lead.toml");
        assert!(concerns(
            &event(EventKind::Modify(ModifyKind::Any), "/patches/lead.toml"),
            target
        ));
        assert!(concerns(
            &event(EventKind::Create(CreateKind::File), "/patches/lead.toml"),
            target
        ));
    }

    #[test]
    fn other_files_and_removals_are_ignored() {
        let target = Path::new("/patches/lead.toml");
        assert!(!concerns(
            &event(EventKind::Modify(ModifyKind::Any), "/patches/bass.toml"),
            target
        ));
        assert!(!concerns(
            &event(EventKind::Remove(RemoveKind::File), "/patches/lead.toml"),
            target
        ));
    }

    #[test]
    fn bare_file_name_watches_current_dir() {
        assert_eq!(watch_dir(Path::new("lead.toml")), PathBuf::from("."));
        assert_eq!(watch_dir(Path::new("p/lead.toml")), PathBuf::from("p"));
    }
}
