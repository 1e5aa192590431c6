//! File watching for hot reload

use crossbeam_channel::Sender;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;

/// Forwards filesystem events for watched files to a channel.
/// notify delivers them from its own thread.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
}

impl FileWatcher {
    pub fn new(tx: Sender<notify::Result<Event>>) -> notify::Result<Self> {
        let watcher = notify::recommended_watcher(move |res| {
            // Receiver gone means the REPL is shutting down
            let _ = tx.send(res);
        })?;

        Ok(Self { watcher })
    }

    pub fn watch<P: AsRef<Path>>(&mut self, path: P) -> notify::Result<()> {
        self.watcher
            .watch(path.as_ref(), RecursiveMode::NonRecursive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_watch_existing_file() {
        let (tx, _rx) = unbounded();
        let mut watcher = FileWatcher::new(tx).unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(watcher.watch(file.path()).is_ok());
    }
}
