use std::{fs::OpenOptions, io::Write, path::Path, sync::Mutex};

use tracing::warn;

use crate::trace::trace::RunEvent;

/// Append-only JSONL journal of engine events.
///
/// Journal problems are logged and swallowed; they never fail a run.
pub struct RunJournal {
    file: Option<Mutex<std::fs::File>>,
}

impl RunJournal {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path);

        match file {
            Ok(f) => Self {
                file: Some(Mutex::new(f)),
            },
            Err(e) => {
                warn!("could not open run journal '{}': {}", path.display(), e);
                Self { file: None }
            }
        }
    }

    /// Journal that drops every event.
    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn log(&self, event: &RunEvent) {
        let file_mutex = match &self.file {
            Some(f) => f,
            None => return,
        };

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                warn!("failed to serialize run event: {}", e);
                return;
            }
        };

        let mut file = match file_mutex.lock() {
            Ok(f) => f,
            Err(e) => {
                warn!("run journal lock poisoned: {}", e);
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", json) {
            warn!("failed to write run event: {}", e);
        }
    }
}

impl Default for RunJournal {
    fn default() -> Self {
        Self::disabled()
    }
}
