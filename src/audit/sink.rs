//! Append-only destinations for audit lines.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Accepts one serialized record per call.
pub trait AuditSink: Send + Sync {
    fn append(&self, line: &str) -> io::Result<()>;
}

/// JSON-lines file, opened in append mode.
///
/// The file is opened lazily and reopened after a failed write, so a log
/// directory that appears later (or a rotated file) is picked up without a
/// restart.
pub struct FileSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> io::Result<File> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        OpenOptions::new().create(true).append(true).open(&self.path)
    }
}

impl AuditSink for FileSink {
    fn append(&self, line: &str) -> io::Result<()> {
        let mut slot = self.file.lock().expect("audit file mutex poisoned");
        if slot.is_none() {
            *slot = Some(self.open()?);
        }

        let result = match slot.as_mut() {
            Some(file) => {
                let mut record = String::with_capacity(line.len() + 1);
                record.push_str(line);
                record.push('\n');
                file.write_all(record.as_bytes()).and_then(|_| file.flush())
            }
            None => Err(io::Error::new(io::ErrorKind::NotFound, "audit file not open")),
        };

        if result.is_err() {
            *slot = None;
        }
        result
    }
}

/// Keeps lines in memory. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("memory sink mutex poisoned").clone()
    }

    /// Make subsequent appends fail, to exercise degradation paths.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl AuditSink for MemorySink {
    fn append(&self, line: &str) -> io::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "sink unavailable"));
        }
        self.lines
            .lock()
            .expect("memory sink mutex poisoned")
            .push(line.to_string());
        Ok(())
    }
}
