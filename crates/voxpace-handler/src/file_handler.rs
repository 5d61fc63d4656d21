use crate::handler_trait::{format_line, separator_from, ResultHandler};
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use voxpace_core::{HandlerError, TranscriptLine};

/// Appends one line per alternative to a file.
pub struct FileHandler {
    output_path: Mutex<Option<PathBuf>>,
    separator: String,
    line_count: AtomicUsize,
}

impl FileHandler {
    pub fn new() -> Self {
        Self {
            output_path: Mutex::new(None),
            separator: "\t".to_string(),
            line_count: AtomicUsize::new(0),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_count.load(Ordering::Relaxed)
    }

    fn path(&self) -> Option<PathBuf> {
        self.output_path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for FileHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultHandler for FileHandler {
    fn name(&self) -> &str {
        "file"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), HandlerError> {
        let path = config
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                HandlerError::InitializationFailed("missing 'path' in config".to_string())
            })?;
        self.separator = separator_from(&config, "\t")?;
        *self
            .output_path
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(PathBuf::from(path));
        Ok(())
    }

    async fn handle(&self, line: &TranscriptLine) -> Result<(), HandlerError> {
        let path = self
            .path()
            .ok_or_else(|| HandlerError::WriteFailed("not initialized".to_string()))?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| HandlerError::WriteFailed(format!("{}: {e}", path.display())))?;

        writeln!(file, "{}", format_line(line, &self.separator))
            .map_err(|e| HandlerError::WriteFailed(e.to_string()))?;

        self.line_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), HandlerError> {
        Ok(())
    }
}
