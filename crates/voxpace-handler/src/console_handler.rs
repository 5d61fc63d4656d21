use crate::handler_trait::{format_line, separator_from, ResultHandler};
use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use voxpace_core::{HandlerError, TranscriptLine};

/// Prints one line per alternative to stdout.
pub struct ConsoleHandler {
    separator: String,
    line_count: AtomicUsize,
}

impl ConsoleHandler {
    pub fn new() -> Self {
        Self {
            separator: " ".to_string(),
            line_count: AtomicUsize::new(0),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_count.load(Ordering::Relaxed)
    }
}

impl Default for ConsoleHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultHandler for ConsoleHandler {
    fn name(&self) -> &str {
        "console"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), HandlerError> {
        self.separator = separator_from(&config, " ")?;
        Ok(())
    }

    async fn handle(&self, line: &TranscriptLine) -> Result<(), HandlerError> {
        let rendered = format_line(line, &self.separator);
        writeln!(std::io::stdout().lock(), "{rendered}")
            .map_err(|e| HandlerError::WriteFailed(e.to_string()))?;
        self.line_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), HandlerError> {
        std::io::stdout()
            .flush()
            .map_err(|e| HandlerError::WriteFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_console_handler_name() {
        assert_eq!(ConsoleHandler::new().name(), "console");
    }

    #[tokio::test]
    async fn test_console_handler_counts_lines() {
        let handler = ConsoleHandler::new();
        let line = TranscriptLine {
            elapsed: Duration::from_millis(10),
            result_id: "r".to_string(),
            start_time: 0.0,
            end_time: 0.1,
            is_partial: true,
            text: "console test".to_string(),
        };
        handler.handle(&line).await.unwrap();
        handler.handle(&line).await.unwrap();
        assert_eq!(handler.line_count(), 2);
        assert!(handler.shutdown().await.is_ok());
    }

    #[tokio::test]
    async fn test_console_handler_rejects_bad_separator() {
        let mut handler = ConsoleHandler::new();
        let config = toml::Value::Table({
            let mut t = toml::map::Map::new();
            t.insert("separator".to_string(), toml::Value::Boolean(true));
            t
        });
        match handler.initialize(config).await {
            Err(HandlerError::InitializationFailed(msg)) => assert!(msg.contains("separator")),
            other => panic!("expected InitializationFailed, got {other:?}"),
        }
    }
}
