use async_trait::async_trait;
use voxpace_core::{HandlerError, TranscriptLine};

/// Receives every transcript alternative the endpoint emits.
///
/// Implementations are registered via [`HandlerRegistry`](crate::HandlerRegistry)
/// and are called once per alternative, in arrival order, by the
/// [`EventDrainer`](crate::EventDrainer).
#[async_trait]
pub trait ResultHandler: Send + Sync {
    /// Returns the handler's plugin name (e.g. `"console"`, `"file"`).
    fn name(&self) -> &str;
    /// One-time initialisation with handler-specific TOML configuration.
    async fn initialize(&mut self, config: toml::Value) -> Result<(), HandlerError>;
    /// Render one alternative together with its result metadata.
    async fn handle(&self, line: &TranscriptLine) -> Result<(), HandlerError>;
    /// Flush and release resources.
    async fn shutdown(&self) -> Result<(), HandlerError>;
}

/// `elapsed result_id start end is_partial text`, joined by `separator`.
pub fn format_line(line: &TranscriptLine, separator: &str) -> String {
    [
        format!("{:.3}", line.elapsed_secs()),
        line.result_id.clone(),
        line.start_time.to_string(),
        line.end_time.to_string(),
        line.is_partial.to_string(),
        line.text.clone(),
    ]
    .join(separator)
}

pub(crate) fn separator_from(config: &toml::Value, default: &str) -> Result<String, HandlerError> {
    match config.get("separator") {
        None => Ok(default.to_string()),
        Some(value) => value.as_str().map(str::to_string).ok_or_else(|| {
            HandlerError::InitializationFailed("'separator' must be a string".to_string())
        }),
    }
}
