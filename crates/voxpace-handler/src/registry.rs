use crate::handler_trait::ResultHandler;
use std::collections::HashMap;
use voxpace_core::config::HandlerConfig;
use voxpace_core::HandlerError;

pub struct HandlerRegistry {
    factories: HashMap<String, fn() -> Box<dyn ResultHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("console", || {
            Box::new(crate::console_handler::ConsoleHandler::new())
        });
        registry.register("file", || Box::new(crate::file_handler::FileHandler::new()));
        registry
    }

    pub fn register(&mut self, name: &str, factory: fn() -> Box<dyn ResultHandler>) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn ResultHandler>, HandlerError> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| HandlerError::NotFound(name.to_string()))
    }

    /// Create and initialise one handler per config entry, in order.
    pub async fn build_all(
        &self,
        configs: &[HandlerConfig],
    ) -> Result<Vec<Box<dyn ResultHandler>>, HandlerError> {
        let mut handlers = Vec::with_capacity(configs.len());
        for config in configs {
            let mut handler = self.create(&config.plugin)?;
            handler.initialize(config.extra.clone()).await?;
            tracing::debug!(handler = %config.plugin, "result handler ready");
            handlers.push(handler);
        }
        Ok(handlers)
    }

    pub fn list_handlers(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
