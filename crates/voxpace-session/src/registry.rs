use crate::session_trait::StreamingClient;
use std::collections::BTreeMap;
use voxpace_core::SessionError;

/// Streaming client factories keyed by plugin name, iterated in name order.
pub struct ClientRegistry {
    factories: BTreeMap<String, fn() -> Box<dyn StreamingClient>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: BTreeMap::new(),
        };
        registry.register("loopback", || {
            Box::new(crate::loopback_client::LoopbackClient::new())
        });
        registry
    }

    pub fn register(&mut self, name: &str, factory: fn() -> Box<dyn StreamingClient>) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn StreamingClient>, SessionError> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| SessionError::ClientNotFound(name.to_string()))
    }

    pub fn list_clients(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
