//! Explicit registration of event handlers.
//!
//! The composition root registers every handler once at startup, then selects
//! the one to serve by name. Nothing is registered implicitly.

use std::collections::BTreeMap;
use std::sync::Arc;

use alerting::{AlertForwarder, FunctionName};
use async_trait::async_trait;
use thiserror::Error;

use crate::CloudEvent;

/// Error returned by a handler; rendered into the HTTP 500 body.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Processes one CloudEvent per call.
#[async_trait]
pub trait CloudEventHandler: Send + Sync {
    /// Handles a single event. Any error fails the delivery.
    async fn handle(&self, event: CloudEvent) -> Result<(), HandlerError>;
}

#[async_trait]
impl CloudEventHandler for AlertForwarder {
    async fn handle(&self, event: CloudEvent) -> Result<(), HandlerError> {
        self.forward(&event.data).await.map_err(Into::into)
    }
}

/// Registration mistakes detected at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A function was registered with an empty name.
    #[error("function name must not be empty")]
    EmptyName,

    /// A second function was registered under an existing name.
    #[error("function '{0}' is already registered")]
    Duplicate(String),

    /// The requested target was never registered.
    #[error("function '{name}' is not registered (registered: {registered:?})")]
    UnknownTarget {
        /// Requested name.
        name: String,
        /// Names that are registered.
        registered: Vec<String>,
    },
}

/// Named CloudEvent handlers available to the server.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<FunctionName, Arc<dyn CloudEventHandler>>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`.
    pub fn register_cloud_event(
        &mut self,
        name: &str,
        handler: Arc<dyn CloudEventHandler>,
    ) -> Result<&mut Self, RegistryError> {
        let name = FunctionName::new(name.trim()).ok_or(RegistryError::EmptyName)?;
        if self.functions.contains_key(&name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        tracing::debug!(function = %name, "Registered CloudEvent function");
        self.functions.insert(name, handler);
        Ok(self)
    }

    /// Returns registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.functions.keys().map(ToString::to_string).collect()
    }

    /// Looks up the handler registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn CloudEventHandler>, RegistryError> {
        FunctionName::new(name.trim())
            .and_then(|key| self.functions.get(&key).cloned())
            .ok_or_else(|| RegistryError::UnknownTarget {
                name: name.to_string(),
                registered: self.names(),
            })
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}
