use crate::core::{
    errors::DispatchError,
    types::{Channel, MessageType, RouteKey},
    validation::Validate,
};
use async_trait::async_trait;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// One provider adapter, serving exactly one `(type, channel)` route
///
/// The adapter owns its request and response shapes. It composes signing,
/// HTTP execution and response decoding behind `send`, and must hold no
/// per-call state so one instance can serve concurrent dispatches.
#[async_trait]
pub trait MessageSender: Send + Sync + 'static {
    /// Provider credentials and routing settings
    type Config: Validate + Send + Sync;
    /// The message as the caller builds it
    type Message: Validate + Serialize + Send + Sync;
    /// Typed success payload
    type Response: Serialize + Send;

    fn message_type(&self) -> MessageType;

    fn channel(&self) -> Channel;

    /// Human-readable adapter name used in logs and events
    fn name(&self) -> &'static str;

    fn route_key(&self) -> RouteKey {
        RouteKey::new(self.message_type(), self.channel())
    }

    async fn send(
        &self,
        config: &Self::Config,
        message: &Self::Message,
    ) -> Result<Self::Response, DispatchError>;
}

/// Type-erased adapter handle stored by the registry
pub trait ErasedSender: Send + Sync + 'static {
    fn route(&self) -> RouteKey;

    fn adapter_name(&self) -> &'static str;

    /// Recover the concrete adapter through a checked downcast
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl fmt::Debug for dyn ErasedSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedSender")
            .field("route", &self.route().to_string())
            .field("adapter", &self.adapter_name())
            .finish()
    }
}

impl<S: MessageSender> ErasedSender for S {
    fn route(&self) -> RouteKey {
        self.route_key()
    }

    fn adapter_name(&self) -> &'static str {
        self.name()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Resolve an erased handle back to adapter type `S`
///
/// A route served by a different adapter type is a configuration error.
pub fn downcast_sender<S: MessageSender>(
    sender: Arc<dyn ErasedSender>,
) -> Result<Arc<S>, DispatchError> {
    let route = sender.route();
    let name = sender.adapter_name();
    sender.into_any().downcast::<S>().map_err(|_| {
        DispatchError::configuration(format!(
            "Route {} is served by {}, not {}",
            route,
            name,
            std::any::type_name::<S>()
        ))
    })
}
