use crate::core::errors::DispatchError;
use crate::core::traits::{ErasedSender, MessageSender};
use crate::core::types::{Channel, MessageType, RouteKey};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

type RouteTable = HashMap<RouteKey, Arc<dyn ErasedSender>>;

/// Source of every adapter instance available to the registry
pub trait SenderDiscovery: Send + Sync {
    fn discover(&self) -> Result<Vec<Arc<dyn ErasedSender>>, DispatchError>;
}

impl<F> SenderDiscovery for F
where
    F: Fn() -> Result<Vec<Arc<dyn ErasedSender>>, DispatchError> + Send + Sync,
{
    fn discover(&self) -> Result<Vec<Arc<dyn ErasedSender>>, DispatchError> {
        self()
    }
}

/// Explicit list of adapters
#[derive(Default)]
pub struct StaticDiscovery {
    senders: Vec<Arc<dyn ErasedSender>>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<S: MessageSender>(mut self, sender: S) -> Self {
        self.senders.push(Arc::new(sender));
        self
    }

    #[must_use]
    pub fn with_shared(mut self, sender: Arc<dyn ErasedSender>) -> Self {
        self.senders.push(sender);
        self
    }
}

impl SenderDiscovery for StaticDiscovery {
    fn discover(&self) -> Result<Vec<Arc<dyn ErasedSender>>, DispatchError> {
        Ok(self.senders.clone())
    }
}

/// Route table built once from a discovery source
///
/// Discovery runs exactly once, on the first `register_all` or lookup;
/// concurrent callers wait for that single run. Afterwards the table is
/// read-only and lookups take no locks. A failed discovery is cached and
/// reported identically on every later call.
pub struct SenderRegistry {
    discovery: Box<dyn SenderDiscovery>,
    table: OnceLock<Result<RouteTable, String>>,
}

impl fmt::Debug for SenderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderRegistry")
            .field("initialized", &self.table.get().is_some())
            .finish_non_exhaustive()
    }
}

impl SenderRegistry {
    pub fn new(discovery: impl SenderDiscovery + 'static) -> Self {
        Self {
            discovery: Box::new(discovery),
            table: OnceLock::new(),
        }
    }

    /// Run discovery (once) and return the number of registered routes
    pub fn register_all(&self) -> Result<usize, DispatchError> {
        self.table().map(HashMap::len)
    }

    pub fn lookup(
        &self,
        message_type: MessageType,
        channel: &Channel,
    ) -> Result<Arc<dyn ErasedSender>, DispatchError> {
        let key = RouteKey::new(message_type, channel.clone());
        self.table()?
            .get(&key)
            .cloned()
            .ok_or(DispatchError::RouteNotFound(key))
    }

    /// Lookup by raw tokens, e.g. `("sms", "tencent_sms")`
    pub fn lookup_str(
        &self,
        message_type: &str,
        channel: &str,
    ) -> Result<Arc<dyn ErasedSender>, DispatchError> {
        let key = RouteKey::from_tokens(message_type, channel)?;
        self.lookup(key.message_type, &key.channel)
    }

    /// Sorted snapshot of `(route, adapter name)`
    pub fn list(&self) -> Result<Vec<(RouteKey, &'static str)>, DispatchError> {
        let mut routes: Vec<_> = self
            .table()?
            .iter()
            .map(|(key, sender)| (key.clone(), sender.adapter_name()))
            .collect();
        routes.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(routes)
    }

    fn table(&self) -> Result<&RouteTable, DispatchError> {
        self.table
            .get_or_init(|| build_table(self.discovery.as_ref()))
            .as_ref()
            .map_err(|message| DispatchError::Configuration(message.clone()))
    }
}

fn build_table(discovery: &dyn SenderDiscovery) -> Result<RouteTable, String> {
    let senders = discovery.discover().map_err(|e| e.to_string())?;

    if senders.is_empty() {
        warn!("Sender discovery found no adapters; every lookup will fail");
    }

    let mut table = RouteTable::with_capacity(senders.len());
    for sender in senders {
        let key = sender.route();
        if let Some(existing) = table.get(&key) {
            let mut names = [existing.adapter_name(), sender.adapter_name()];
            names.sort_unstable();
            return Err(format!(
                "Duplicate sender for route {}: {} and {}",
                key, names[0], names[1]
            ));
        }
        info!(route = %key, adapter = sender.adapter_name(), "Registered sender");
        table.insert(key, sender);
    }

    Ok(table)
}
