use crate::core::config::HttpPolicy;
use crate::core::dispatcher::Dispatcher;
use crate::core::errors::DispatchError;
use crate::core::events::EventPublisher;
use crate::core::kernel::{HttpExecutor, HttpExecutorBuilder};
use crate::core::registry::{SenderDiscovery, SenderRegistry};
use crate::core::traits::ErasedSender;
use crate::providers::{aliyun, sangfor, tencent};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Built-in provider adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Tencent,
    Aliyun,
    Sangfor,
}

impl ProviderKind {
    pub const ALL: [Self; 3] = [Self::Tencent, Self::Aliyun, Self::Sangfor];

    fn build(self, executor: Arc<dyn HttpExecutor>) -> Arc<dyn ErasedSender> {
        match self {
            Self::Tencent => Arc::new(tencent::build_sender(executor)),
            Self::Aliyun => Arc::new(aliyun::build_sender(executor)),
            Self::Sangfor => Arc::new(sangfor::build_sender(executor)),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tencent => write!(f, "Tencent Cloud SMS"),
            Self::Aliyun => write!(f, "Aliyun SMS"),
            Self::Sangfor => write!(f, "Sangfor SMS"),
        }
    }
}

/// Discovers the built-in adapters, all sharing one HTTP executor
#[derive(Debug, Clone)]
pub struct BuiltinDiscovery {
    policy: HttpPolicy,
    providers: Vec<ProviderKind>,
}

impl BuiltinDiscovery {
    /// Every built-in provider under `policy`
    pub fn new(policy: HttpPolicy) -> Self {
        Self {
            policy,
            providers: ProviderKind::ALL.to_vec(),
        }
    }

    /// Only the listed providers
    #[must_use]
    pub fn with_providers(mut self, providers: &[ProviderKind]) -> Self {
        self.providers = providers.to_vec();
        self
    }
}

impl SenderDiscovery for BuiltinDiscovery {
    fn discover(&self) -> Result<Vec<Arc<dyn ErasedSender>>, DispatchError> {
        let executor: Arc<dyn HttpExecutor> =
            Arc::new(HttpExecutorBuilder::new(self.policy.clone()).build()?);

        Ok(self
            .providers
            .iter()
            .map(|kind| {
                info!(provider = %kind, "Discovered built-in sender");
                kind.build(Arc::clone(&executor))
            })
            .collect())
    }
}

/// Registry over every built-in adapter plus a fresh event publisher
///
/// The route table is built eagerly so misconfiguration surfaces here.
pub fn create_dispatcher(policy: HttpPolicy) -> Result<Dispatcher, DispatchError> {
    let registry = SenderRegistry::new(BuiltinDiscovery::new(policy));
    registry.register_all()?;
    Ok(Dispatcher::new(
        Arc::new(registry),
        Arc::new(EventPublisher::new()),
    ))
}
