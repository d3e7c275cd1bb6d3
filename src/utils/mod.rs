pub mod logging;
pub mod sender_factory;

pub use logging::{init_tracing, LogFormat};
pub use sender_factory::{create_dispatcher, BuiltinDiscovery, ProviderKind};
