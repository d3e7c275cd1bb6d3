pub mod core;
pub mod providers;
pub mod utils;

pub use core::{
    config::{HttpPolicy, ProviderCredentials},
    dispatcher::{DispatchOptions, Dispatcher},
    errors::{DispatchError, ErrorKind, ProtocolError},
    events::{DispatchEvent, DispatchOutcome, EventKind, EventListener, EventPublisher},
    kernel::RetryPolicy,
    registry::{SenderDiscovery, SenderRegistry, StaticDiscovery},
    traits::MessageSender,
    types::*,
};
pub use providers::aliyun::AliyunSmsSender;
pub use providers::sangfor::SangforSmsSender;
pub use providers::tencent::TencentSmsSender;
