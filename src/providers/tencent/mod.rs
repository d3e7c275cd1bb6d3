pub mod codec;
pub mod signer;
pub mod types;

pub mod builder;
pub mod connector;

// Re-export main components
pub use builder::{build_request, build_sender, build_sender_with_policy};
pub use codec::TencentCodec;
pub use connector::TencentSmsSender;
pub use signer::TencentSigner;
pub use types::{
    SendStatus, TencentSmsAction, TencentSmsConfig, TencentSmsMessage, TencentSmsResponse,
};
