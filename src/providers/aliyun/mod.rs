pub mod codec;
pub mod signer;
pub mod types;

pub mod builder;
pub mod connector;

// Re-export main components
pub use builder::{build_request, build_sender, build_sender_with_policy};
pub use codec::AliyunCodec;
pub use connector::AliyunSmsSender;
pub use signer::{AliyunAcs3Signer, AliyunRpcSigner};
pub use types::{AliyunSignatureVersion, AliyunSmsConfig, AliyunSmsMessage, AliyunSmsResponse};
