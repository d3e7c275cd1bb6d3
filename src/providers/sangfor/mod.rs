pub mod codec;
pub mod types;

pub mod builder;
pub mod connector;

pub use builder::{build_request, build_sender, build_sender_with_policy};
pub use codec::SangforCodec;
pub use connector::SangforSmsSender;
pub use types::{SangforSmsConfig, SangforSmsMessage, SangforSmsResponse};
