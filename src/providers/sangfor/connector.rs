use crate::core::errors::DispatchError;
use crate::core::kernel::{HttpExecutor, ResponseCodec};
use crate::core::traits::MessageSender;
use crate::core::types::{Channel, MessageType};
use crate::providers::sangfor::builder::build_request;
use crate::providers::sangfor::codec::SangforCodec;
use crate::providers::sangfor::types::{SangforSmsConfig, SangforSmsMessage, SangforSmsResponse};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

/// Sangfor SMS gateway adapter, route `SMS:SANGFOR_SMS`
pub struct SangforSmsSender {
    executor: Arc<dyn HttpExecutor>,
}

impl SangforSmsSender {
    pub fn new(executor: Arc<dyn HttpExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl MessageSender for SangforSmsSender {
    type Config = SangforSmsConfig;
    type Message = SangforSmsMessage;
    type Response = SangforSmsResponse;

    fn message_type(&self) -> MessageType {
        MessageType::Sms
    }

    fn channel(&self) -> Channel {
        Channel::SANGFOR_SMS
    }

    fn name(&self) -> &'static str {
        "sangfor-sms"
    }

    #[instrument(skip_all, fields(numbers = message.phones.len()))]
    async fn send(
        &self,
        config: &Self::Config,
        message: &Self::Message,
    ) -> Result<Self::Response, DispatchError> {
        let start = Instant::now();

        let result = async {
            let request = build_request(config, message)?;
            let response = self.executor.execute(request).await?;
            SangforCodec.decode(&response.body)
        }
        .await;

        result
            .inspect(|response| debug!(request_id = ?response.request_id, "Sangfor SMS sent"))
            .map_err(|e| e.context("send", Channel::SANGFOR_SMS.as_str(), start.elapsed()))
    }
}
