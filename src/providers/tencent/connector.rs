use crate::core::errors::DispatchError;
use crate::core::kernel::signer::unix_now;
use crate::core::kernel::{HttpExecutor, ResponseCodec};
use crate::core::traits::MessageSender;
use crate::core::types::{Channel, MessageType};
use crate::providers::tencent::builder::build_request;
use crate::providers::tencent::codec::TencentCodec;
use crate::providers::tencent::types::{TencentSmsConfig, TencentSmsMessage, TencentSmsResponse};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Tencent Cloud SMS adapter, route `SMS:TENCENT_SMS`
pub struct TencentSmsSender {
    executor: Arc<dyn HttpExecutor>,
}

impl TencentSmsSender {
    pub fn new(executor: Arc<dyn HttpExecutor>) -> Self {
        Self { executor }
    }

    async fn call(
        &self,
        config: &TencentSmsConfig,
        message: &TencentSmsMessage,
    ) -> Result<TencentSmsResponse, DispatchError> {
        let request = build_request(config, message, unix_now())?;
        let response = self.executor.execute(request).await?;
        TencentCodec.decode(&response.body)
    }
}

#[async_trait]
impl MessageSender for TencentSmsSender {
    type Config = TencentSmsConfig;
    type Message = TencentSmsMessage;
    type Response = TencentSmsResponse;

    fn message_type(&self) -> MessageType {
        MessageType::Sms
    }

    fn channel(&self) -> Channel {
        Channel::TENCENT_SMS
    }

    fn name(&self) -> &'static str {
        "tencent-sms"
    }

    #[instrument(
        skip_all,
        fields(action = %message.action, numbers = message.phone_numbers.len())
    )]
    async fn send(
        &self,
        config: &Self::Config,
        message: &Self::Message,
    ) -> Result<Self::Response, DispatchError> {
        let start = Instant::now();

        match self.call(config, message).await {
            Ok(response) => {
                let failed = response.failed().count();
                if failed > 0 {
                    warn!(
                        request_id = %response.request_id,
                        failed,
                        "Tencent accepted the request but some numbers were rejected"
                    );
                } else {
                    debug!(request_id = %response.request_id, "Tencent SMS sent");
                }
                Ok(response)
            }
            Err(e) => Err(e.context(
                message.action.as_str(),
                Channel::TENCENT_SMS.as_str(),
                start.elapsed(),
            )),
        }
    }
}
