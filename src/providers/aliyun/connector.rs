use crate::core::errors::DispatchError;
use crate::core::kernel::signer::{random_nonce, unix_now};
use crate::core::kernel::{HttpExecutor, ResponseCodec};
use crate::core::traits::MessageSender;
use crate::core::types::{Channel, MessageType};
use crate::providers::aliyun::builder::build_request;
use crate::providers::aliyun::codec::AliyunCodec;
use crate::providers::aliyun::types::{
    AliyunSmsConfig, AliyunSmsMessage, AliyunSmsResponse, ALIYUN_SEND_SMS_ACTION,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

/// Aliyun SMS adapter, route `SMS:ALI_SMS`
pub struct AliyunSmsSender {
    executor: Arc<dyn HttpExecutor>,
}

impl AliyunSmsSender {
    pub fn new(executor: Arc<dyn HttpExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl MessageSender for AliyunSmsSender {
    type Config = AliyunSmsConfig;
    type Message = AliyunSmsMessage;
    type Response = AliyunSmsResponse;

    fn message_type(&self) -> MessageType {
        MessageType::Sms
    }

    fn channel(&self) -> Channel {
        Channel::ALI_SMS
    }

    fn name(&self) -> &'static str {
        "aliyun-sms"
    }

    #[instrument(skip_all, fields(signature = ?config.signature_version))]
    async fn send(
        &self,
        config: &Self::Config,
        message: &Self::Message,
    ) -> Result<Self::Response, DispatchError> {
        let start = Instant::now();

        let result = async {
            let request = build_request(config, message, unix_now(), &random_nonce())?;
            let response = self.executor.execute(request).await?;
            AliyunCodec.decode(&response.body)
        }
        .await;

        match result {
            Ok(response) => {
                debug!(
                    request_id = ?response.request_id,
                    biz_id = ?response.biz_id,
                    "Aliyun SMS sent"
                );
                Ok(response)
            }
            Err(e) => Err(e.context(
                ALIYUN_SEND_SMS_ACTION,
                Channel::ALI_SMS.as_str(),
                start.elapsed(),
            )),
        }
    }
}
