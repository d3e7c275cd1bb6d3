use crate::core::errors::DispatchError;
use crate::core::kernel::codec::{parse_json, ResponseCodec};
use crate::providers::aliyun::types::AliyunSmsResponse;

/// Decodes `SendSms` bodies; any `Code` other than `OK` is a business error
#[derive(Debug, Clone, Copy, Default)]
pub struct AliyunCodec;

impl ResponseCodec for AliyunCodec {
    type Output = AliyunSmsResponse;

    fn decode(&self, body: &[u8]) -> Result<Self::Output, DispatchError> {
        let response: AliyunSmsResponse = parse_json(body)?;
        if !response.is_ok() {
            return Err(DispatchError::business(
                response.code,
                response.message,
                response.request_id,
            ));
        }
        Ok(response)
    }
}
