use crate::core::errors::DispatchError;
use crate::core::kernel::codec::{parse_json, ResponseCodec};
use crate::providers::sangfor::types::SangforSmsResponse;

/// Non-zero `code` is a business error
#[derive(Debug, Clone, Copy, Default)]
pub struct SangforCodec;

impl ResponseCodec for SangforCodec {
    type Output = SangforSmsResponse;

    fn decode(&self, body: &[u8]) -> Result<Self::Output, DispatchError> {
        let response: SangforSmsResponse = parse_json(body)?;
        if response.code != 0 {
            return Err(DispatchError::business(
                response.code.to_string(),
                response.msg,
                response.request_id,
            ));
        }
        Ok(response)
    }
}
