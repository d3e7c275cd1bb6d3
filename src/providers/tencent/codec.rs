use crate::core::errors::DispatchError;
use crate::core::kernel::codec::{parse_json, ResponseCodec};
use crate::providers::tencent::types::{TencentEnvelope, TencentErrorBody, TencentSmsResponse};

/// Decodes `{"Response": {...}}` bodies, surfacing `Response.Error` first
#[derive(Debug, Clone, Copy, Default)]
pub struct TencentCodec;

impl ResponseCodec for TencentCodec {
    type Output = TencentSmsResponse;

    fn decode(&self, body: &[u8]) -> Result<Self::Output, DispatchError> {
        let probe: TencentEnvelope<TencentErrorBody> = parse_json(body)?;
        if let Some(error) = probe.response.error {
            return Err(DispatchError::business(
                error.code,
                error.message,
                probe.response.request_id,
            ));
        }

        let envelope: TencentEnvelope<TencentSmsResponse> = parse_json(body)?;
        Ok(envelope.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;

    #[test]
    fn test_decode_success() {
        let body = br#"{"Response":{"SendStatusSet":[{"SerialNo":"5000:1045710669157053657849499619","PhoneNumber":"+8618511122233","Fee":1,"SessionContext":"test","Code":"Ok","Message":"send success","IsoCode":"CN"}],"RequestId":"a0aabda6-cf91-4f3e-a81f-9198114a2279"}}"#;
        let response = TencentCodec.decode(body).unwrap();
        assert_eq!(response.request_id, "a0aabda6-cf91-4f3e-a81f-9198114a2279");
        assert_eq!(response.send_status_set.len(), 1);
        assert!(response.all_ok());
    }

    #[test]
    fn test_business_error_detected_first() {
        let body = br#"{"Response":{"Error":{"Code":"AuthFailure.SignatureFailure","Message":"The provided credentials could not be validated."},"RequestId":"req-42"}}"#;
        let err = TencentCodec.decode(body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Business);
        assert_eq!(err.code(), "AuthFailure.SignatureFailure");
        assert_eq!(err.request_id(), Some("req-42"));
    }

    #[test]
    fn test_per_number_failures_are_reported() {
        let body = br#"{"Response":{"SendStatusSet":[{"PhoneNumber":"+8613800000000","Code":"LimitExceeded.PhoneNumberDailyLimit","Message":"limit"}],"RequestId":"r"}}"#;
        let response = TencentCodec.decode(body).unwrap();
        assert!(!response.all_ok());
        assert_eq!(response.failed().count(), 1);
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        let err = TencentCodec.decode(b"<html>gateway</html>").unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
        let err = TencentCodec.decode(br#"{"Response":{}}"#).unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
    }
}
