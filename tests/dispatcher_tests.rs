mod common;

use async_trait::async_trait;
use common::{next_event, CannedResponse, ChannelListener, MockServer};
use relayx::core::events::{DispatchEvent, EventListener};
use relayx::core::kernel::HttpExecutorBuilder;
use relayx::core::traits::ErasedSender;
use relayx::providers::aliyun::AliyunSmsSender;
use relayx::providers::tencent::{self, TencentSmsConfig, TencentSmsMessage};
use relayx::{
    Channel, DispatchOptions, DispatchOutcome, Dispatcher, EventKind, EventPublisher,
    HttpPolicy, MessageType, ProviderCredentials, RetryPolicy, SenderRegistry, StaticDiscovery,
    TencentSmsSender,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const TENCENT_OK: &str = r#"{"Response":{"SendStatusSet":[{"SerialNo":"5000:1","PhoneNumber":"+8613800138000","Fee":1,"Code":"Ok","Message":"send success"}],"RequestId":"req-ok"}}"#;
const TENCENT_ERR: &str = r#"{"Response":{"Error":{"Code":"LimitExceeded.PhoneNumberThirtySecondLimit","Message":"too frequent"},"RequestId":"req-limit"}}"#;

fn dispatcher(policy: HttpPolicy) -> Dispatcher {
    let executor = Arc::new(HttpExecutorBuilder::new(policy).build().unwrap());
    let registry = SenderRegistry::new(
        StaticDiscovery::new().with(tencent::build_sender(executor)),
    );
    Dispatcher::new(Arc::new(registry), Arc::new(EventPublisher::new()))
}

fn subscribe_all(dispatcher: &Dispatcher) -> mpsc::UnboundedReceiver<Arc<DispatchEvent>> {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener: Arc<dyn EventListener> = Arc::new(ChannelListener(tx));
    for kind in EventKind::ALL {
        dispatcher.events().register(kind, listener.clone()).unwrap();
    }
    rx
}

fn config(server: &MockServer) -> TencentSmsConfig {
    TencentSmsConfig::new(
        ProviderCredentials::new("AKIDEXAMPLE", "test-secret-key"),
        "1400000000",
        "ap-guangzhou",
        "Acme",
    )
    .with_endpoint(server.url())
}

fn message() -> TencentSmsMessage {
    TencentSmsMessage::new("449739")
        .add_phone("+8613800138000")
        .unwrap()
        .add_param("1234")
}

struct Sleepy;

#[async_trait]
impl EventListener for Sleepy {
    async fn on_event(&self, _event: Arc<DispatchEvent>) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_success_emits_started_then_sent() {
        let server = MockServer::start(vec![CannedResponse::json(200, TENCENT_OK)]).await;
        let dispatcher = dispatcher(HttpPolicy::default());
        let mut events = subscribe_all(&dispatcher);

        let options = DispatchOptions::default().with_correlation_id("corr-42");
        let response = dispatcher
            .send_with_options::<TencentSmsSender>(
                MessageType::Sms,
                &Channel::TENCENT_SMS,
                &config(&server),
                &message(),
                &options,
            )
            .await
            .unwrap();
        assert_eq!(response.request_id, "req-ok");

        let started = next_event(&mut events).await;
        let sent = next_event(&mut events).await;
        assert_eq!(started.kind(), EventKind::Started);
        assert_eq!(sent.kind(), EventKind::Sent);
        assert_eq!(started.trace_id, "corr-42");
        assert_eq!(sent.trace_id, "corr-42");
        assert_eq!(sent.route.to_string(), "SMS:TENCENT_SMS");
        assert_eq!(sent.adapter, "tencent-sms");
        assert_eq!(started.message["template_id"], "449739");
        match &sent.outcome {
            DispatchOutcome::Sent { result } => assert_eq!(result["RequestId"], "req-ok"),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_business_failure_is_returned_and_reported() {
        let server = MockServer::start(vec![CannedResponse::json(200, TENCENT_ERR)]).await;
        let dispatcher = dispatcher(HttpPolicy::default());
        let mut events = subscribe_all(&dispatcher);

        let err = dispatcher
            .send_with_retry::<TencentSmsSender>(
                MessageType::Sms,
                &Channel::TENCENT_SMS,
                &config(&server),
                &message(),
                RetryPolicy::new(3, Duration::from_millis(10)),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "LimitExceeded.PhoneNumberThirtySecondLimit");
        assert_eq!(server.hits(), 1, "business errors are not retried");

        assert_eq!(next_event(&mut events).await.kind(), EventKind::Started);
        let failed = next_event(&mut events).await;
        match &failed.outcome {
            DispatchOutcome::Failed { error } => {
                assert_eq!(error.code, "LimitExceeded.PhoneNumberThirtySecondLimit");
                assert_eq!(error.request_id.as_deref(), Some("req-limit"));
                assert!(!error.retryable);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_timeout_is_retried() {
        let server = MockServer::start(vec![
            CannedResponse::json(200, TENCENT_OK).delayed(Duration::from_secs(2)),
            CannedResponse::json(200, TENCENT_OK),
        ])
        .await;
        let dispatcher =
            dispatcher(HttpPolicy::default().with_call_timeout(Duration::from_millis(200)));
        let mut events = subscribe_all(&dispatcher);

        dispatcher
            .send_with_retry::<TencentSmsSender>(
                MessageType::Sms,
                &Channel::TENCENT_SMS,
                &config(&server),
                &message(),
                RetryPolicy::new(3, Duration::from_millis(10)),
            )
            .await
            .unwrap();
        assert_eq!(server.hits(), 2);

        let kinds = [
            next_event(&mut events).await.kind(),
            next_event(&mut events).await.kind(),
            next_event(&mut events).await.kind(),
        ];
        assert_eq!(
            kinds,
            [EventKind::Started, EventKind::Retrying, EventKind::Sent]
        );
    }

    #[tokio::test]
    async fn test_http_status_errors_are_not_retried() {
        let server = MockServer::start(vec![CannedResponse::json(503, "busy")]).await;
        let dispatcher = dispatcher(HttpPolicy::default());

        let err = dispatcher
            .send_with_retry::<TencentSmsSender>(
                MessageType::Sms,
                &Channel::TENCENT_SMS,
                &config(&server),
                &message(),
                RetryPolicy::new(3, Duration::from_millis(10)),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "HTTP_503");
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_invalid_message_never_reaches_the_wire() {
        let server = MockServer::start(vec![CannedResponse::json(200, TENCENT_OK)]).await;
        let dispatcher = dispatcher(HttpPolicy::default());

        let err = dispatcher
            .send::<TencentSmsSender>(
                MessageType::Sms,
                &Channel::TENCENT_SMS,
                &config(&server),
                &TencentSmsMessage::new("449739"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(server.hits(), 0);
    }

    #[tokio::test]
    async fn test_wrong_adapter_type_is_configuration_error() {
        let dispatcher = dispatcher(HttpPolicy::default());
        let executor = Arc::new(HttpExecutorBuilder::new(HttpPolicy::default()).build().unwrap());
        let aliyun = AliyunSmsSender::new(executor);
        assert_eq!(aliyun.route().to_string(), "SMS:ALI_SMS");

        let config = relayx::providers::aliyun::AliyunSmsConfig::new(
            ProviderCredentials::new("id", "secret"),
            "Acme",
            "cn-hangzhou",
        );
        let message = relayx::providers::aliyun::AliyunSmsMessage::new("SMS_1").add_phone("1");

        let err = dispatcher
            .send::<AliyunSmsSender>(MessageType::Sms, &Channel::TENCENT_SMS, &config, &message)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");

        let err = dispatcher
            .send::<AliyunSmsSender>(MessageType::Sms, &Channel::ALI_SMS, &config, &message)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ROUTE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_slow_listener_does_not_delay_dispatch() {
        let server = MockServer::start(vec![CannedResponse::json(200, TENCENT_OK)]).await;
        let dispatcher = dispatcher(HttpPolicy::default());
        for kind in EventKind::ALL {
            dispatcher.events().register(kind, Arc::new(Sleepy)).unwrap();
        }

        let start = Instant::now();
        for _ in 0..5 {
            dispatcher
                .send::<TencentSmsSender>(
                    MessageType::Sms,
                    &Channel::TENCENT_SMS,
                    &config(&server),
                    &message(),
                )
                .await
                .unwrap();
        }
        assert!(start.elapsed() < Duration::from_secs(2));

        let drained = dispatcher.events().shutdown(Duration::from_millis(100)).await;
        assert!(!drained);
    }
}
