use crate::core::errors::DispatchError;
use crate::core::events::{DispatchEvent, DispatchOutcome, EventPublisher};
use crate::core::kernel::rest::{retry_if, RetryPolicy};
use crate::core::registry::SenderRegistry;
use crate::core::traits::{downcast_sender, MessageSender};
use crate::core::types::{Channel, MessageType, RouteKey};
use crate::core::validation::Validate;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, field, instrument, warn, Span};

/// Per-call dispatch settings
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Inbound correlation id reused as the trace id
    pub correlation_id: Option<String>,
    /// Retry transient failures with a fixed delay
    pub retry: Option<RetryPolicy>,
    /// Interrupts the wait between retries
    pub cancel: Option<CancellationToken>,
}

impl DispatchOptions {
    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    #[must_use]
    pub const fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Public entry point: resolve, time, report, forward
///
/// The provider call runs on the caller's task; only event delivery happens
/// elsewhere. Errors from adapters are returned exactly as produced.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<SenderRegistry>,
    events: Arc<EventPublisher>,
}

impl Dispatcher {
    pub fn new(registry: Arc<SenderRegistry>, events: Arc<EventPublisher>) -> Self {
        Self { registry, events }
    }

    pub fn registry(&self) -> &Arc<SenderRegistry> {
        &self.registry
    }

    pub fn events(&self) -> &Arc<EventPublisher> {
        &self.events
    }

    pub async fn send<S: MessageSender>(
        &self,
        message_type: MessageType,
        channel: &Channel,
        config: &S::Config,
        message: &S::Message,
    ) -> Result<S::Response, DispatchError> {
        self.send_with_options::<S>(
            message_type,
            channel,
            config,
            message,
            &DispatchOptions::default(),
        )
        .await
    }

    /// Send, retrying transport failures under `policy`
    pub async fn send_with_retry<S: MessageSender>(
        &self,
        message_type: MessageType,
        channel: &Channel,
        config: &S::Config,
        message: &S::Message,
        policy: RetryPolicy,
    ) -> Result<S::Response, DispatchError> {
        let options = DispatchOptions::default().with_retry(policy);
        self.send_with_options::<S>(message_type, channel, config, message, &options)
            .await
    }

    #[instrument(
        skip_all,
        fields(route = %RouteKey::new(message_type, channel.clone()), trace_id = field::Empty)
    )]
    pub async fn send_with_options<S: MessageSender>(
        &self,
        message_type: MessageType,
        channel: &Channel,
        config: &S::Config,
        message: &S::Message,
        options: &DispatchOptions,
    ) -> Result<S::Response, DispatchError> {
        config.validate()?;
        message.validate()?;

        let sender = downcast_sender::<S>(self.registry.lookup(message_type, channel)?)?;

        let trace_id = options
            .correlation_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);
        Span::current().record("trace_id", trace_id.as_str());

        let reporter = Reporter {
            events: &self.events,
            adapter: sender.name(),
            route: sender.route_key(),
            message: to_echo(message),
            trace_id,
        };

        let start = Instant::now();
        reporter.emit(DispatchOutcome::Started, None);

        let result = match options.retry {
            Some(policy) => {
                retry_if(
                    |_| sender.send(config, message),
                    policy,
                    options.cancel.as_ref(),
                    DispatchError::is_retryable,
                    |attempt, error| {
                        reporter.emit(
                            DispatchOutcome::Retrying {
                                attempt,
                                error: error.summary(),
                            },
                            Some(start.elapsed()),
                        );
                    },
                )
                .await
            }
            None => sender.send(config, message).await,
        };

        let elapsed = start.elapsed();
        match &result {
            Ok(response) => {
                debug!(elapsed_ms = elapsed.as_millis() as u64, "Dispatch succeeded");
                reporter.emit(
                    DispatchOutcome::Sent {
                        result: to_echo(response),
                    },
                    Some(elapsed),
                );
            }
            Err(error) => {
                warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    code = %error.code(),
                    "Dispatch failed: {}",
                    error
                );
                reporter.emit(
                    DispatchOutcome::Failed {
                        error: error.summary(),
                    },
                    Some(elapsed),
                );
            }
        }

        result
    }
}

/// Builds and publishes the events of one dispatch
struct Reporter<'a> {
    events: &'a EventPublisher,
    adapter: &'static str,
    route: RouteKey,
    message: Value,
    trace_id: String,
}

impl Reporter<'_> {
    /// Best effort: a publish failure never fails the dispatch
    fn emit(&self, outcome: DispatchOutcome, elapsed: Option<Duration>) {
        let mut event = DispatchEvent::new(
            self.adapter,
            self.route.clone(),
            self.message.clone(),
            self.trace_id.clone(),
            outcome,
        );
        event.elapsed = elapsed;

        if let Err(e) = self.events.publish(event) {
            debug!("Dispatch event dropped: {}", e);
        }
    }
}

fn to_echo<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        warn!("Failed to serialize event payload: {}", e);
        Value::Null
    })
}
