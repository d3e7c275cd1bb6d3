use crate::core::errors::ErrorSummary;
use crate::core::types::RouteKey;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Lifecycle stage a listener can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Started,
    Sent,
    Failed,
    Retrying,
}

impl EventKind {
    pub const ALL: [Self; 4] = [Self::Started, Self::Sent, Self::Failed, Self::Retrying];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Started => "started",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Retrying => "retrying",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Started,
    Sent { result: Value },
    Failed { error: ErrorSummary },
    Retrying { attempt: u32, error: ErrorSummary },
}

impl DispatchOutcome {
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Started => EventKind::Started,
            Self::Sent { .. } => EventKind::Sent,
            Self::Failed { .. } => EventKind::Failed,
            Self::Retrying { .. } => EventKind::Retrying,
        }
    }
}

/// Immutable record of one step of one dispatch
#[derive(Debug, Clone, Serialize)]
pub struct DispatchEvent {
    pub event_id: String,
    /// Adapter name
    pub adapter: &'static str,
    pub route: RouteKey,
    /// Echo of the outbound message
    pub message: Value,
    pub outcome: DispatchOutcome,
    pub timestamp: DateTime<Utc>,
    pub trace_id: String,
    /// Time since the dispatch started; absent on `Started`
    pub elapsed: Option<Duration>,
}

impl DispatchEvent {
    pub fn new(
        adapter: &'static str,
        route: RouteKey,
        message: Value,
        trace_id: impl Into<String>,
        outcome: DispatchOutcome,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            adapter,
            route,
            message,
            outcome,
            timestamp: Utc::now(),
            trace_id: trace_id.into(),
            elapsed: None,
        }
    }

    pub const fn kind(&self) -> EventKind {
        self.outcome.kind()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("Event publisher has been shut down")]
    ShutDown,

    #[error("No tokio runtime available to run event listeners")]
    NoRuntime,
}

/// Observer of dispatch lifecycle events
///
/// Runs on a worker task, never on the dispatching task. Errors and panics
/// are logged and discarded.
#[async_trait]
pub trait EventListener: Send + Sync + 'static {
    async fn on_event(&self, event: Arc<DispatchEvent>) -> anyhow::Result<()>;
}

struct Subscription {
    listener: Arc<dyn EventListener>,
    kinds: Vec<EventKind>,
    queue: mpsc::UnboundedSender<Arc<DispatchEvent>>,
}

fn same_listener(a: &Arc<dyn EventListener>, b: &Arc<dyn EventListener>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

/// Asynchronous fan-out of dispatch events
///
/// Each registered listener gets its own queue and worker task, so
/// `publish` only enqueues and returns immediately, and a listener sees
/// events in publish order. The subscription list is copy-on-write: publish
/// reads a snapshot and never waits on register or unregister.
pub struct EventPublisher {
    subscriptions: ArcSwap<Vec<Arc<Subscription>>>,
    writer: Mutex<()>,
    tracker: TaskTracker,
    cancel: CancellationToken,
    shut_down: AtomicBool,
}

impl fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPublisher")
            .field("listeners", &self.listener_count())
            .field("shut_down", &self.is_shutdown())
            .finish_non_exhaustive()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            subscriptions: ArcSwap::from_pointee(Vec::new()),
            writer: Mutex::new(()),
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Subscribe `listener` to events of `kind`
    ///
    /// Registering an already known listener for another kind widens its
    /// filter; it keeps its queue and worker.
    pub fn register(
        &self,
        kind: EventKind,
        listener: Arc<dyn EventListener>,
    ) -> Result<(), EventError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_shutdown() {
            return Err(EventError::ShutDown);
        }

        let current = self.subscriptions.load_full();
        let mut next: Vec<Arc<Subscription>> = current.as_ref().clone();

        if let Some(pos) = next.iter().position(|s| same_listener(&s.listener, &listener)) {
            if next[pos].kinds.contains(&kind) {
                return Ok(());
            }
            let mut kinds = next[pos].kinds.clone();
            kinds.push(kind);
            next[pos] = Arc::new(Subscription {
                listener,
                kinds,
                queue: next[pos].queue.clone(),
            });
        } else {
            let handle = Handle::try_current().map_err(|_| EventError::NoRuntime)?;
            let (queue, rx) = mpsc::unbounded_channel();
            self.tracker.spawn_on(
                run_listener(listener.clone(), rx, self.cancel.clone()),
                &handle,
            );
            next.push(Arc::new(Subscription {
                listener,
                kinds: vec![kind],
                queue,
            }));
        }

        self.subscriptions.store(Arc::new(next));
        debug!(%kind, "Event listener registered");
        Ok(())
    }

    /// Remove `listener` from every kind; returns whether it was registered
    ///
    /// Events already queued for it are still delivered.
    pub fn unregister(&self, listener: &Arc<dyn EventListener>) -> bool {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.subscriptions.load_full();
        let next: Vec<Arc<Subscription>> = current
            .iter()
            .filter(|s| !same_listener(&s.listener, listener))
            .cloned()
            .collect();
        let removed = next.len() != current.len();
        if removed {
            self.subscriptions.store(Arc::new(next));
        }
        removed
    }

    /// Enqueue `event` for every matching listener
    ///
    /// Returns the number of listeners the event was queued for.
    pub fn publish(&self, event: DispatchEvent) -> Result<usize, EventError> {
        if self.is_shutdown() {
            return Err(EventError::ShutDown);
        }

        let kind = event.kind();
        let event = Arc::new(event);
        let mut queued = 0;
        for subscription in self.subscriptions.load().iter() {
            if subscription.kinds.contains(&kind) && subscription.queue.send(event.clone()).is_ok()
            {
                queued += 1;
            }
        }
        Ok(queued)
    }

    /// Stop accepting work and drain outstanding deliveries
    ///
    /// Waits up to `grace` for queued events to be delivered, then cancels
    /// whatever is still running. Returns `true` if everything drained.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        {
            let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
            self.shut_down.store(true, Ordering::SeqCst);
            // dropping the senders lets each worker finish its queue and exit
            self.subscriptions.store(Arc::new(Vec::new()));
        }
        self.tracker.close();

        let drained = tokio::time::timeout(grace, self.tracker.wait())
            .await
            .is_ok();
        if drained {
            info!("Event publisher drained");
        } else {
            warn!(
                pending = self.tracker.len(),
                grace_ms = grace.as_millis() as u64,
                "Event listeners did not finish within grace period; cancelling"
            );
            self.cancel.cancel();
        }
        drained
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions.load().len()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

async fn run_listener(
    listener: Arc<dyn EventListener>,
    mut queue: mpsc::UnboundedReceiver<Arc<DispatchEvent>>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = queue.recv() => match next {
                Some(event) => event,
                None => break,
            },
        };

        let kind = event.kind();
        let trace_id = event.trace_id.clone();
        let delivery = AssertUnwindSafe(listener.on_event(event)).catch_unwind();
        let result = tokio::select! {
            () = cancel.cancelled() => break,
            result = delivery => result,
        };

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(%kind, %trace_id, "Event listener failed: {:#}", e),
            Err(_) => warn!(%kind, %trace_id, "Event listener panicked"),
        }
    }
}

const LOG_MESSAGE_LIMIT: usize = 200;

/// Logs every event it receives, with the message echo truncated
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

impl LoggingListener {
    fn message_preview(message: &Value) -> String {
        let text = message.to_string();
        if text.chars().count() <= LOG_MESSAGE_LIMIT {
            return text;
        }
        let mut preview: String = text.chars().take(LOG_MESSAGE_LIMIT).collect();
        preview.push_str("...");
        preview
    }
}

#[async_trait]
impl EventListener for LoggingListener {
    async fn on_event(&self, event: Arc<DispatchEvent>) -> anyhow::Result<()> {
        let message = Self::message_preview(&event.message);
        let elapsed_ms = event.elapsed.map_or(0, |d| d.as_millis() as u64);

        match &event.outcome {
            DispatchOutcome::Started => debug!(
                trace_id = %event.trace_id,
                route = %event.route,
                adapter = event.adapter,
                "Dispatch started: {}",
                message
            ),
            DispatchOutcome::Sent { .. } => info!(
                trace_id = %event.trace_id,
                route = %event.route,
                adapter = event.adapter,
                elapsed_ms,
                "Message sent: {}",
                message
            ),
            DispatchOutcome::Failed { error } => warn!(
                trace_id = %event.trace_id,
                route = %event.route,
                adapter = event.adapter,
                elapsed_ms,
                code = %error.code,
                "Message failed: {} ({})",
                error.message,
                message
            ),
            DispatchOutcome::Retrying { attempt, error } => info!(
                trace_id = %event.trace_id,
                route = %event.route,
                attempt,
                code = %error.code,
                "Retrying dispatch"
            ),
        }
        Ok(())
    }
}
