use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use models::EventEnvelope;

use crate::errors::ServiceError;
use crate::metrics::EVENT_HANDLER_FAILURES_TOTAL;

#[async_trait]
pub trait ModerationEventHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, envelope: &EventEnvelope) -> Result<(), ServiceError>;
}

/// Outcome of one publish.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Explicit subscription point for moderation events.
///
/// Handlers run sequentially in registration order. A failing handler is
/// logged and counted; it neither stops later handlers nor fails the publisher.
#[derive(Default)]
pub struct ModerationEventBus {
    handlers: RwLock<Vec<Arc<dyn ModerationEventHandler>>>,
}

impl ModerationEventBus {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn subscribe(&self, handler: Arc<dyn ModerationEventHandler>) {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        debug!(handler = handler.name(), "moderation_handler_subscribed");
        handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub async fn publish(&self, envelope: EventEnvelope) -> DispatchReport {
        let handlers: Vec<Arc<dyn ModerationEventHandler>> =
            self.handlers.read().unwrap_or_else(|e| e.into_inner()).clone();

        let mut report = DispatchReport::default();
        for handler in handlers {
            match handler.handle(&envelope).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    EVENT_HANDLER_FAILURES_TOTAL.inc();
                    error!(
                        handler = handler.name(),
                        kind = envelope.event.kind(),
                        target_user_id = envelope.event.target_user_id(),
                        error = %e,
                        "moderation_event_failed"
                    );
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::ModerationEvent;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(AtomicUsize);

    #[async_trait]
    impl ModerationEventHandler for Counting {
        fn name(&self) -> &'static str { "counting" }
        async fn handle(&self, _: &EventEnvelope) -> Result<(), ServiceError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl ModerationEventHandler for Failing {
        fn name(&self) -> &'static str { "failing" }
        async fn handle(&self, _: &EventEnvelope) -> Result<(), ServiceError> {
            Err(ServiceError::not_found("user"))
        }
    }

    #[tokio::test]
    async fn failures_do_not_stop_other_handlers() {
        let bus = ModerationEventBus::new();
        let counting = Arc::new(Counting(AtomicUsize::new(0)));
        bus.subscribe(Arc::new(Failing));
        bus.subscribe(counting.clone());
        assert_eq!(bus.handler_count(), 2);

        let ev = ModerationEvent::WarningIssued { user_id: 1, created_by_id: 2, topic_id: 3 };
        let report = bus.publish(EventEnvelope::new(ev)).await;
        assert_eq!(report, DispatchReport { delivered: 1, failed: 1 });
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    }
}
