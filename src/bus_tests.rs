//! Unit tests for the EventBus - transcript change notifications.

#[cfg(test)]
mod bus_tests {
    use crate::bus::{EventBus, TranscriptEvent};
    use crate::transcript::MessageId;

    #[tokio::test]
    async fn test_eventbus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let id = MessageId::new();

        assert_eq!(bus.publish(TranscriptEvent::Updated(id)).unwrap(), 1);
        assert_eq!(rx.recv().await.unwrap(), TranscriptEvent::Updated(id));
    }

    #[tokio::test]
    async fn test_eventbus_multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        let id = MessageId::new();

        bus.publish(TranscriptEvent::Finished(id)).unwrap();

        assert_eq!(rx1.recv().await.unwrap().id(), id);
        assert_eq!(rx2.recv().await.unwrap().id(), id);
    }

    #[test]
    fn test_eventbus_without_subscribers() {
        let bus = EventBus::new(16);
        // Nobody listening is not fatal for publishers
        assert!(bus.publish(TranscriptEvent::Appended(MessageId::new())).is_err());
    }

    #[tokio::test]
    async fn test_eventbus_preserves_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let id = MessageId::new();

        bus.publish(TranscriptEvent::Appended(id)).unwrap();
        bus.publish(TranscriptEvent::Updated(id)).unwrap();
        bus.publish(TranscriptEvent::Finished(id)).unwrap();

        assert_eq!(rx.recv().await.unwrap(), TranscriptEvent::Appended(id));
        assert_eq!(rx.recv().await.unwrap(), TranscriptEvent::Updated(id));
        assert_eq!(rx.recv().await.unwrap(), TranscriptEvent::Finished(id));
    }
}
