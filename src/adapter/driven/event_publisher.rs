use crate::domain::event::DomainEvent;
use crate::domain::model::{DATE_FORMAT, TIME_FORMAT};
use crate::domain::port::{EventPublisher, PublisherError};
use tracing::info;

/// ログ出力イベント発行者
/// ドメインイベントを構造化ログとして出力する
#[derive(Debug, Default)]
pub struct TracingEventPublisher;

impl TracingEventPublisher {
    /// 新しいログ出力イベント発行者を作成
    pub fn new() -> Self {
        Self
    }
}

impl EventPublisher for TracingEventPublisher {
    fn publish(&self, event: &DomainEvent) -> Result<(), PublisherError> {
        match event {
            DomainEvent::BookingConfirmed(e) => info!(
                target: "experience_booking::events",
                event_type = event.event_type(),
                booking_id = %e.booking_id,
                user_id = %e.user_id,
                experience_id = %e.slot.experience_id,
                date = %e.slot.date.format(DATE_FORMAT),
                time = %e.slot.time.format(TIME_FORMAT),
                booking_type = %e.booking_type,
                total_price = e.total_price.amount(),
                occurred_at = %e.occurred_at,
                "booking confirmed"
            ),
            DomainEvent::BookingCancelled(e) => info!(
                target: "experience_booking::events",
                event_type = event.event_type(),
                booking_id = %e.booking_id,
                user_id = %e.user_id,
                slot = %e.slot,
                occurred_at = %e.occurred_at,
                "booking cancelled"
            ),
            DomainEvent::BookingCompleted(e) => info!(
                target: "experience_booking::events",
                event_type = event.event_type(),
                booking_id = %e.booking_id,
                occurred_at = %e.occurred_at,
                "booking completed"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{BookingCancelled, BookingCompleted, BookingConfirmed};
    use crate::domain::model::{BookingId, BookingType, ExperienceId, Money, SlotKey, UserId};

    fn slot() -> SlotKey {
        SlotKey::parse(ExperienceId::new(1), "2025-02-15", "09:00").unwrap()
    }

    #[test]
    fn test_publish_booking_confirmed_event() {
        let publisher = TracingEventPublisher::new();
        let event = BookingConfirmed::new(
            BookingId::generate(),
            UserId::from_string("user-1").unwrap(),
            slot(),
            BookingType::Private,
            Money::new(5800),
        );

        let result = publisher.publish(&DomainEvent::BookingConfirmed(event));
        assert!(result.is_ok());
    }

    #[test]
    fn test_publish_booking_cancelled_event() {
        let publisher = TracingEventPublisher::new();
        let event = BookingCancelled::new(
            BookingId::generate(),
            UserId::from_string("user-1").unwrap(),
            slot(),
        );

        let result = publisher.publish(&DomainEvent::BookingCancelled(event));
        assert!(result.is_ok());
    }

    #[test]
    fn test_publish_booking_completed_event() {
        let publisher = TracingEventPublisher::new();
        let event = BookingCompleted::new(BookingId::generate());

        let result = publisher.publish(&DomainEvent::BookingCompleted(event));
        assert!(result.is_ok());
    }
}
