use crate::domain::model::{Booking, BookingId, BookingStatus};
use crate::domain::port::{BookingFilter, BookingRepository, RepositoryError};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// インメモリ予約リポジトリ
/// 開発環境とテストで使用する
#[derive(Debug, Default)]
pub struct InMemoryBookingRepository {
    bookings: DashMap<BookingId, Booking>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError> {
        match self.bookings.entry(booking.id().clone()) {
            Entry::Occupied(_) => Err(RepositoryError::OperationFailed(format!(
                "予約IDが重複しています: {}",
                booking.id()
            ))),
            Entry::Vacant(vacant) => {
                let mut stored = booking.clone();
                // 未発行のイベントは保存しない
                stored.take_domain_events();
                vacant.insert(stored);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, booking_id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        Ok(self.bookings.get(booking_id).map(|entry| entry.value().clone()))
    }

    async fn find_by_filter(&self, filter: &BookingFilter) -> Result<Vec<Booking>, RepositoryError> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        bookings.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(bookings)
    }

    async fn update_status(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<bool, RepositoryError> {
        let mut entry = self.bookings.get_mut(booking.id()).ok_or_else(|| {
            RepositoryError::OperationFailed(format!("予約が見つかりません: {}", booking.id()))
        })?;
        if entry.status() != expected {
            return Ok(false);
        }
        let mut stored = booking.clone();
        // 未発行のイベントは保存しない
        stored.take_domain_events();
        *entry = stored;
        Ok(true)
    }

    fn next_identity(&self) -> BookingId {
        BookingId::generate()
    }
}
