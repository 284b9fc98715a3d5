use crate::domain::model::{
    ExperienceId, ReservationId, ReservationToken, SlotKey, SlotSnapshot, TimeSlot,
};
use crate::domain::port::{AvailabilityError, AvailabilityStore};
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::error;

/// インメモリ空き枠ストア
/// 時間枠ごとのカウンタをDashMapのエントリロックで直列化する
/// 開発環境とテストで使用する
#[derive(Debug, Default)]
pub struct InMemoryAvailabilityStore {
    slots: DashMap<SlotKey, TimeSlot>,
    /// 未解放の予約証票（解放は一度だけ）
    reservations: DashMap<ReservationId, ReservationToken>,
}

impl InMemoryAvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 未解放の予約証票の数
    pub fn outstanding_reservations(&self) -> usize {
        self.reservations.len()
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryAvailabilityStore {
    async fn try_reserve(&self, token: &ReservationToken) -> Result<(), AvailabilityError> {
        // エントリのロックを保持したまま判定と加算を行う
        let mut entry = self
            .slots
            .get_mut(&token.slot)
            .ok_or(AvailabilityError::SlotNotFound(token.slot))?;
        if self.reservations.contains_key(&token.id) {
            return Err(AvailabilityError::InvariantViolation(format!(
                "reservation {} is already held",
                token.id
            )));
        }
        entry
            .reserve(token.units)
            .map_err(|_| AvailabilityError::CapacityExceeded(token.slot))?;

        self.reservations.insert(token.id, token.clone());
        Ok(())
    }

    async fn release(&self, token: &ReservationToken) -> Result<(), AvailabilityError> {
        // 時間枠のロックを取ってから証票を消費する
        let mut entry = self
            .slots
            .get_mut(&token.slot)
            .ok_or(AvailabilityError::SlotNotFound(token.slot))?;

        let units = match self.reservations.get(&token.id) {
            Some(held) if held.slot == token.slot => held.units,
            Some(held) => {
                return Err(AvailabilityError::InvariantViolation(format!(
                    "reservation {} belongs to {}",
                    token.id, held.slot
                )))
            }
            None => return Err(AvailabilityError::AlreadyReleased(token.id)),
        };

        entry.release(units).map_err(|e| {
            error!(slot = %token.slot, reservation_id = %token.id, error = %e, "release below zero");
            AvailabilityError::InvariantViolation(e.to_string())
        })?;
        self.reservations.remove(&token.id);
        Ok(())
    }

    async fn is_reserved(&self, reservation_id: ReservationId) -> Result<bool, AvailabilityError> {
        Ok(self.reservations.contains_key(&reservation_id))
    }

    async fn peek(&self, slot: SlotKey) -> Result<SlotSnapshot, AvailabilityError> {
        self.slots
            .get(&slot)
            .map(|entry| SlotSnapshot::from_slot(slot, entry.value()))
            .ok_or(AvailabilityError::SlotNotFound(slot))
    }

    async fn list_slots(
        &self,
        experience_id: ExperienceId,
        date: NaiveDate,
    ) -> Result<Vec<SlotSnapshot>, AvailabilityError> {
        let mut snapshots: Vec<SlotSnapshot> = self
            .slots
            .iter()
            .filter(|entry| entry.key().experience_id == experience_id && entry.key().date == date)
            .map(|entry| SlotSnapshot::from_slot(*entry.key(), entry.value()))
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.key.time);
        Ok(snapshots)
    }

    async fn seed_slots(
        &self,
        experience_id: ExperienceId,
        date: NaiveDate,
        slots: &[TimeSlot],
    ) -> Result<u32, AvailabilityError> {
        let mut created = 0;
        for slot in slots {
            let key = SlotKey::new(experience_id, date, slot.time());
            if let Entry::Vacant(vacant) = self.slots.entry(key) {
                vacant.insert(slot.clone());
                created += 1;
            }
        }
        Ok(created)
    }
}
