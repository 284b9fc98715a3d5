use crate::domain::error::DomainError;
use crate::domain::model::{BookingType, ReservationId, SlotKey};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// 時間枠の容量カウンタ
/// 不変条件: 0 <= current_bookings <= max_capacity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    time: NaiveTime,
    booking_type: BookingType,
    max_capacity: u32,
    current_bookings: u32,
}

impl TimeSlot {
    /// 空の時間枠を作成
    pub fn new(time: NaiveTime, booking_type: BookingType, max_capacity: u32) -> Self {
        Self {
            time,
            booking_type,
            max_capacity,
            current_bookings: 0,
        }
    }

    /// 永続化されたデータから時間枠を再構築
    pub fn reconstruct(
        time: NaiveTime,
        booking_type: BookingType,
        max_capacity: u32,
        current_bookings: u32,
    ) -> Result<Self, DomainError> {
        if current_bookings > max_capacity {
            return Err(DomainError::InvariantViolation(format!(
                "予約数 {} が最大容量 {} を超えています",
                current_bookings, max_capacity
            )));
        }
        Ok(Self {
            time,
            booking_type,
            max_capacity,
            current_bookings,
        })
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    pub fn booking_type(&self) -> BookingType {
        self.booking_type
    }

    pub fn max_capacity(&self) -> u32 {
        self.max_capacity
    }

    pub fn current_bookings(&self) -> u32 {
        self.current_bookings
    }

    /// 空きがあるか（派生値）
    pub fn is_available(&self) -> bool {
        self.current_bookings < self.max_capacity
    }

    /// 容量を予約する
    ///
    /// # Returns
    /// * `Ok(())` - 予約成功
    /// * `Err(DomainError::CapacityExceeded)` - 容量不足（状態は変わらない）
    pub fn reserve(&mut self, units: u32) -> Result<(), DomainError> {
        match self.current_bookings.checked_add(units) {
            Some(next) if next <= self.max_capacity => {
                self.current_bookings = next;
                Ok(())
            }
            _ => Err(DomainError::CapacityExceeded),
        }
    }

    /// 容量を解放する
    /// 0未満になる解放は不変条件違反
    pub fn release(&mut self, units: u32) -> Result<(), DomainError> {
        self.current_bookings = self.current_bookings.checked_sub(units).ok_or_else(|| {
            DomainError::InvariantViolation(format!(
                "予約数 {} から {} 単位は解放できません",
                self.current_bookings, units
            ))
        })?;
        Ok(())
    }
}

/// 時間枠の読み取りビュー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub key: SlotKey,
    pub booking_type: BookingType,
    pub max_capacity: u32,
    pub current_bookings: u32,
    pub available: bool,
}

impl SlotSnapshot {
    pub fn from_slot(key: SlotKey, slot: &TimeSlot) -> Self {
        Self {
            key,
            booking_type: slot.booking_type(),
            max_capacity: slot.max_capacity(),
            current_bookings: slot.current_bookings(),
            available: slot.is_available(),
        }
    }
}

/// 容量予約の証票
/// 予約ごとに一度だけ解放できる
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationToken {
    pub id: ReservationId,
    pub slot: SlotKey,
    pub units: u32,
    pub reserved_at: DateTime<Utc>,
}

impl ReservationToken {
    pub fn new(slot: SlotKey, units: u32) -> Self {
        Self {
            id: ReservationId::new(),
            slot,
            units,
            reserved_at: Utc::now(),
        }
    }
}

/// 1日分の標準スケジュール
/// 09:00 貸切(2) / 10:00 相乗り(5) / 14:00 貸切(2) / 15:00 団体(3)
pub fn default_daily_slots() -> Vec<TimeSlot> {
    [
        (9, BookingType::Private, 2),
        (10, BookingType::Shared, 5),
        (14, BookingType::Private, 2),
        (15, BookingType::Group, 3),
    ]
    .into_iter()
    .filter_map(|(hour, booking_type, capacity)| {
        NaiveTime::from_hms_opt(hour, 0, 0).map(|time| TimeSlot::new(time, booking_type, capacity))
    })
    .collect()
}
