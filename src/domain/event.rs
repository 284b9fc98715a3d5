use chrono::{DateTime, Utc};
use crate::domain::model::{BookingId, BookingType, Money, SlotKey, UserId};

/// ドメインイベント列挙型
/// ビジネス上の重要なイベントを表現する
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// 予約が確定された
    BookingConfirmed(BookingConfirmed),
    /// 予約がキャンセルされた
    BookingCancelled(BookingCancelled),
    /// 予約が催行済みになった
    BookingCompleted(BookingCompleted),
}

impl DomainEvent {
    /// イベント種別名
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::BookingConfirmed(_) => "BookingConfirmed",
            DomainEvent::BookingCancelled(_) => "BookingCancelled",
            DomainEvent::BookingCompleted(_) => "BookingCompleted",
        }
    }

    /// 対象の予約ID
    pub fn booking_id(&self) -> &BookingId {
        match self {
            DomainEvent::BookingConfirmed(e) => &e.booking_id,
            DomainEvent::BookingCancelled(e) => &e.booking_id,
            DomainEvent::BookingCompleted(e) => &e.booking_id,
        }
    }
}

/// 予約確定イベント
#[derive(Debug, Clone, PartialEq)]
pub struct BookingConfirmed {
    /// 予約ID
    pub booking_id: BookingId,
    /// 予約者
    pub user_id: UserId,
    /// 対象の時間枠
    pub slot: SlotKey,
    /// 予約タイプ
    pub booking_type: BookingType,
    /// 合計金額
    pub total_price: Money,
    /// イベント発生日時
    pub occurred_at: DateTime<Utc>,
}

impl BookingConfirmed {
    /// 新しい予約確定イベントを作成
    pub fn new(
        booking_id: BookingId,
        user_id: UserId,
        slot: SlotKey,
        booking_type: BookingType,
        total_price: Money,
    ) -> Self {
        Self {
            booking_id,
            user_id,
            slot,
            booking_type,
            total_price,
            occurred_at: Utc::now(),
        }
    }
}

/// 予約キャンセルイベント
#[derive(Debug, Clone, PartialEq)]
pub struct BookingCancelled {
    /// 予約ID
    pub booking_id: BookingId,
    /// 予約者
    pub user_id: UserId,
    /// 容量を解放した時間枠
    pub slot: SlotKey,
    /// イベント発生日時
    pub occurred_at: DateTime<Utc>,
}

impl BookingCancelled {
    /// 新しい予約キャンセルイベントを作成
    pub fn new(booking_id: BookingId, user_id: UserId, slot: SlotKey) -> Self {
        Self {
            booking_id,
            user_id,
            slot,
            occurred_at: Utc::now(),
        }
    }
}

/// 予約催行済みイベント
#[derive(Debug, Clone, PartialEq)]
pub struct BookingCompleted {
    /// 予約ID
    pub booking_id: BookingId,
    /// イベント発生日時
    pub occurred_at: DateTime<Utc>,
}

impl BookingCompleted {
    /// 新しい予約催行済みイベントを作成
    pub fn new(booking_id: BookingId) -> Self {
        Self {
            booking_id,
            occurred_at: Utc::now(),
        }
    }
}
