use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use crate::domain::error::DomainError;
use crate::domain::event::{BookingCancelled, BookingCompleted, BookingConfirmed, DomainEvent};
use crate::domain::model::{
    BookingId, BookingStatus, BookingType, CustomerContact, ExperienceId, GuestComposition,
    PriceQuote, ReservationToken, SlotKey, UserId,
};

/// 予約内容
/// 検証済みのリクエストから作られ、作成後は変更されない
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDetails {
    pub experience_id: ExperienceId,
    pub experience_title: String,
    pub booking_type: BookingType,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub guests: GuestComposition,
    pub add_on_ids: Vec<String>,
    pub customer: CustomerContact,
}

impl BookingDetails {
    /// 対象の時間枠キー
    pub fn slot_key(&self) -> SlotKey {
        SlotKey::new(self.experience_id, self.date, self.time)
    }
}

/// Booking集約
/// 予約のライフサイクルを管理し、確定中の予約が容量1単位に対応することを保証する
#[derive(Debug, Clone)]
pub struct Booking {
    id: BookingId,
    user_id: UserId,
    details: BookingDetails,
    price: PriceQuote,
    reservation: ReservationToken,
    status: BookingStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    domain_events: Vec<DomainEvent>,
}

impl Booking {
    /// 容量予約に成功した予約を確定状態で作成
    pub fn confirm(
        id: BookingId,
        user_id: UserId,
        details: BookingDetails,
        price: PriceQuote,
        reservation: ReservationToken,
    ) -> Self {
        let now = Utc::now();
        let event = BookingConfirmed::new(
            id.clone(),
            user_id.clone(),
            details.slot_key(),
            details.booking_type,
            price.total(),
        );
        Self {
            id,
            user_id,
            details,
            price,
            reservation,
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
            domain_events: vec![DomainEvent::BookingConfirmed(event)],
        }
    }

    /// データベースから取得したデータで予約を再構築
    /// リポジトリでの使用を想定
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: BookingId,
        user_id: UserId,
        details: BookingDetails,
        price: PriceQuote,
        reservation: ReservationToken,
        status: BookingStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            details,
            price,
            reservation,
            status,
            created_at,
            updated_at,
            domain_events: Vec::new(),
        }
    }

    pub fn id(&self) -> &BookingId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn details(&self) -> &BookingDetails {
        &self.details
    }

    pub fn price(&self) -> &PriceQuote {
        &self.price
    }

    pub fn reservation(&self) -> &ReservationToken {
        &self.reservation
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// ドメインイベントを取得してクリア
    pub fn take_domain_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.domain_events)
    }

    /// 予約をキャンセル
    /// 事前条件:
    /// - ステータスがConfirmed
    ///
    /// 容量の解放は呼び出し側（アプリケーションサービス）が予約証票で行う
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.transition_to(BookingStatus::Cancelled)?;
        let event = BookingCancelled::new(
            self.id.clone(),
            self.user_id.clone(),
            self.details.slot_key(),
        );
        self.domain_events.push(DomainEvent::BookingCancelled(event));
        Ok(())
    }

    /// 予約を催行済みにマーク
    /// 事前条件:
    /// - ステータスがConfirmed
    ///
    /// 容量は消費されたまま
    pub fn complete(&mut self) -> Result<(), DomainError> {
        self.transition_to(BookingStatus::Completed)?;
        let event = BookingCompleted::new(self.id.clone());
        self.domain_events.push(DomainEvent::BookingCompleted(event));
        Ok(())
    }

    fn transition_to(&mut self, target: BookingStatus) -> Result<(), DomainError> {
        if self.status != BookingStatus::Confirmed || target == BookingStatus::Confirmed {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }
}
