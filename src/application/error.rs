use crate::domain::error::{DomainError, PricingError};
use crate::domain::model::{BookingStatus, SlotKey};
use crate::domain::port::{AvailabilityError, RepositoryError};

/// アプリケーション層のエラー型
/// 予約受付・キャンセル・照会で呼び出し側に返すエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApplicationError {
    /// リクエストの形式が不正（状態変更前に検出）
    #[error("Validation failed: {0}")]
    Validation(String),
    /// 料金計算エラー（状態変更前に検出）
    #[error(transparent)]
    Pricing(#[from] PricingError),
    /// 時間枠の残り容量がない
    #[error("Slot is full: {0}")]
    SlotFull(SlotKey),
    /// 対象が存在しない、または参照権限がない
    #[error("Not found: {0}")]
    NotFound(String),
    /// 管理者のみ許可された操作
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// ライフサイクル上許可されない状態遷移
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    /// ストアが応答しない、または接続できない
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    /// 不変条件違反（二重解放など）
    #[error("Internal error: {0}")]
    Internal(String),
    /// 永続化の失敗
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl ApplicationError {
    /// 再試行で回復し得る障害か
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApplicationError::StoreUnavailable(_) | ApplicationError::Repository(_)
        )
    }
}

// From実装でエラー変換を簡潔に
impl From<DomainError> for ApplicationError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidValue(msg) => ApplicationError::Validation(msg),
            DomainError::InvalidTransition { from, to } => {
                ApplicationError::InvalidTransition { from, to }
            }
            DomainError::CapacityExceeded => {
                ApplicationError::Internal("capacity exceeded outside the store".to_string())
            }
            DomainError::InvariantViolation(msg) => ApplicationError::Internal(msg),
        }
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ConnectionFailed(msg) => ApplicationError::StoreUnavailable(msg),
            other => ApplicationError::Repository(other),
        }
    }
}

impl From<AvailabilityError> for ApplicationError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::CapacityExceeded(key) => ApplicationError::SlotFull(key),
            AvailabilityError::SlotNotFound(key) => {
                ApplicationError::NotFound(format!("時間枠が見つかりません: {}", key))
            }
            AvailabilityError::AlreadyReleased(id) => {
                ApplicationError::Internal(format!("予約証票 {} は解放済みです", id))
            }
            AvailabilityError::InvariantViolation(msg) => ApplicationError::Internal(msg),
            AvailabilityError::Store(err) => ApplicationError::from(err),
        }
    }
}
