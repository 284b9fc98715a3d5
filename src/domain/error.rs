use crate::domain::model::{BookingStatus, BookingType};

/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// 無効な値（例: 日付形式が不正、必須項目が空）
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// ライフサイクル上許可されない状態遷移
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    /// 枠の残り容量を超える予約
    #[error("Capacity exceeded")]
    CapacityExceeded,
    /// 不変条件違反（例: 予約数が0未満になる解放）
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

/// 料金計算のエラー型
/// いずれも予約処理の状態変更前に検出される
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// 体験が提供していない、または無効化された予約タイプ
    #[error("Booking type not supported: {0}")]
    BookingTypeUnsupported(BookingType),
    /// 人数構成が料金ルールに合わない
    #[error("Invalid guest composition: {0}")]
    InvalidGuestComposition(String),
    /// 存在しない、または無効なアドオン
    #[error("Unknown add-on: {0}")]
    UnknownAddOn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_display() {
        let err = DomainError::InvalidTransition {
            from: BookingStatus::Cancelled,
            to: BookingStatus::Completed,
        };
        assert_eq!(err.to_string(), "Invalid transition: cancelled -> completed");
    }

    #[test]
    fn test_pricing_error_display() {
        let err = PricingError::BookingTypeUnsupported(BookingType::Group);
        assert_eq!(err.to_string(), "Booking type not supported: group");
        let err = PricingError::UnknownAddOn("addon-9".to_string());
        assert_eq!(err.to_string(), "Unknown add-on: addon-9");
    }
}
