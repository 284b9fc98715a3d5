use crate::application::service::bounded;
use crate::application::{ApplicationError, Requester};
use crate::domain::model::{Booking, BookingId, BookingStatus, ExperienceId};
use crate::domain::port::{BookingFilter, BookingRepository};
use std::sync::Arc;
use std::time::Duration;

/// 予約クエリサービス
/// 読み取り専用の予約操作を提供する
pub struct BookingQueryService {
    booking_repository: Arc<dyn BookingRepository>,
    store_timeout: Duration,
}

impl BookingQueryService {
    /// 新しい予約クエリサービスを作成
    ///
    /// # Arguments
    /// * `booking_repository` - 予約リポジトリ
    /// * `store_timeout` - ストア呼び出し1回あたりの制限時間
    pub fn new(booking_repository: Arc<dyn BookingRepository>, store_timeout: Duration) -> Self {
        Self {
            booking_repository,
            store_timeout,
        }
    }

    /// 予約IDで予約を取得
    /// 所有者でも管理者でもない場合は存在しないものとして扱う
    ///
    /// # Returns
    /// * `Ok(Booking)` - 予約
    /// * `Err(ApplicationError::NotFound)` - 見つからない
    pub async fn get_booking(
        &self,
        booking_id: &str,
        requester: &Requester,
    ) -> Result<Booking, ApplicationError> {
        let id = BookingId::from_string(booking_id)?;
        bounded(
            self.store_timeout,
            "find_booking",
            self.booking_repository.find_by_id(&id),
        )
        .await?
        .filter(|booking| requester.can_access(booking))
        .ok_or_else(|| ApplicationError::NotFound(format!("予約が見つかりません: {}", id)))
    }

    /// 呼び出し元自身の予約を取得
    /// 作成日時の降順で並べて返す
    pub async fn list_own_bookings(
        &self,
        requester: &Requester,
    ) -> Result<Vec<Booking>, ApplicationError> {
        let filter = BookingFilter {
            user_id: Some(requester.user_id.clone()),
            ..BookingFilter::default()
        };
        bounded(
            self.store_timeout,
            "find_bookings",
            self.booking_repository.find_by_filter(&filter),
        )
        .await
    }

    /// すべての予約を取得（管理者のみ）
    ///
    /// # Arguments
    /// * `status` - ステータスでの絞り込み（文字列）
    /// * `experience_id` - 体験での絞り込み
    ///
    /// # Returns
    /// * `Ok(Vec<Booking>)` - 作成日時の降順の予約
    /// * `Err(ApplicationError::Forbidden)` - 管理者でない
    pub async fn list_all_bookings(
        &self,
        requester: &Requester,
        status: Option<&str>,
        experience_id: Option<i64>,
    ) -> Result<Vec<Booking>, ApplicationError> {
        if !requester.is_admin {
            return Err(ApplicationError::Forbidden(
                "全予約の参照は管理者のみ可能です".to_string(),
            ));
        }
        let status = status.map(BookingStatus::from_string).transpose()?;
        let filter = BookingFilter {
            user_id: None,
            status,
            experience_id: experience_id.map(ExperienceId::new),
        };
        bounded(
            self.store_timeout,
            "find_bookings",
            self.booking_repository.find_by_filter(&filter),
        )
        .await
    }
}
