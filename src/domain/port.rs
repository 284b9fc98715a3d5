// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::event::DomainEvent;
use crate::domain::model::{
    Booking, BookingId, BookingStatus, Experience, ExperienceId, ReservationId,
    ReservationToken, SlotKey, SlotSnapshot, TimeSlot, UserId,
};
use async_trait::async_trait;
use chrono::NaiveDate;

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗（一時的な障害）
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// 操作に失敗
    #[error("Operation failed: {0}")]
    OperationFailed(String),
    /// データの取得に失敗
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
}

/// 予約一覧の絞り込み条件
/// すべてNoneなら全件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFilter {
    pub user_id: Option<UserId>,
    pub status: Option<BookingStatus>,
    pub experience_id: Option<ExperienceId>,
}

impl BookingFilter {
    /// 条件に一致するか
    pub fn matches(&self, booking: &Booking) -> bool {
        self.user_id.as_ref().map_or(true, |id| booking.user_id() == id)
            && self.status.map_or(true, |status| booking.status() == status)
            && self
                .experience_id
                .map_or(true, |id| booking.details().experience_id == id)
    }
}

/// 予約リポジトリトレイト
/// 予約集約の永続化を抽象化する
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// 新しい予約を保存する
    ///
    /// # Returns
    /// * `Ok(())` - 保存成功
    /// * `Err(RepositoryError)` - 保存失敗（呼び出し側が容量予約を補償する）
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError>;

    /// 予約IDで予約を検索する
    async fn find_by_id(&self, booking_id: &BookingId) -> Result<Option<Booking>, RepositoryError>;

    /// 条件に一致する予約を取得する
    /// 作成日時の降順で並べて返す
    async fn find_by_filter(&self, filter: &BookingFilter) -> Result<Vec<Booking>, RepositoryError>;

    /// ステータスを条件付きで更新する
    /// 保存済みのステータスが`expected`の場合のみ`booking`のステータスと更新日時を書き込む
    ///
    /// # Returns
    /// * `Ok(true)` - 更新した
    /// * `Ok(false)` - 既に別のステータスだった（並行更新に負けた）
    async fn update_status(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<bool, RepositoryError>;

    /// 新しい一意の予約IDを生成する
    fn next_identity(&self) -> BookingId;
}

/// 空き枠ストアのエラー型
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AvailabilityError {
    /// 残り容量不足（状態は変更されていない）
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(SlotKey),
    /// 時間枠が存在しない
    #[error("Slot not found: {0}")]
    SlotNotFound(SlotKey),
    /// 同じ予約証票の二重解放
    #[error("Reservation already released: {0}")]
    AlreadyReleased(ReservationId),
    /// カウンタの不変条件違反
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
    /// 永続化層の失敗
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// 空き枠ストアトレイト
/// 時間枠ごとの容量カウンタを所有し、唯一の変更経路を提供する
///
/// 実装は同じSlotKeyに対する操作を線形化しなければならない
/// （条件付きインクリメント、またはキー単位のロック）
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// 証票の容量を原子的に予約し、証票を台帳に記録する
    /// 証票IDは呼び出し側が発行するため、応答が失われても結果を照会できる
    ///
    /// # Arguments
    /// * `token` - 予約する時間枠と単位数を持つ証票
    ///
    /// # Returns
    /// * `Ok(())` - 予約成功
    /// * `Err(AvailabilityError::CapacityExceeded)` - 容量不足（状態は変わらない）
    /// * `Err(AvailabilityError::SlotNotFound)` - 時間枠が存在しない
    async fn try_reserve(&self, token: &ReservationToken) -> Result<(), AvailabilityError>;

    /// 予約証票の容量を解放する
    /// 証票ごとに一度だけ成功する
    async fn release(&self, token: &ReservationToken) -> Result<(), AvailabilityError>;

    /// 証票が予約済みで、まだ解放されていないかどうか
    async fn is_reserved(&self, reservation_id: ReservationId) -> Result<bool, AvailabilityError>;

    /// 時間枠の現在の状態を取得する
    async fn peek(&self, slot: SlotKey) -> Result<SlotSnapshot, AvailabilityError>;

    /// 指定日の時間枠を時刻の昇順で取得する
    async fn list_slots(
        &self,
        experience_id: ExperienceId,
        date: NaiveDate,
    ) -> Result<Vec<SlotSnapshot>, AvailabilityError>;

    /// 時間枠を登録する
    /// 既に存在する時刻の枠は変更しない
    ///
    /// # Returns
    /// * 新たに登録した枠の数
    async fn seed_slots(
        &self,
        experience_id: ExperienceId,
        date: NaiveDate,
        slots: &[TimeSlot],
    ) -> Result<u32, AvailabilityError>;
}

/// 体験カタログトレイト
/// カタログ（外部コンポーネント）からの読み取り専用アクセス
#[async_trait]
pub trait ExperienceCatalog: Send + Sync {
    /// IDで体験を取得する
    async fn get_experience(
        &self,
        experience_id: ExperienceId,
    ) -> Result<Option<Experience>, RepositoryError>;
}

/// イベント発行エラー
#[derive(Debug, thiserror::Error)]
pub enum PublisherError {
    #[error("Event publishing failed: {0}")]
    PublishingFailed(String),
}

/// イベント発行者トレイト
/// 確定済みの変更に対するドメインイベントを外部へ通知する
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &DomainEvent) -> Result<(), PublisherError>;
}
