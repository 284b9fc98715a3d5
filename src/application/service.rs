pub mod booking_query_service;

use crate::application::{AdmissionRequest, ApplicationError, QuoteRequest, Requester};
use crate::domain::event::DomainEvent;
use crate::domain::model::{
    default_daily_slots, parse_date, Booking, BookingId, BookingStatus, Experience, ExperienceId,
    PriceQuote, ReservationId, ReservationToken, SlotKey, SlotSnapshot,
};
use crate::domain::port::{
    AvailabilityError, AvailabilityStore, BookingRepository, EventPublisher, ExperienceCatalog,
};
use crate::domain::service::PricingCalculator;
use chrono::Duration as DateDuration;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

pub use booking_query_service::BookingQueryService;

/// 1件の予約が消費する容量
/// 団体予約も1単位として数える
pub const UNITS_PER_BOOKING: u32 = 1;

/// 一度に登録できる最大日数
pub const MAX_SEED_DAYS: u32 = 366;

/// 結果が不明な書き込みを照会するときの試行回数
const RECONCILE_ATTEMPTS: u32 = 3;
const RECONCILE_BACKOFF: Duration = Duration::from_millis(50);

/// ストア呼び出しを時間制限付きで実行する
/// 期限切れは再試行せずStoreUnavailableとして返す
pub(crate) async fn bounded<T, E, F>(
    limit: Duration,
    operation: &'static str,
    future: F,
) -> Result<T, ApplicationError>
where
    F: Future<Output = Result<T, E>>,
    ApplicationError: From<E>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result.map_err(ApplicationError::from),
        Err(_) => {
            warn!(operation, timeout_ms = limit.as_millis() as u64, "store call timed out");
            Err(ApplicationError::StoreUnavailable(format!(
                "{} timed out",
                operation
            )))
        }
    }
}

/// 一時的な障害をStoreUnavailableにまとめる
fn unavailable(err: ApplicationError) -> ApplicationError {
    match err {
        ApplicationError::StoreUnavailable(_) => err,
        other => ApplicationError::StoreUnavailable(other.to_string()),
    }
}

/// 応答を受け取れなかった予約の保存有無を照会する
/// 同じ予約証票を持つ予約が保存されていればtrue
async fn find_persisted(
    bookings: &dyn BookingRepository,
    limit: Duration,
    booking: &Booking,
) -> Result<bool, ApplicationError> {
    let mut attempt = 1;
    loop {
        match bounded(limit, "find_booking", bookings.find_by_id(booking.id())).await {
            Ok(found) => {
                return Ok(found
                    .is_some_and(|stored| stored.reservation().id == booking.reservation().id))
            }
            Err(err) if attempt < RECONCILE_ATTEMPTS => {
                warn!(attempt, error = %err, "booking lookup failed, retrying");
                tokio::time::sleep(RECONCILE_BACKOFF * attempt).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// 予約証票が台帳上で未解放のまま残っているかを照会する
async fn reservation_held(
    availability: &dyn AvailabilityStore,
    limit: Duration,
    reservation_id: ReservationId,
) -> Result<bool, ApplicationError> {
    let mut attempt = 1;
    loop {
        match bounded(limit, "is_reserved", availability.is_reserved(reservation_id)).await {
            Ok(held) => return Ok(held),
            Err(err) if attempt < RECONCILE_ATTEMPTS => {
                warn!(attempt, %reservation_id, error = %err, "reservation lookup failed, retrying");
                tokio::time::sleep(RECONCILE_BACKOFF * attempt).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// 予約証票を解放する
/// 同じ証票が既に解放されていれば何もしない
async fn release_reservation(
    availability: &dyn AvailabilityStore,
    limit: Duration,
    token: &ReservationToken,
) -> Result<(), ApplicationError> {
    let release = async {
        match availability.release(token).await {
            Err(AvailabilityError::AlreadyReleased(id)) => {
                info!(reservation_id = %id, "reservation already released");
                Ok(())
            }
            other => other,
        }
    };
    bounded(limit, "release", release).await
}

/// 補償として予約証票を解放する
/// 解放の応答が失われた場合は台帳で結果を確かめ、未解放なら解放をやり直す
async fn compensate(
    availability: &dyn AvailabilityStore,
    limit: Duration,
    token: &ReservationToken,
) {
    for attempt in 1..=RECONCILE_ATTEMPTS {
        let err = match release_reservation(availability, limit, token).await {
            Ok(()) => return,
            Err(err) if err.is_transient() => err,
            Err(err) => {
                error!(reservation_id = %token.id, error = %err, "compensating release failed");
                return;
            }
        };
        match reservation_held(availability, limit, token.id).await {
            Ok(false) => return,
            Ok(true) => warn!(
                attempt,
                reservation_id = %token.id,
                error = %err,
                "compensating release failed, retrying"
            ),
            Err(check_err) => {
                error!(
                    reservation_id = %token.id,
                    error = %err,
                    check_error = %check_err,
                    "compensating release outcome unknown"
                );
                return;
            }
        }
    }
    error!(reservation_id = %token.id, "compensating release failed");
}

/// 確定済みの変更に対するイベントを発行する
/// 発行の失敗はログに残すだけで、呼び出し元の結果は変えない
fn publish_events(publisher: &dyn EventPublisher, events: Vec<DomainEvent>) {
    for event in events {
        if let Err(err) = publisher.publish(&event) {
            warn!(
                event_type = event.event_type(),
                booking_id = %event.booking_id(),
                error = %err,
                "failed to publish domain event"
            );
        }
    }
}

async fn load_experience(
    catalog: &dyn ExperienceCatalog,
    limit: Duration,
    experience_id: ExperienceId,
) -> Result<Experience, ApplicationError> {
    bounded(limit, "get_experience", catalog.get_experience(experience_id))
        .await?
        .ok_or_else(|| {
            ApplicationError::NotFound(format!("体験が見つかりません: {}", experience_id))
        })
}

/// 予約受付アプリケーションサービス
/// 検証・料金計算・容量予約・永続化を一つの流れとして実行する
#[derive(Clone)]
pub struct BookingAdmissionService {
    catalog: Arc<dyn ExperienceCatalog>,
    availability: Arc<dyn AvailabilityStore>,
    bookings: Arc<dyn BookingRepository>,
    publisher: Arc<dyn EventPublisher>,
    store_timeout: Duration,
}

impl BookingAdmissionService {
    /// 新しい予約受付サービスを作成
    ///
    /// # Arguments
    /// * `catalog` - 体験カタログ
    /// * `availability` - 空き枠ストア
    /// * `bookings` - 予約リポジトリ
    /// * `publisher` - イベント発行者
    /// * `store_timeout` - ストア呼び出し1回あたりの制限時間
    pub fn new(
        catalog: Arc<dyn ExperienceCatalog>,
        availability: Arc<dyn AvailabilityStore>,
        bookings: Arc<dyn BookingRepository>,
        publisher: Arc<dyn EventPublisher>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            availability,
            bookings,
            publisher,
            store_timeout,
        }
    }

    /// 予約を受け付ける
    ///
    /// 容量予約を開始した後の処理は別タスクで実行されるため、
    /// 呼び出し側のFutureが破棄されても成功または補償済みの失敗まで進む
    ///
    /// # Arguments
    /// * `request` - 未検証の予約リクエスト
    /// * `requester` - 呼び出し元
    ///
    /// # Returns
    /// * `Ok(Booking)` - 確定した予約
    /// * `Err(ApplicationError)` - 検証・料金・満席・ストア障害
    pub async fn admit(
        &self,
        request: AdmissionRequest,
        requester: &Requester,
    ) -> Result<Booking, ApplicationError> {
        let correlation_id = Uuid::new_v4();
        let span = info_span!(
            "admit",
            %correlation_id,
            experience_id = request.experience_id,
            booking_id = tracing::field::Empty,
        );
        self.admit_inner(request, requester.clone())
            .instrument(span)
            .await
    }

    async fn admit_inner(
        &self,
        request: AdmissionRequest,
        requester: Requester,
    ) -> Result<Booking, ApplicationError> {
        let validated = request.validate()?;
        let experience =
            load_experience(self.catalog.as_ref(), self.store_timeout, validated.slot.experience_id)
                .await?;

        let price = PricingCalculator::compute_total(
            &experience,
            validated.booking_type,
            &validated.guests,
            &validated.add_on_ids,
        )?;

        let snapshot = bounded(
            self.store_timeout,
            "peek",
            self.availability.peek(validated.slot),
        )
        .await?;
        if snapshot.booking_type != validated.booking_type {
            return Err(ApplicationError::Validation(format!(
                "時間枠 {} は {} 予約用です",
                validated.slot, snapshot.booking_type
            )));
        }

        let booking_id = self.bookings.next_identity();
        Span::current().record("booking_id", booking_id.as_str());
        let details = validated.into_details(experience.title);

        let availability = Arc::clone(&self.availability);
        let bookings = Arc::clone(&self.bookings);
        let publisher = Arc::clone(&self.publisher);
        let limit = self.store_timeout;

        let task = async move {
            // 証票IDを先に発行し、応答が失われても台帳で照会できるようにする
            let token = ReservationToken::new(details.slot_key(), UNITS_PER_BOOKING);
            if let Err(err) = bounded(limit, "try_reserve", availability.try_reserve(&token)).await {
                if err.is_transient() {
                    match reservation_held(availability.as_ref(), limit, token.id).await {
                        Ok(false) => {}
                        Ok(true) => {
                            warn!(
                                reservation_id = %token.id,
                                error = %err,
                                "reservation committed without acknowledgement, releasing"
                            );
                            compensate(availability.as_ref(), limit, &token).await;
                        }
                        Err(check_err) => error!(
                            reservation_id = %token.id,
                            error = %err,
                            check_error = %check_err,
                            "reservation outcome unknown"
                        ),
                    }
                }
                return Err(err);
            }

            let mut booking =
                Booking::confirm(booking_id, requester.user_id, details, price, token.clone());

            if let Err(err) = bounded(limit, "insert_booking", bookings.insert(&booking)).await {
                // 書き込みは完了しているかもしれない。解放の前に保存有無を確かめる
                match find_persisted(bookings.as_ref(), limit, &booking).await {
                    Ok(true) => {
                        warn!(error = %err, "booking persisted without acknowledgement");
                    }
                    Ok(false) => {
                        warn!(
                            reservation_id = %token.id,
                            error = %err,
                            "booking persistence failed, releasing reservation"
                        );
                        compensate(availability.as_ref(), limit, &token).await;
                        return Err(err);
                    }
                    Err(lookup_err) => {
                        // 保存済みかもしれない予約から容量を奪わない
                        error!(
                            reservation_id = %token.id,
                            error = %err,
                            lookup_error = %lookup_err,
                            "booking persistence unknown, keeping reservation"
                        );
                        return Err(unavailable(err));
                    }
                }
            }

            info!(
                total_price = booking.price().total().amount(),
                "booking confirmed"
            );
            publish_events(publisher.as_ref(), booking.take_domain_events());
            Ok::<_, ApplicationError>(booking)
        };

        tokio::spawn(task.instrument(Span::current()))
            .await
            .map_err(|err| ApplicationError::Internal(format!("admission task failed: {}", err)))?
    }

    /// 予約をキャンセルする
    /// キャンセル済みの予約には成功を返す。解放されずに残った容量があればここで解放する
    ///
    /// # Arguments
    /// * `booking_id` - 予約ID
    /// * `requester` - 呼び出し元（所有者または管理者）
    ///
    /// # Returns
    /// * `Ok(Booking)` - キャンセル後の予約
    /// * `Err(ApplicationError::NotFound)` - 予約が存在しない、または権限がない
    /// * `Err(ApplicationError::InvalidTransition)` - 催行済み
    pub async fn cancel(
        &self,
        booking_id: &str,
        requester: &Requester,
    ) -> Result<Booking, ApplicationError> {
        let correlation_id = Uuid::new_v4();
        let span = info_span!("cancel", %correlation_id, booking_id = %booking_id);
        self.cancel_inner(booking_id, requester).instrument(span).await
    }

    async fn cancel_inner(
        &self,
        booking_id: &str,
        requester: &Requester,
    ) -> Result<Booking, ApplicationError> {
        let booking = self.find_accessible(booking_id, requester).await?;

        match booking.status() {
            BookingStatus::Cancelled => {
                // 中断されたキャンセルが残した容量を解放する
                let reservation = booking.reservation();
                if reservation_held(self.availability.as_ref(), self.store_timeout, reservation.id)
                    .await?
                {
                    warn!(
                        reservation_id = %reservation.id,
                        "releasing capacity held by a cancelled booking"
                    );
                    release_reservation(self.availability.as_ref(), self.store_timeout, reservation)
                        .await?;
                }
                info!("booking already cancelled");
                return Ok(booking);
            }
            BookingStatus::Completed => {
                return Err(ApplicationError::InvalidTransition {
                    from: BookingStatus::Completed,
                    to: BookingStatus::Cancelled,
                })
            }
            BookingStatus::Confirmed => {}
        }

        let availability = Arc::clone(&self.availability);
        let bookings = Arc::clone(&self.bookings);
        let publisher = Arc::clone(&self.publisher);
        let limit = self.store_timeout;

        let task = async move {
            let mut cancelled = booking.clone();
            cancelled.cancel()?;

            let won = bounded(
                limit,
                "update_status",
                bookings.update_status(&cancelled, BookingStatus::Confirmed),
            )
            .await?;
            if !won {
                // 並行する更新に負けた場合は現在の状態で判定する
                let current = bounded(limit, "find_booking", bookings.find_by_id(booking.id()))
                    .await?
                    .ok_or_else(|| {
                        ApplicationError::NotFound(format!(
                            "予約が見つかりません: {}",
                            booking.id()
                        ))
                    })?;
                return match current.status() {
                    BookingStatus::Cancelled => Ok(current),
                    status => Err(ApplicationError::InvalidTransition {
                        from: status,
                        to: BookingStatus::Cancelled,
                    }),
                };
            }

            let reservation = cancelled.reservation();
            if let Err(err) = release_reservation(availability.as_ref(), limit, reservation).await {
                if !err.is_transient() {
                    error!(
                        reservation_id = %reservation.id,
                        error = %err,
                        "release violated capacity invariant"
                    );
                    return Err(err);
                }
                // 解放が完了していれば取り消しは不要
                match reservation_held(availability.as_ref(), limit, reservation.id).await {
                    Ok(false) => {
                        warn!(error = %err, "release committed without acknowledgement");
                    }
                    Ok(true) => {
                        warn!(error = %err, "release failed, reverting cancellation");
                        if let Err(revert_err) = bounded(
                            limit,
                            "update_status",
                            bookings.update_status(&booking, BookingStatus::Cancelled),
                        )
                        .await
                        {
                            error!(error = %revert_err, "failed to revert cancellation");
                        }
                        return Err(unavailable(err));
                    }
                    Err(check_err) => {
                        // 再度のキャンセルで残った容量を解放する
                        error!(
                            reservation_id = %reservation.id,
                            error = %err,
                            check_error = %check_err,
                            "release outcome unknown, booking stays cancelled"
                        );
                        return Err(unavailable(err));
                    }
                }
            }

            info!("booking cancelled");
            publish_events(publisher.as_ref(), cancelled.take_domain_events());
            Ok::<_, ApplicationError>(cancelled)
        };

        tokio::spawn(task.instrument(Span::current()))
            .await
            .map_err(|err| ApplicationError::Internal(format!("cancel task failed: {}", err)))?
    }

    /// 予約を催行済みにする（管理者のみ）
    /// 容量は消費されたまま
    ///
    /// # Returns
    /// * `Ok(Booking)` - 催行済みの予約
    /// * `Err(ApplicationError::NotFound)` - 予約が存在しない、または管理者でない
    /// * `Err(ApplicationError::InvalidTransition)` - 確定状態でない
    pub async fn complete(
        &self,
        booking_id: &str,
        requester: &Requester,
    ) -> Result<Booking, ApplicationError> {
        let span = info_span!("complete", booking_id = %booking_id);
        async {
            if !requester.is_admin {
                return Err(ApplicationError::NotFound(format!(
                    "予約が見つかりません: {}",
                    booking_id
                )));
            }
            let booking = self.find_accessible(booking_id, requester).await?;
            let mut completed = booking.clone();
            completed.complete()?;

            let won = bounded(
                self.store_timeout,
                "update_status",
                self.bookings
                    .update_status(&completed, BookingStatus::Confirmed),
            )
            .await?;
            if !won {
                let current = self.find_accessible(booking_id, requester).await?;
                return Err(ApplicationError::InvalidTransition {
                    from: current.status(),
                    to: BookingStatus::Completed,
                });
            }

            info!("booking completed");
            publish_events(self.publisher.as_ref(), completed.take_domain_events());
            Ok::<_, ApplicationError>(completed)
        }
        .instrument(span)
        .await
    }

    /// 予約せずに料金を見積もる
    pub async fn quote(&self, request: QuoteRequest) -> Result<PriceQuote, ApplicationError> {
        let (experience_id, booking_type, guests, add_on_ids) = request.validate()?;
        let experience =
            load_experience(self.catalog.as_ref(), self.store_timeout, experience_id).await?;
        Ok(PricingCalculator::compute_total(
            &experience,
            booking_type,
            &guests,
            &add_on_ids,
        )?)
    }

    async fn find_accessible(
        &self,
        booking_id: &str,
        requester: &Requester,
    ) -> Result<Booking, ApplicationError> {
        let id = BookingId::from_string(booking_id)?;
        bounded(self.store_timeout, "find_booking", self.bookings.find_by_id(&id))
            .await?
            .filter(|booking| requester.can_access(booking))
            .ok_or_else(|| ApplicationError::NotFound(format!("予約が見つかりません: {}", id)))
    }
}

/// 空き枠アプリケーションサービス
/// 空き状況の参照と標準スケジュールの登録を提供する
#[derive(Clone)]
pub struct AvailabilityApplicationService {
    catalog: Arc<dyn ExperienceCatalog>,
    availability: Arc<dyn AvailabilityStore>,
    store_timeout: Duration,
}

impl AvailabilityApplicationService {
    /// 新しい空き枠サービスを作成
    ///
    /// # Arguments
    /// * `catalog` - 体験カタログ
    /// * `availability` - 空き枠ストア
    /// * `store_timeout` - ストア呼び出し1回あたりの制限時間
    pub fn new(
        catalog: Arc<dyn ExperienceCatalog>,
        availability: Arc<dyn AvailabilityStore>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            availability,
            store_timeout,
        }
    }

    /// 時間枠の現在の状態を取得する
    ///
    /// # Arguments
    /// * `experience_id` - 体験ID
    /// * `date` - 日付（YYYY-MM-DD）
    /// * `time` - 時刻（HH:MM）
    pub async fn peek_availability(
        &self,
        experience_id: i64,
        date: &str,
        time: &str,
    ) -> Result<SlotSnapshot, ApplicationError> {
        let key = SlotKey::parse(ExperienceId::new(experience_id), date, time)?;
        bounded(self.store_timeout, "peek", self.availability.peek(key)).await
    }

    /// 指定日のすべての時間枠を時刻順に取得する
    pub async fn list_availability(
        &self,
        experience_id: i64,
        date: &str,
    ) -> Result<Vec<SlotSnapshot>, ApplicationError> {
        let date = parse_date(date)?;
        bounded(
            self.store_timeout,
            "list_slots",
            self.availability
                .list_slots(ExperienceId::new(experience_id), date),
        )
        .await
    }

    /// 開始日から指定日数分の標準スケジュールを登録する（管理者のみ）
    /// 既に存在する時間枠は変更しない
    ///
    /// # Returns
    /// * `Ok(u32)` - 新たに登録した時間枠の数
    pub async fn seed_default_schedule(
        &self,
        requester: &Requester,
        experience_id: i64,
        start_date: &str,
        days: u32,
    ) -> Result<u32, ApplicationError> {
        if !requester.is_admin {
            return Err(ApplicationError::Forbidden(
                "空き枠の登録は管理者のみ可能です".to_string(),
            ));
        }
        if days == 0 || days > MAX_SEED_DAYS {
            return Err(ApplicationError::Validation(format!(
                "日数は1から{}の範囲で指定してください: {}",
                MAX_SEED_DAYS, days
            )));
        }

        let experience_id = ExperienceId::new(experience_id);
        let start = parse_date(start_date)?;
        load_experience(self.catalog.as_ref(), self.store_timeout, experience_id).await?;

        let slots = default_daily_slots();
        let mut created = 0;
        for offset in 0..days {
            let date = start + DateDuration::days(i64::from(offset));
            created += bounded(
                self.store_timeout,
                "seed_slots",
                self.availability.seed_slots(experience_id, date, &slots),
            )
            .await?;
        }

        info!(%experience_id, days, created, "availability seeded");
        Ok(created)
    }
}
