use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{
    Booking, BookingDetails, BookingId, BookingStatus, BookingType, CustomerContact,
    ExperienceId, GuestComposition, PriceQuote, ReservationId, ReservationToken, SlotKey, UserId,
};
use crate::domain::port::{BookingFilter, BookingRepository, RepositoryError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::types::Json;
use sqlx::{MySql, Pool, QueryBuilder, Row};

const BOOKING_COLUMNS: &str = r#"
    id, user_id, experience_id, experience_title, booking_type, slot_date, slot_time,
    adults, kids, group_size, add_on_ids, price_breakdown, reservation_id,
    reservation_units, reserved_at, customer_name, customer_email, customer_phone,
    status, created_at, updated_at
"#;

/// MySQL予約リポジトリ
/// MySQLデータベースを使用して予約を永続化する
pub struct MySqlBookingRepository {
    pool: Pool<MySql>,
}

impl MySqlBookingRepository {
    /// 新しいMySQL予約リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    ///
    /// # Returns
    /// * MySqlBookingRepositoryのインスタンス
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// データベースの行から予約集約を再構築する
    fn booking_from_row(row: &MySqlRow) -> Result<Booking, DatabaseError> {
        let corrupt = |field: &str, e: &dyn std::fmt::Display| {
            DatabaseError::DecodeError(format!("{}の解析に失敗しました: {}", field, e))
        };

        let id: String = row.try_get("id")?;
        let id = BookingId::from_string(&id).map_err(|e| corrupt("予約ID", &e))?;
        let user_id: String = row.try_get("user_id")?;
        let user_id = UserId::from_string(&user_id).map_err(|e| corrupt("ユーザーID", &e))?;
        let booking_type: String = row.try_get("booking_type")?;
        let booking_type =
            BookingType::from_string(&booking_type).map_err(|e| corrupt("予約タイプ", &e))?;
        let status: String = row.try_get("status")?;
        let status = BookingStatus::from_string(&status).map_err(|e| corrupt("ステータス", &e))?;

        let experience_id = ExperienceId::new(row.try_get("experience_id")?);
        let date: NaiveDate = row.try_get("slot_date")?;
        let time: NaiveTime = row.try_get("slot_time")?;

        let customer = CustomerContact::new(
            row.try_get("customer_name")?,
            row.try_get("customer_email")?,
            row.try_get("customer_phone")?,
        )
        .map_err(|e| corrupt("連絡先", &e))?;

        let Json(add_on_ids): Json<Vec<String>> = row.try_get("add_on_ids")?;
        let Json(price): Json<PriceQuote> = row.try_get("price_breakdown")?;
        // 合計は明細から再計算する
        let price = PriceQuote::new(price.base(), price.add_ons().to_vec())
            .map_err(|e| corrupt("料金明細", &e))?;

        let reservation_id: String = row.try_get("reservation_id")?;
        let reservation = ReservationToken {
            id: ReservationId::from_string(&reservation_id)
                .map_err(|e| corrupt("予約証票ID", &e))?,
            slot: SlotKey::new(experience_id, date, time),
            units: row.try_get("reservation_units")?,
            reserved_at: row.try_get("reserved_at")?,
        };

        let details = BookingDetails {
            experience_id,
            experience_title: row.try_get("experience_title")?,
            booking_type,
            date,
            time,
            guests: GuestComposition::new(
                row.try_get("adults")?,
                row.try_get("kids")?,
                row.try_get("group_size")?,
            ),
            add_on_ids,
            customer,
        };

        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        Ok(Booking::reconstruct(
            id,
            user_id,
            details,
            price,
            reservation,
            status,
            created_at,
            updated_at,
        ))
    }
}

#[async_trait]
impl BookingRepository for MySqlBookingRepository {
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError> {
        let details = booking.details();
        let reservation = booking.reservation();

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, user_id, experience_id, experience_title, booking_type, slot_date, slot_time,
                adults, kids, group_size, add_on_ids, price_breakdown, total_price, reservation_id,
                reservation_units, reserved_at, customer_name, customer_email, customer_phone,
                status, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(booking.id().as_str())
        .bind(booking.user_id().as_str())
        .bind(details.experience_id.value())
        .bind(details.experience_title.as_str())
        .bind(details.booking_type.as_str())
        .bind(details.date)
        .bind(details.time)
        .bind(details.guests.adults())
        .bind(details.guests.kids())
        .bind(details.guests.group_size())
        .bind(Json(details.add_on_ids.clone()))
        .bind(Json(booking.price().clone()))
        .bind(booking.price().total().amount())
        .bind(reservation.id.to_string())
        .bind(reservation.units)
        .bind(reservation.reserved_at)
        .bind(details.customer.name())
        .bind(details.customer.email())
        .bind(details.customer.phone())
        .bind(booking.status().as_str())
        .bind(booking.created_at())
        .bind(booking.updated_at())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(())
    }

    async fn find_by_id(&self, booking_id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let sql = format!("SELECT {} FROM bookings WHERE id = ?", BOOKING_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(booking_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        row.as_ref()
            .map(Self::booking_from_row)
            .transpose()
            .map_err(RepositoryError::from)
    }

    async fn find_by_filter(&self, filter: &BookingFilter) -> Result<Vec<Booking>, RepositoryError> {
        let mut builder: QueryBuilder<MySql> =
            QueryBuilder::new(format!("SELECT {} FROM bookings WHERE 1 = 1", BOOKING_COLUMNS));
        if let Some(user_id) = &filter.user_id {
            builder.push(" AND user_id = ").push_bind(user_id.as_str().to_string());
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(experience_id) = filter.experience_id {
            builder
                .push(" AND experience_id = ")
                .push_bind(experience_id.value());
        }
        builder.push(" ORDER BY created_at DESC");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        rows.iter()
            .map(Self::booking_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(RepositoryError::from)
    }

    async fn update_status(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(booking.status().as_str())
        .bind(booking.updated_at())
        .bind(booking.id().as_str())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(result.rows_affected() == 1)
    }

    fn next_identity(&self) -> BookingId {
        BookingId::generate()
    }
}
