use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{
    BookingType, ExperienceId, ReservationId, ReservationToken, SlotKey, SlotSnapshot, TimeSlot,
};
use crate::domain::port::{AvailabilityError, AvailabilityStore};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};
use tracing::error;

/// MySQL空き枠ストア
///
/// 予約は条件付きUPDATE一文で判定と加算を行うため、
/// 同じ時間枠への並行リクエストはMySQLの行ロックで直列化される
/// 予約証票はslot_reservationsに記録し、解放は一度だけ成功する
pub struct MySqlAvailabilityStore {
    pool: Pool<MySql>,
}

impl MySqlAvailabilityStore {
    /// 新しいMySQL空き枠ストアを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    fn snapshot_from_row(key: SlotKey, row: &MySqlRow) -> Result<SlotSnapshot, DatabaseError> {
        let booking_type: String = row.try_get("booking_type")?;
        let booking_type = BookingType::from_string(&booking_type)
            .map_err(|e| DatabaseError::DecodeError(e.to_string()))?;
        let slot = TimeSlot::reconstruct(
            key.time,
            booking_type,
            row.try_get("max_capacity")?,
            row.try_get("current_bookings")?,
        )
        .map_err(|e| DatabaseError::DecodeError(e.to_string()))?;
        Ok(SlotSnapshot::from_slot(key, &slot))
    }
}

#[async_trait]
impl AvailabilityStore for MySqlAvailabilityStore {
    async fn try_reserve(&self, token: &ReservationToken) -> Result<(), AvailabilityError> {
        let slot = token.slot;
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let updated = sqlx::query(
            r#"
            UPDATE time_slots
            SET current_bookings = current_bookings + ?
            WHERE experience_id = ? AND slot_date = ? AND slot_time = ?
              AND current_bookings + ? <= max_capacity
            "#,
        )
        .bind(token.units)
        .bind(slot.experience_id.value())
        .bind(slot.date)
        .bind(slot.time)
        .bind(token.units)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        if updated.rows_affected() == 0 {
            let exists = sqlx::query(
                "SELECT 1 FROM time_slots WHERE experience_id = ? AND slot_date = ? AND slot_time = ?",
            )
            .bind(slot.experience_id.value())
            .bind(slot.date)
            .bind(slot.time)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;
            tx.rollback().await.map_err(DatabaseError::from)?;

            return Err(match exists {
                Some(_) => AvailabilityError::CapacityExceeded(slot),
                None => AvailabilityError::SlotNotFound(slot),
            });
        }

        // 証票IDで台帳に記録し、応答が失われても照会できるようにする
        sqlx::query(
            r#"
            INSERT INTO slot_reservations
                (reservation_id, experience_id, slot_date, slot_time, units, reserved_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(token.id.to_string())
        .bind(slot.experience_id.value())
        .bind(slot.date)
        .bind(slot.time)
        .bind(token.units)
        .bind(token.reserved_at)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn release(&self, token: &ReservationToken) -> Result<(), AvailabilityError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let marked = sqlx::query(
            r#"
            UPDATE slot_reservations SET released_at = ?
            WHERE reservation_id = ? AND released_at IS NULL
            "#,
        )
        .bind(Utc::now())
        .bind(token.id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        if marked.rows_affected() == 0 {
            tx.rollback().await.map_err(DatabaseError::from)?;
            return Err(AvailabilityError::AlreadyReleased(token.id));
        }

        let decremented = sqlx::query(
            r#"
            UPDATE time_slots
            SET current_bookings = current_bookings - ?
            WHERE experience_id = ? AND slot_date = ? AND slot_time = ?
              AND current_bookings >= ?
            "#,
        )
        .bind(token.units)
        .bind(token.slot.experience_id.value())
        .bind(token.slot.date)
        .bind(token.slot.time)
        .bind(token.units)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        if decremented.rows_affected() == 0 {
            tx.rollback().await.map_err(DatabaseError::from)?;
            error!(slot = %token.slot, reservation_id = %token.id, "release below zero");
            return Err(AvailabilityError::InvariantViolation(format!(
                "時間枠 {} から {} 単位は解放できません",
                token.slot, token.units
            )));
        }

        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn is_reserved(&self, reservation_id: ReservationId) -> Result<bool, AvailabilityError> {
        let held = sqlx::query(
            "SELECT 1 FROM slot_reservations WHERE reservation_id = ? AND released_at IS NULL",
        )
        .bind(reservation_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(held.is_some())
    }

    async fn peek(&self, slot: SlotKey) -> Result<SlotSnapshot, AvailabilityError> {
        let row = sqlx::query(
            r#"
            SELECT booking_type, max_capacity, current_bookings
            FROM time_slots
            WHERE experience_id = ? AND slot_date = ? AND slot_time = ?
            "#,
        )
        .bind(slot.experience_id.value())
        .bind(slot.date)
        .bind(slot.time)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or(AvailabilityError::SlotNotFound(slot))?;

        Ok(Self::snapshot_from_row(slot, &row)?)
    }

    async fn list_slots(
        &self,
        experience_id: ExperienceId,
        date: NaiveDate,
    ) -> Result<Vec<SlotSnapshot>, AvailabilityError> {
        let rows = sqlx::query(
            r#"
            SELECT slot_time, booking_type, max_capacity, current_bookings
            FROM time_slots
            WHERE experience_id = ? AND slot_date = ?
            ORDER BY slot_time
            "#,
        )
        .bind(experience_id.value())
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let snapshots = rows
            .iter()
            .map(|row| {
                let time: NaiveTime = row.try_get("slot_time")?;
                Self::snapshot_from_row(SlotKey::new(experience_id, date, time), row)
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;
        Ok(snapshots)
    }

    async fn seed_slots(
        &self,
        experience_id: ExperienceId,
        date: NaiveDate,
        slots: &[TimeSlot],
    ) -> Result<u32, AvailabilityError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        let mut created = 0;

        for slot in slots {
            // 既存の枠はカウンタごと残す
            let inserted = sqlx::query(
                r#"
                INSERT IGNORE INTO time_slots
                    (experience_id, slot_date, slot_time, booking_type, max_capacity, current_bookings)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(experience_id.value())
            .bind(date)
            .bind(slot.time())
            .bind(slot.booking_type().as_str())
            .bind(slot.max_capacity())
            .bind(slot.current_bookings())
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;
            created += inserted.rows_affected() as u32;
        }

        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(created)
    }
}
