use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{AddOn, BookingType, Experience, ExperienceId, PricingStructure};
use crate::domain::port::{ExperienceCatalog, RepositoryError};
use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::types::Json;
use sqlx::{MySql, Pool, Row};

/// MySQL体験カタログ
/// カタログ側が管理するexperiencesテーブルを読み取り専用で参照する
/// 予約タイプ・料金体系・アドオンはJSON列に保存されている
pub struct MySqlExperienceCatalog {
    pool: Pool<MySql>,
}

impl MySqlExperienceCatalog {
    /// 新しいMySQL体験カタログを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    fn experience_from_row(row: &MySqlRow) -> Result<Experience, DatabaseError> {
        let Json(booking_types): Json<Vec<BookingType>> = row.try_get("booking_types")?;
        let Json(pricing): Json<PricingStructure> = row.try_get("pricing")?;
        let Json(add_ons): Json<Vec<AddOn>> = row.try_get("add_ons")?;

        Ok(Experience {
            id: ExperienceId::new(row.try_get("id")?),
            title: row.try_get("title")?,
            booking_types,
            pricing,
            add_ons,
        })
    }
}

#[async_trait]
impl ExperienceCatalog for MySqlExperienceCatalog {
    async fn get_experience(
        &self,
        experience_id: ExperienceId,
    ) -> Result<Option<Experience>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, title, booking_types, pricing, add_ons FROM experiences WHERE id = ?",
        )
        .bind(experience_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        row.as_ref()
            .map(Self::experience_from_row)
            .transpose()
            .map_err(RepositoryError::from)
    }
}
