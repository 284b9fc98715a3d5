use crate::adapter::database_error::DatabaseError;
use sqlx::{MySql, Pool};
use tracing::info;

/// データベースマイグレーションを管理する構造体
pub struct DatabaseMigration {
    pool: Pool<MySql>,
}

/// 実行順に並べたマイグレーション
const MIGRATIONS: [(&str, &str); 4] = [
    (
        "001_create_experiences_table",
        include_str!("../../migrations/001_create_experiences_table.sql"),
    ),
    (
        "002_create_time_slots_table",
        include_str!("../../migrations/002_create_time_slots_table.sql"),
    ),
    (
        "003_create_slot_reservations_table",
        include_str!("../../migrations/003_create_slot_reservations_table.sql"),
    ),
    (
        "004_create_bookings_table",
        include_str!("../../migrations/004_create_bookings_table.sql"),
    ),
];

impl DatabaseMigration {
    /// 新しいDatabaseMigrationインスタンスを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// マイグレーションを実行
    /// べき等性を保証（CREATE TABLE IF NOT EXISTS）
    pub async fn run(&self) -> Result<(), DatabaseError> {
        for (name, migration_sql) in MIGRATIONS {
            sqlx::query(migration_sql)
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::MigrationError(format!("{} failed: {}", name, e)))?;
            info!(migration = name, "migration applied");
        }

        info!(count = MIGRATIONS.len(), "all migrations completed");
        Ok(())
    }
}
