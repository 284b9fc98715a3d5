use crate::domain::port::{AvailabilityError, RepositoryError};

/// データベースエラー型
/// データベース操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatabaseError {
    /// データベース接続エラー
    #[error("Database connection error: {0}")]
    ConnectionError(String),
    /// SQLクエリエラー
    #[error("Database query error: {0}")]
    QueryError(String),
    /// 保存済みデータがドメインの制約を満たさない
    #[error("Corrupt row: {0}")]
    DecodeError(String),
    /// マイグレーションエラー
    #[error("Migration error: {0}")]
    MigrationError(String),
}

/// sqlxのエラーを接続障害とクエリ失敗に振り分ける
impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => DatabaseError::ConnectionError(err.to_string()),
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::Decode(_) => DatabaseError::DecodeError(err.to_string()),
            other => DatabaseError::QueryError(other.to_string()),
        }
    }
}

/// DatabaseErrorからRepositoryErrorへの変換
impl From<DatabaseError> for RepositoryError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionError(msg) => RepositoryError::ConnectionFailed(msg),
            DatabaseError::QueryError(msg) => RepositoryError::OperationFailed(msg),
            DatabaseError::DecodeError(msg) => RepositoryError::FetchFailed(msg),
            DatabaseError::MigrationError(msg) => RepositoryError::OperationFailed(msg),
        }
    }
}

impl From<DatabaseError> for AvailabilityError {
    fn from(err: DatabaseError) -> Self {
        AvailabilityError::Store(RepositoryError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_connection_error() {
        let err = DatabaseError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DatabaseError::ConnectionError(_)));
        assert!(matches!(
            RepositoryError::from(err),
            RepositoryError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_row_not_found_is_query_error() {
        let err = DatabaseError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DatabaseError::QueryError(_)));
    }

    #[test]
    fn test_decode_error_maps_to_fetch_failed() {
        let err = DatabaseError::DecodeError("bad status".to_string());
        assert_eq!(
            RepositoryError::from(err),
            RepositoryError::FetchFailed("bad status".to_string())
        );
    }

    #[test]
    fn test_availability_error_wraps_store_failure() {
        let err = AvailabilityError::from(DatabaseError::ConnectionError("down".to_string()));
        assert_eq!(
            err,
            AvailabilityError::Store(RepositoryError::ConnectionFailed("down".to_string()))
        );
    }
}
