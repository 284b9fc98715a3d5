use crate::adapter::database_config::{env_or, ConfigError};
use std::net::SocketAddr;
use std::time::Duration;

/// 予約サービスの実行設定
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// ストア呼び出し1回あたりの制限時間
    pub store_timeout: Duration,
    /// HTTPサーバーの待ち受けアドレス
    pub bind_address: SocketAddr,
    /// 空き枠登録のデフォルト日数
    pub seed_days: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(2000),
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8000)),
            seed_days: 30,
        }
    }
}

impl BookingConfig {
    /// 環境変数から設定を読み取る
    /// 環境変数が設定されていない場合はデフォルト値を使用
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let timeout_ms: u64 = env_or(
            "BOOKING_STORE_TIMEOUT_MS",
            defaults.store_timeout.as_millis() as u64,
        )?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "BOOKING_STORE_TIMEOUT_MS must be positive".to_string(),
            ));
        }

        Ok(Self {
            store_timeout: Duration::from_millis(timeout_ms),
            bind_address: env_or("BOOKING_BIND_ADDRESS", defaults.bind_address)?,
            seed_days: env_or("BOOKING_SEED_DAYS", defaults.seed_days)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::database_config::tests::ENV_LOCK;
    use std::env;

    fn clear() {
        env::remove_var("BOOKING_STORE_TIMEOUT_MS");
        env::remove_var("BOOKING_BIND_ADDRESS");
        env::remove_var("BOOKING_SEED_DAYS");
    }

    #[test]
    fn test_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear();

        let config = BookingConfig::from_env().unwrap();

        assert_eq!(config.store_timeout, Duration::from_millis(2000));
        assert_eq!(config.bind_address.to_string(), "0.0.0.0:8000");
        assert_eq!(config.seed_days, 30);
    }

    #[test]
    fn test_overrides() {
        let _lock = ENV_LOCK.lock().unwrap();

        env::set_var("BOOKING_STORE_TIMEOUT_MS", "500");
        env::set_var("BOOKING_BIND_ADDRESS", "127.0.0.1:9090");
        env::set_var("BOOKING_SEED_DAYS", "7");
        let config = BookingConfig::from_env().unwrap();
        clear();

        assert_eq!(config.store_timeout, Duration::from_millis(500));
        assert_eq!(config.bind_address.port(), 9090);
        assert_eq!(config.seed_days, 7);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let _lock = ENV_LOCK.lock().unwrap();

        env::set_var("BOOKING_STORE_TIMEOUT_MS", "0");
        let result = BookingConfig::from_env();
        clear();

        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_address_rejected() {
        let _lock = ENV_LOCK.lock().unwrap();

        env::set_var("BOOKING_BIND_ADDRESS", "not-an-address");
        let result = BookingConfig::from_env();
        clear();

        assert!(result.is_err());
    }
}
