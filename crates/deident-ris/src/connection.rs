//! RIS数据库连接管理

use std::time::Duration;

use deident_core::{DeidentError, Result, RisConfig};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

/// RIS数据库连接池
///
/// 连接按查询粒度从池中获取，批处理过程中不长期占用连接。
pub struct RisPool {
    pool: MySqlPool,
}

impl RisPool {
    /// 建立连接池；数据库不可达视为配置错误
    pub async fn connect(config: &RisConfig) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .charset("utf8mb4");

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| {
                DeidentError::Config(format!("RIS database unreachable: {}", e))
            })?;

        tracing::info!(
            "RIS database connected: {}:{}/{}",
            config.host,
            config.port,
            config.database
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}
