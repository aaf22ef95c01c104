//! SeaORM 存储实现
//!
//! 以一张 `documents` 表模拟远程文档库，支持 SQLite、PostgreSQL 和 MySQL。

mod documents;

use crate::config::DatabaseConfig;
use crate::errors::{ExamPortalError, Result};
use crate::resilience::RemoteError;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async(config: &DatabaseConfig) -> Result<Self> {
        let db_url = Self::build_database_url(&config.url)?;

        let db = Self::connect(&db_url, config).await?;

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| ExamPortalError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// 使用已有连接（测试或嵌入场景），同样会执行迁移
    pub async fn from_connection(db: DatabaseConnection) -> Result<Self> {
        Migrator::up(&db, None)
            .await
            .map_err(|e| ExamPortalError::database_operation(format!("数据库迁移失败: {e}")))?;
        Ok(Self { db })
    }

    async fn connect(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.pool_size)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.timeout))
            .acquire_timeout(Duration::from_secs(config.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false);

        Database::connect(opt)
            .await
            .map_err(|e| ExamPortalError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(ExamPortalError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

/// 把数据库错误映射为远程存储错误码，连接类错误视为服务不可用，
/// 唯一索引冲突视为文档已存在
pub(crate) fn remote_error(err: DbErr, context: &str) -> RemoteError {
    if let Some(SqlErr::UniqueConstraintViolation(_)) = err.sql_err() {
        return RemoteError::already_exists(format!("{context}: {err}"));
    }
    let code = match &err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => "unavailable",
        DbErr::RecordNotFound(_) => "not-found",
        _ => "unknown",
    };
    RemoteError::new(code, format!("{context}: {err}"))
}
