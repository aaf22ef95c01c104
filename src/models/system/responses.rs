use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 健康检查响应
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "system.ts")]
pub struct HealthResponse {
    pub status: String,          // 固定为 "ok"
    pub system_name: String,     // 系统名称
    pub version: String,         // 服务版本
    pub environment: String,     // 运行环境
    pub storage_backend: String, // 当前文档存储后端
    pub uptime_ms: i64,          // 启动至今的毫秒数
}
