//! Exam Portal - 测验生命周期与参与资格解析服务
//!
//! 基于 Actix Web 构建，为仪表盘提供学生可见测验的解析结果。
//!
//! # 架构
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `models`: 数据模型定义
//! - `resilience`: 重试、网络检测与远程错误分类
//! - `resolver`: 测验状态、参与资格与作答解析
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层
//! - `storage`: 文档存储层（内存 / SeaORM）
//! - `utils`: 工具函数

pub mod config;
pub mod entity;
pub mod errors;
pub mod models;
pub mod resilience;
pub mod resolver;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
