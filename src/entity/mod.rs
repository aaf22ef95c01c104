//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 storage 模块中的文档类型分离。
//! SeaOrmStorage 使用这些实体读写，然后转换为 storage::Document。

pub mod prelude;

pub mod documents;
