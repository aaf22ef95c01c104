//! 文档实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub collection: String,
    pub doc_id: String,
    #[sea_orm(column_type = "Text")]
    pub data: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为存储层文档
impl Model {
    pub fn into_document(self) -> Result<crate::storage::Document, serde_json::Error> {
        let data = serde_json::from_str(&self.data)?;
        Ok(crate::storage::Document::new(
            self.collection,
            self.doc_id,
            data,
        ))
    }
}
