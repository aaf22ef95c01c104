use crate::storage::Document;

/// 科目
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub id: String,
    pub name: Option<String>,
}

impl From<&Document> for Subject {
    fn from(doc: &Document) -> Self {
        Subject {
            id: doc.id.clone(),
            name: doc
                .get_str("name")
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        }
    }
}
