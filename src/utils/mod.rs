pub mod validate;

pub use validate::validate_document_id;
