use once_cell::sync::Lazy;
use regex::Regex;

static DOCUMENT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid document id regex"));

pub fn validate_document_id(id: &str) -> Result<(), &'static str> {
    // 文档 ID 长度校验：1 <= x <= 128
    if id.is_empty() || id.len() > 128 {
        return Err("Document id length must be between 1 and 128 characters");
    }
    // 只能包含字母、数字、下划线或连字符，不能含路径分隔符
    if !DOCUMENT_ID_RE.is_match(id) {
        return Err("Document id must contain only letters, numbers, underscores or hyphens");
    }
    Ok(())
}
