pub mod reference;
pub mod response;
pub mod timestamp;
