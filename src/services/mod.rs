pub mod assessments;
pub mod system;

pub use assessments::AssessmentService;
pub use system::SystemService;
