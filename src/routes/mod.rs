pub mod assessments;

pub mod system;

pub use assessments::configure_assessment_routes;
pub use system::configure_system_routes;
