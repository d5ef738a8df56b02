mod behavior;
mod report;
mod result;

pub use behavior::Behavior;
pub use report::ValidationReport;
pub use result::{Metadata, RuleOutcome, ValidationResult};
