pub mod rules;
pub mod types;

pub use rules::{RuleSet, ValidationEngine};
pub use types::{ErrorKind, ValidationOutcome};

/// True when no outcome failed. An empty list passes.
pub fn all_passed(outcomes: &[ValidationOutcome]) -> bool {
    outcomes.iter().all(ValidationOutcome::passed)
}
