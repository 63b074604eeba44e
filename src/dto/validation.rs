//! Validation helpers for response contracts that cannot use the derive.

use validator::{Validate, ValidationError, ValidationErrors};

/// Record a failure for every invalid entry of `items` under `field`.
///
/// Generic containers (`ServerItemList<T>` and friends) validate their items through this
/// instead of `#[validate(nested)]`.
pub fn validate_each<T: Validate>(errors: &mut ValidationErrors, field: &'static str, items: &[T]) {
    for (index, item) in items.iter().enumerate() {
        if let Err(inner) = item.validate() {
            let mut err = ValidationError::new("nested");
            err.message = Some(format!("{field}[{index}]: {inner}").into());
            errors.add(field, err);
        }
    }
}

/// Record a failure when a page count is below one.
pub fn validate_page_count(errors: &mut ValidationErrors, page_count: u32) {
    if page_count < 1 {
        let mut err = ValidationError::new("page_count");
        err.message = Some("pageCount must be at least 1".into());
        errors.add("pageCount", err);
    }
}

/// Fail with an error per offending field when a name is blank.
pub fn require_name(errors: &mut ValidationErrors, field: &'static str, name: &str) {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(format!("{field} must not be empty").into());
        errors.add(field, err);
    }
}

/// Turn an accumulator into a validation result.
pub fn finish(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
