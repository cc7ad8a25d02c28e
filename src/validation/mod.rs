//! Bounds checking for raw energy readings.
//!
//! Violations are reported through [`ValidationResult::errors`], never as
//! an `Err`; the caller decides whether to reject or clamp the reading.

mod emission;

pub use emission::{EmissionDataValidation, EmissionDataValidator, ValidationResult};
