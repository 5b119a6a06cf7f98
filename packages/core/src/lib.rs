// ABOUTME: Core types, traits, and utilities for CloudTrain
// ABOUTME: Foundational package providing the acting principal and field validation helpers

pub mod principal;
pub mod validation;

// Re-export main types
pub use principal::{Principal, ANONYMOUS_USER_ID};

// Re-export validation
pub use validation::{check_max_length, check_range, truncate, ValidationError};
