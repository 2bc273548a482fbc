//! Execution module - precision adjustment, validation, and order submission

pub mod precision;
pub mod submit;
pub mod validate;

pub use precision::{adjust, adjust_spec};
pub use submit::OrderSubmitter;
pub use validate::{validate_oco, validate_spec, validate_symbol};
