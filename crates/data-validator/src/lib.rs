//! Input Validation
//!
//! Range checking for crop-recommendation features and model confidence
//! scores. Nothing here runs unless the caller opts in.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{Validator, ValidationConfig, ValidationResult};
