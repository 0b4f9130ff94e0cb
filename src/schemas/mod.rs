pub mod validation;
pub mod validator;

pub use validator::{StrictValidator, Validator};
