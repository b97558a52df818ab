//! Generation parameter validation
//! Range and type checks applied before parameters are sent

pub mod validator;

pub use validator::{validate_parameters, RESERVED_KEYS, TEMPERATURE_RANGE, TOP_P_RANGE};
