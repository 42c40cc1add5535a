pub mod confirm;
pub mod error;
pub mod logger;
pub mod validation;
