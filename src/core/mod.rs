//! Core domain types and abstractions

pub mod config;
pub mod error;
pub mod log;
pub mod rates;
pub mod source;

// Re-export main types for cleaner imports
pub use error::{ConversionError, FieldError, FieldErrorKind};
pub use rates::{ExchangeRateRecord, RateTable};
pub use source::RateSource;
