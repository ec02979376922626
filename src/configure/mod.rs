//! String and key based configuration for generation parameters.
//!
//! Unless you're writing your own configurable type, you basically only
//! need [Configurable::configure](crate::configure::Configurable::configure)
//! which accepts strings like `temperature=0.8:top_p=0.95:top_k=40`.
//! [SamplingConfig](crate::params::SamplingConfig) and
//! [GenerationParams](crate::params::GenerationParams) implement it.
//!
//! Values are parsed to [u64] or [f64] first and then converted to the
//! actual field type, so conversions that don't fit fail rather than wrap.

mod configurable;
mod metadata;
mod value;

use thiserror::Error;

#[doc(inline)]
pub use self::{configurable::*, metadata::*, value::*};

/// Option handling errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigureError {
    #[error("unknown option key {0} or bad type")]
    /// Unknown option key or incorrect type specified.
    UnknownOrBadType(String),

    /// The supplied key can match multiple options.
    #[error("option key {0} is ambiguous")]
    AmbiguousKey(String),

    /// An error occurred converting the option value.
    #[error("option value conversion for key {0} failed")]
    ConversionFailure(String),

    /// The option value cannot be accessed as requested.
    #[error("option value for key {0} cannot be accessed as requested")]
    CannotAccessOptionValue(String),

    /// The value text couldn't be parsed as the option's type.
    #[error("bad value {value:?} for a {expected:?} option")]
    BadValue {
        value: String,
        expected: OptionType,
    },
}
