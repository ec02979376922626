use std::str::FromStr;

use num_traits::{FromPrimitive, NumCast};

use super::ConfigureError;

/// Enum that holds the value for an option.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue<UI = u64, F = f64> {
    /// Unsigned integer value.
    UInt(UI),

    /// Signed float value.
    Float(F),
}

/// Enum that holds a mutable reference to an option value.
/// It's only necessary to worry about this when implementing
/// [HasOptionMetadata](super::HasOptionMetadata) for your own type.
#[derive(Debug, PartialEq)]
pub enum OptionValueMut<'a, UI, F> {
    /// Mutable reference to an unsigned integer value.
    UInt(&'a mut UI),

    /// Mutable reference to a signed float value.
    Float(&'a mut F),
}

/// Option types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    /// Unsigned integer value.
    UInt,

    /// Signed float value.
    Float,
}

/// Numeric values that can be used for configurable fields.
pub trait ConfigurableNumValue: 'static + Copy + NumCast + FromPrimitive {}
impl<T> ConfigurableNumValue for T where T: 'static + Copy + NumCast + FromPrimitive {}

impl OptionValue {
    /// Try to parse a string reference to an option value.
    ///
    /// Float options allow specifying `-inf` for negative infinity
    /// and `inf` or `+inf` for infinity.
    pub fn parse_value(typ: OptionType, s: impl AsRef<str>) -> Result<Self, ConfigureError> {
        let s = s.as_ref().trim();
        let bad = || ConfigureError::BadValue {
            value: s.to_string(),
            expected: typ,
        };
        Ok(match typ {
            OptionType::UInt => Self::UInt(u64::from_str(s).map_err(|_| bad())?),
            OptionType::Float => Self::Float(Self::parse_float(s).ok_or_else(bad)?),
        })
    }

    fn parse_float(s: &str) -> Option<f64> {
        match s {
            "-inf" | "-INF" => Some(f64::NEG_INFINITY),
            "inf" | "INF" | "+inf" | "+INF" => Some(f64::INFINITY),
            other => f64::from_str(other).ok(),
        }
    }
}
