use anyhow::Result;
use num_traits::NumCast;

use super::*;

/// "Configurable" means the type allows access to its options by key/type and
/// allows configuration from description strings.
///
/// There are default implementations for all the methods, so in the general
/// case you only need to implement [HasOptionMetadata].
pub trait Configurable<UI = usize, F = f32>: HasOptionMetadata<UI, F>
where
    UI: ConfigurableNumValue,
    F: ConfigurableNumValue,
{
    /// Given an option key and [OptionValue] attempts to set the option
    /// to the specified value.
    fn set_option(&mut self, key: &str, val: OptionValue) -> Result<()> {
        configurable_options::set_option(self, key, val)?;
        Ok(())
    }

    /// Gets an option by name.
    fn get_option(&self, key: &str) -> Result<OptionValue> {
        configurable_options::get_option(self, key)
    }

    /// Updates options based on a string in the format:
    ///
    /// `key1=value1:key2=value2:keyN=valueN`
    ///
    /// The key may be a prefix of the option name as long as it's not
    /// ambiguous.
    ///
    /// Values cannot contain `=` or `:` and whitespace at the beginning and
    /// end of parts is stripped.
    fn configure(&mut self, s: &str) -> Result<()> {
        configurable_options::configure(self, s)?;
        Ok(())
    }
}

/// Since Rust traits don't allow calling base default methods from
/// a more specific implementation, the [Configurable] trait
/// default methods are implemented in terms of the functions
/// in this submodule.
pub mod configurable_options {
    use super::*;

    pub fn set_option<'a, CS, UI, F>(
        slf: &'a mut CS,
        key: &str,
        val: OptionValue,
    ) -> Result<&'a mut CS>
    where
        CS: Configurable<UI, F> + ?Sized,
        UI: ConfigurableNumValue,
        F: ConfigurableNumValue,
    {
        let key = key.trim();
        let mut opts = slf.options_mut();
        let (omd, Some(optidx)) = opts.find_option_definition(key)? else {
            return Err(ConfigureError::CannotAccessOptionValue(key.to_string()).into());
        };
        let acc = opts[optidx]
            .1
            .take()
            .ok_or_else(|| ConfigureError::CannotAccessOptionValue(key.to_string()))?;

        match (acc, val) {
            (OptionValueMut::Float(rv), OptionValue::Float(v)) => {
                *rv = F::from_f64(v)
                    .ok_or_else(|| ConfigureError::ConversionFailure(omd.key.to_string()))?
            }
            (OptionValueMut::UInt(rv), OptionValue::UInt(v)) => {
                *rv = UI::from_u64(v)
                    .ok_or_else(|| ConfigureError::ConversionFailure(omd.key.to_string()))?
            }
            _ => Err(ConfigureError::UnknownOrBadType(key.to_string()))?,
        }
        Ok(slf)
    }

    pub fn get_option<CS, UI, F>(slf: &CS, key: &str) -> Result<OptionValue>
    where
        CS: Configurable<UI, F> + ?Sized,
        UI: ConfigurableNumValue,
        F: ConfigurableNumValue,
    {
        let key = key.trim();

        let mut opts = slf.options();

        let (_omd, Some(optidx)) = opts.find_option_definition(key)? else {
            return Err(ConfigureError::CannotAccessOptionValue(key.to_string()).into());
        };
        let val = opts[optidx]
            .1
            .take()
            .ok_or_else(|| ConfigureError::CannotAccessOptionValue(key.to_string()))?;

        Ok(match val {
            OptionValue::UInt(v) => OptionValue::UInt(
                <u64 as NumCast>::from(v)
                    .ok_or_else(|| ConfigureError::ConversionFailure(key.to_string()))?,
            ),
            OptionValue::Float(v) => OptionValue::Float(
                <f64 as NumCast>::from(v)
                    .ok_or_else(|| ConfigureError::ConversionFailure(key.to_string()))?,
            ),
        })
    }

    pub fn configure<CS, UI, F>(slf: &mut CS, s: &str) -> Result<()>
    where
        CS: Configurable<UI, F> + ?Sized,
        UI: ConfigurableNumValue,
        F: ConfigurableNumValue,
    {
        let opts = Options::from(
            slf.options_mut()
                .iter()
                .map(|(md, acc)| (md.clone(), acc.is_some().then_some(()))),
        );
        s.trim()
            .split(':')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .try_for_each(|kv| {
                let (k, v) = kv.split_once('=').unwrap_or(("", kv));
                let (omd, Some(_)) = opts.find_option_definition(k)? else {
                    return Err(ConfigureError::UnknownOrBadType(k.to_string()).into());
                };

                slf.set_option(omd.key, OptionValue::parse_value(omd.option_type, v.trim())?)?;
                anyhow::Ok(())
            })?;
        Ok(())
    }
}
