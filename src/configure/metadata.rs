use super::*;

/// Structure that defines an option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionMetadata {
    /// Option name.
    pub key: &'static str,

    /// Optional option description.
    pub description: Option<&'static str>,

    /// The type of option.
    pub option_type: OptionType,
}

/// Structure that defines a configurable type's metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigMetadata {
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub options: Vec<OptionMetadata>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Options<T>(Vec<(OptionMetadata, Option<T>)>);

impl<T> std::ops::Deref for Options<T> {
    type Target = Vec<(OptionMetadata, Option<T>)>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::DerefMut for Options<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> Default for Options<T> {
    fn default() -> Self {
        Self(Vec::default())
    }
}

impl<T, I: IntoIterator<Item = (OptionMetadata, Option<T>)>> From<I> for Options<T> {
    fn from(value: I) -> Self {
        Self(value.into_iter().collect())
    }
}

impl<T> Options<T> {
    /// Convenience function to build options from two iterators.
    /// The metadata entries in the first argument pair up 1:1 with the
    /// accessors in the second.
    pub fn build_options(
        md: impl IntoIterator<Item = OptionMetadata>,
        i: impl IntoIterator<Item = Option<T>>,
    ) -> Self {
        Self(md.into_iter().zip(i).collect())
    }

    /// Finds the option whose key starts with `key`. An exact match wins
    /// over longer keys sharing the prefix; otherwise more than one
    /// candidate is an error.
    pub fn find_option_definition(
        &self,
        key: &str,
    ) -> Result<(OptionMetadata, Option<usize>), ConfigureError> {
        let key = key.trim();
        let unknown = || {
            ConfigureError::UnknownOrBadType(if key.is_empty() {
                "<unspecified>".to_string()
            } else {
                key.to_string()
            })
        };
        if key.is_empty() {
            return Err(unknown());
        }
        let exact = self
            .iter()
            .enumerate()
            .find(|(_, (omd, _))| omd.key == key);
        if let Some((idx, (omd, acc))) = exact {
            return Ok((omd.clone(), acc.is_some().then_some(idx)));
        }
        let mut it = self.iter().enumerate().filter_map(|(idx, (omd, acc))| {
            omd.key
                .starts_with(key)
                .then(|| (omd.clone(), acc.is_some().then_some(idx)))
        });
        let Some((optdef, optidx)) = it.next() else {
            return Err(unknown());
        };

        if it.next().is_some() {
            Err(ConfigureError::AmbiguousKey(key.to_string()))?
        }

        Ok((optdef, optidx))
    }
}

/// Configurable types implement this trait. It provides a name, a
/// description and a list of options with their types, plus direct access to
/// the fields backing those options.
pub trait HasOptionMetadata<UI = usize, F = f32>
where
    UI: ConfigurableNumValue,
    F: ConfigurableNumValue,
{
    fn option_metadata(&self) -> ConfigMetadata {
        ConfigMetadata {
            name: "unknown",
            description: None,
            options: vec![],
        }
    }

    fn options(&self) -> Options<OptionValue<UI, F>> {
        Options::default()
    }

    fn options_mut(&mut self) -> Options<OptionValueMut<'_, UI, F>> {
        Options::default()
    }
}
