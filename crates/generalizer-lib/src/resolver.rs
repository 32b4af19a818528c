//! Control-parameter resolution
//!
//! A control parameter is looked up in this order:
//! 1. a non-null attribute of the feature with the parameter's name,
//! 2. the configured variable for `(tag, property)`,
//! 3. the caller-supplied default,
//!
//! and fails with [`GeneralizeError::MissingConfiguration`] otherwise.

use crate::config::parse_number_list;
use crate::{AttributeValue, ConfigValue, ConfigurationStore, Feature, GeneralizeError, Result};

/// Where a resolved value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueSource {
    Attribute,
    Configured,
    Default,
}

/// A `(tag, property)` reference; `tag: None` means "the tag of the evaluated layer"
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertyRef {
    pub tag: Option<String>,
    pub property: String,
}

/// Either a literal argument or a reference to a configured property
#[derive(Clone, Debug, PartialEq)]
pub enum ValueRef<T> {
    Literal(T),
    Reference(PropertyRef),
}

impl<T> ValueRef<T> {
    /// Reference a property of the evaluated layer's tag
    pub fn property(property: impl Into<String>) -> Self {
        ValueRef::Reference(PropertyRef {
            tag: None,
            property: property.into(),
        })
    }

    /// Reference a property of an explicit tag
    pub fn tagged(tag: impl Into<String>, property: impl Into<String>) -> Self {
        ValueRef::Reference(PropertyRef {
            tag: Some(tag.into()),
            property: property.into(),
        })
    }
}

impl From<f64> for ValueRef<f64> {
    fn from(value: f64) -> Self {
        ValueRef::Literal(value)
    }
}

impl From<Vec<f64>> for ValueRef<Vec<f64>> {
    fn from(value: Vec<f64>) -> Self {
        ValueRef::Literal(value)
    }
}

impl<T> From<&str> for ValueRef<T> {
    fn from(property: &str) -> Self {
        ValueRef::property(property)
    }
}

/// Types a resolved [`ConfigValue`] can be turned into
pub trait FromConfigValue: Sized {
    const KIND: &'static str;
    fn from_config_value(value: &ConfigValue) -> Option<Self>;
}

impl FromConfigValue for f64 {
    const KIND: &'static str = "number";

    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        value.as_f64()
    }
}

impl FromConfigValue for Vec<f64> {
    const KIND: &'static str = "list of numbers";

    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        value.as_numbers()
    }
}

impl FromConfigValue for String {
    const KIND: &'static str = "string";

    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Text(s) => Some(s.clone()),
            ConfigValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Resolves control parameters against an explicit [`ConfigurationStore`]
#[derive(Clone, Copy, Debug)]
pub struct VariableResolver<'a> {
    store: &'a ConfigurationStore,
}

impl<'a> VariableResolver<'a> {
    pub fn new(store: &'a ConfigurationStore) -> Self {
        Self { store }
    }

    #[inline]
    pub fn store(&self) -> &'a ConfigurationStore {
        self.store
    }

    /// Resolve `property` for `tag`, honouring feature attribute → configured → default
    pub fn resolve(
        &self,
        tag: Option<&str>,
        property: &str,
        feature: Option<&Feature>,
        default: Option<ConfigValue>,
    ) -> Result<(ValueSource, ConfigValue)> {
        let attribute = feature
            .and_then(|f| f.attribute(property))
            .and_then(|value| match value {
                AttributeValue::Number(n) => Some(ConfigValue::Number(*n)),
                AttributeValue::Text(s) => Some(ConfigValue::Text(s.clone())),
                AttributeValue::Null => None,
            });
        if let Some(value) = attribute {
            return Ok((ValueSource::Attribute, value));
        }

        if let Some(value) = tag.and_then(|tag| self.store.variable(tag, property)) {
            return Ok((ValueSource::Configured, value.clone()));
        }

        if let Some(default) = default {
            return Ok((ValueSource::Default, default));
        }

        Err(GeneralizeError::MissingConfiguration {
            tag: tag.unwrap_or("<untagged>").to_string(),
            property: property.to_string(),
        })
    }

    /// Typed resolution; a value of the wrong kind is an invalid parameter
    pub fn resolve_as<T: FromConfigValue>(
        &self,
        tag: Option<&str>,
        property: &str,
        feature: Option<&Feature>,
        default: Option<ConfigValue>,
    ) -> Result<T> {
        let (source, value) = self.resolve(tag, property, feature, default)?;
        T::from_config_value(&value).ok_or_else(|| {
            GeneralizeError::InvalidParameter(format!(
                "Property '{property}' of tag '{}' resolved from {source:?} to {value:?}, expected a {}",
                tag.unwrap_or("<untagged>"),
                T::KIND
            ))
        })
    }

    /// Resolve a literal-or-reference argument once at call entry
    pub fn resolve_value<T: FromConfigValue + Clone>(
        &self,
        layer_tag: Option<&str>,
        value: &ValueRef<T>,
        feature: Option<&Feature>,
    ) -> Result<T> {
        match value {
            ValueRef::Literal(v) => Ok(v.clone()),
            ValueRef::Reference(reference) => {
                let tag = reference.tag.as_deref().or(layer_tag);
                self.resolve_as(tag, &reference.property, feature, None)
            }
        }
    }
}

/// Parse a list argument given as text (`"1;2;3"` or `"1,2,3"`)
pub fn parse_list_argument(raw: &str) -> Result<Vec<f64>> {
    parse_number_list(&raw.replace(',', ";"))
}
