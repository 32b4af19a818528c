//! Tags, properties and per-tag variables
//!
//! The [`ConfigurationStore`] is passed explicitly to everything that needs a
//! configured value. It (de)serializes to the JSON payload hosts persist:
//!
//! ```json
//! {
//!   "tags": ["poi", "roads"],
//!   "properties": {"_zoom_min": {"description": "Minimum zoom level", "type": "number", "isList": false}},
//!   "variables": {"poi[_zoom_min]": 10, "poi[_size_array]": "1;2;4"}
//! }
//! ```

use crate::{GeneralizeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value type of a property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Number,
    String,
    File,
}

/// A configurable property (the "column" of the tag/property table)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default)]
    pub is_list: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_values: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub is_default: bool,
}

impl Property {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        property_type: PropertyType,
        is_list: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            property_type,
            is_list,
            valid_values: None,
            is_default: false,
        }
    }

    fn default_property(name: &str, description: &str, property_type: PropertyType, is_list: bool) -> Self {
        Self {
            is_default: true,
            ..Self::new(name, description, property_type, is_list)
        }
    }
}

/// How a layer is matched to a tag
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagIdentifyMode {
    /// The layer name starts with the tag string
    #[default]
    LayerNameStartsWith,
    /// The layer metadata category list contains the tag string
    CategoryMetadataContains,
}

/// A typed configured value
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    Number(f64),
    Text(String),
    Numbers(Vec<f64>),
    Texts(Vec<String>),
}

impl ConfigValue {
    /// Numeric view; numeric text is accepted
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => Some(*n),
            ConfigValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// List view; a single number is a one-element list, text is parsed as `;`-separated
    pub fn as_numbers(&self) -> Option<Vec<f64>> {
        match self {
            ConfigValue::Numbers(v) => Some(v.clone()),
            ConfigValue::Number(n) => Some(vec![*n]),
            ConfigValue::Text(s) => parse_number_list(s).ok(),
            ConfigValue::Texts(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            ConfigValue::Number(n) => serde_json::json!(n),
            ConfigValue::Text(s) => serde_json::Value::String(s.clone()),
            ConfigValue::Numbers(v) => serde_json::Value::String(
                v.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(";"),
            ),
            ConfigValue::Texts(v) => serde_json::Value::String(v.join(";")),
        }
    }
}

/// Parse a `;`-separated list of numbers; blank items are skipped
pub fn parse_number_list(raw: &str) -> Result<Vec<f64>> {
    raw.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<f64>().map_err(|_| {
                GeneralizeError::InvalidParameter(format!("'{item}' is not a number in list '{raw}'"))
            })
        })
        .collect()
}

/// A `(tag, property) = value` assignment
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub tag: String,
    pub property: String,
    pub value: ConfigValue,
}

impl Variable {
    /// Persisted name of a variable: `tag[property]`
    pub fn format_name(tag: &str, property: &str) -> String {
        format!("{tag}[{property}]")
    }

    /// Split a persisted name into `(tag, property)`; the last bracketed group is the property
    pub fn parse_name(name: &str) -> Option<(String, String)> {
        let inner = name.strip_suffix(']')?;
        let open = inner.rfind('[')?;
        let (tag, property) = (&inner[..open], &inner[open + 1..]);
        if tag.is_empty() || property.is_empty() || property.contains(']') {
            return None;
        }
        Some((tag.to_string(), property.to_string()))
    }

    pub fn name(&self) -> String {
        Self::format_name(&self.tag, &self.property)
    }
}

/// Serialized form of a [`ConfigurationStore`]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationPayload {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Property>,
    #[serde(default)]
    pub variables: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_identify_mode: Option<TagIdentifyMode>,
}

/// Explicit configuration store for tags, properties and variables
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigurationStore {
    tags: Vec<String>,
    properties: BTreeMap<String, Property>,
    variables: BTreeMap<(String, String), ConfigValue>,
    tag_identify_mode: TagIdentifyMode,
}

impl Default for ConfigurationStore {
    fn default() -> Self {
        let mut store = Self::empty();
        for property in Self::default_properties() {
            store.add_property(property);
        }
        store
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl ConfigurationStore {
    /// A store without tags, properties or variables
    pub fn empty() -> Self {
        Self {
            tags: Vec::new(),
            properties: BTreeMap::new(),
            variables: BTreeMap::new(),
            tag_identify_mode: TagIdentifyMode::default(),
        }
    }

    /// Property catalogue every new project starts with
    pub fn default_properties() -> Vec<Property> {
        use PropertyType::*;
        vec![
            Property::default_property("_zoom_min", "Minimum zoom level", Number, false),
            Property::default_property("_zoom_max", "Maximum zoom level", Number, false),
            Property::default_property("_label_zoom_min", "Minimum zoom level for labels", Number, false),
            Property::default_property("_label_size_min", "Minimum label size", Number, false),
            Property::default_property("_label_size_max", "Maximum label size", Number, false),
            Property::default_property(
                "_label_size_increment",
                "Label size increment per zoom increment",
                Number,
                false,
            ),
            Property::default_property("_symbol_zoom_min", "Minimum zoom level for symbols", Number, false),
            Property::default_property("_symbol_size_min", "Minimum symbol size", Number, false),
            Property::default_property("_symbol_size_max", "Maximum symbol size", Number, false),
            Property::default_property(
                "_symbol_size_increment",
                "Symbol size increment per zoom increment",
                Number,
                false,
            ),
            Property::default_property("_symbol_color_sequence", "Symbol colors per zoom", String, true),
            Property::default_property("_style", "Style file to be automatically applied", File, false),
        ]
    }

    // === Tags ===

    #[inline]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[inline]
    pub fn tag_exists(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Register a tag; returns false if it already existed
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.tag_exists(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Remove tags together with all their variables
    pub fn remove_tags(&mut self, tags: &[&str]) {
        self.tags.retain(|t| !tags.contains(&t.as_str()));
        self.variables.retain(|(tag, _), _| !tags.contains(&tag.as_str()));
    }

    /// Rename a tag, carrying its variables over
    pub fn rename_tag(&mut self, old: &str, new: &str) -> Result<()> {
        if !self.tag_exists(old) {
            return Err(GeneralizeError::InvalidParameter(format!("Unknown tag '{old}'")));
        }
        if old != new && self.tag_exists(new) {
            return Err(GeneralizeError::InvalidParameter(format!("Tag '{new}' already exists")));
        }

        for tag in self.tags.iter_mut().filter(|t| t.as_str() == old) {
            *tag = new.to_string();
        }
        let moved: Vec<((String, String), ConfigValue)> = self
            .variables
            .iter()
            .filter(|((tag, _), _)| tag == old)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for ((_, property), value) in moved {
            self.variables.remove(&(old.to_string(), property.clone()));
            self.variables.insert((new.to_string(), property), value);
        }
        Ok(())
    }

    /// Copy every variable of `source` onto `target` (registering `target` if needed)
    pub fn clone_tag_properties(&mut self, source: &str, target: &str) -> Result<()> {
        if !self.tag_exists(source) {
            return Err(GeneralizeError::InvalidParameter(format!("Unknown tag '{source}'")));
        }
        self.add_tag(target);
        let copies: Vec<(String, ConfigValue)> = self
            .variables
            .iter()
            .filter(|((tag, _), _)| tag == source)
            .map(|((_, property), value)| (property.clone(), value.clone()))
            .collect();
        for (property, value) in copies {
            self.variables.insert((target.to_string(), property), value);
        }
        Ok(())
    }

    #[inline]
    pub fn tag_identify_mode(&self) -> TagIdentifyMode {
        self.tag_identify_mode
    }

    pub fn set_tag_identify_mode(&mut self, mode: TagIdentifyMode) {
        self.tag_identify_mode = mode;
    }

    /// Find the tag of a layer: the first configured tag matching under the current mode
    pub fn identify_tag(&self, layer_name: &str, categories: &[String]) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| match self.tag_identify_mode {
                TagIdentifyMode::LayerNameStartsWith => layer_name.starts_with(tag.as_str()),
                TagIdentifyMode::CategoryMetadataContains => categories.iter().any(|c| c == *tag),
            })
            .map(String::as_str)
    }

    // === Properties ===

    #[inline]
    pub fn properties(&self) -> &BTreeMap<String, Property> {
        &self.properties
    }

    #[inline]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Insert or replace a property
    pub fn add_property(&mut self, property: Property) {
        self.properties.insert(property.name.clone(), property);
    }

    /// Remove properties together with all variables using them
    pub fn remove_properties(&mut self, names: &[&str]) {
        self.properties.retain(|name, _| !names.contains(&name.as_str()));
        self.variables
            .retain(|(_, property), _| !names.contains(&property.as_str()));
    }

    /// Rename a property, carrying its variables over
    pub fn rename_property(&mut self, old: &str, new: &str) -> Result<()> {
        if old == new {
            return Ok(());
        }
        if self.properties.contains_key(new) {
            return Err(GeneralizeError::InvalidParameter(format!(
                "Property '{new}' already exists"
            )));
        }
        let mut property = self
            .properties
            .remove(old)
            .ok_or_else(|| GeneralizeError::InvalidParameter(format!("Unknown property '{old}'")))?;
        property.name = new.to_string();
        self.properties.insert(new.to_string(), property);

        let moved: Vec<(String, ConfigValue)> = self
            .variables
            .iter()
            .filter(|((_, property), _)| property == old)
            .map(|((tag, _), value)| (tag.clone(), value.clone()))
            .collect();
        for (tag, value) in moved {
            self.variables.remove(&(tag.clone(), old.to_string()));
            self.variables.insert((tag, new.to_string()), value);
        }
        Ok(())
    }

    // === Variables ===

    /// Assign a value to `(tag, property)`, coercing it to the property's type
    pub fn set_variable(&mut self, tag: &str, property: &str, value: ConfigValue) -> Result<()> {
        if !self.tag_exists(tag) {
            return Err(GeneralizeError::InvalidParameter(format!("Unknown tag '{tag}'")));
        }
        let definition = self.properties.get(property).ok_or_else(|| {
            GeneralizeError::InvalidParameter(format!("Unknown property '{property}'"))
        })?;
        let value = coerce_value(definition, value)?;
        self.variables
            .insert((tag.to_string(), property.to_string()), value);
        Ok(())
    }

    #[inline]
    pub fn variable(&self, tag: &str, property: &str) -> Option<&ConfigValue> {
        self.variables.get(&(tag.to_string(), property.to_string()))
    }

    pub fn remove_variable(&mut self, tag: &str, property: &str) -> Option<ConfigValue> {
        self.variables.remove(&(tag.to_string(), property.to_string()))
    }

    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.variables.iter().map(|((tag, property), value)| Variable {
            tag: tag.clone(),
            property: property.clone(),
            value: value.clone(),
        })
    }

    pub fn variables_by_tag(&self, tag: &str) -> Vec<Variable> {
        self.variables().filter(|v| v.tag == tag).collect()
    }

    pub fn variables_by_property(&self, property: &str) -> Vec<Variable> {
        self.variables().filter(|v| v.property == property).collect()
    }

    /// Whether `tag` has a variable for every property in `properties`
    pub fn tag_has_properties(&self, tag: &str, properties: &[&str]) -> bool {
        properties
            .iter()
            .all(|property| self.variable(tag, property).is_some())
    }

    pub fn group_by_tag(&self) -> BTreeMap<String, Vec<Variable>> {
        let mut grouped: BTreeMap<String, Vec<Variable>> = BTreeMap::new();
        for variable in self.variables() {
            grouped.entry(variable.tag.clone()).or_default().push(variable);
        }
        grouped
    }

    // === Persistence ===

    /// Build a store from its payload.
    ///
    /// Variables naming an unknown tag or property are dropped; variables whose value
    /// cannot be coerced to the property's type are an error.
    pub fn from_payload(payload: ConfigurationPayload) -> Result<Self> {
        let mut store = Self::empty();
        for tag in payload.tags {
            store.add_tag(tag);
        }
        for (name, mut property) in payload.properties {
            property.name = name;
            store.add_property(property);
        }
        if let Some(mode) = payload.tag_identify_mode {
            store.tag_identify_mode = mode;
        }

        for (name, raw) in payload.variables {
            let Some((tag, property)) = Variable::parse_name(&name) else {
                tracing::debug!("Ignoring malformed variable name '{name}'");
                continue;
            };
            if !store.tag_exists(&tag) || !store.properties.contains_key(&property) {
                tracing::debug!("Ignoring variable '{name}' for unknown tag or property");
                continue;
            }
            let value = match raw {
                serde_json::Value::Null => continue,
                serde_json::Value::Number(n) => ConfigValue::Number(n.as_f64().unwrap_or(f64::NAN)),
                serde_json::Value::String(s) => ConfigValue::Text(s),
                serde_json::Value::Bool(b) => ConfigValue::Text(b.to_string()),
                other => {
                    return Err(GeneralizeError::InvalidParameter(format!(
                        "Variable '{name}' has unsupported value {other}"
                    )));
                }
            };
            store.set_variable(&tag, &property, value).map_err(|e| {
                GeneralizeError::InvalidParameter(format!("Variable '{name}': {e}"))
            })?;
        }

        Ok(store)
    }

    pub fn to_payload(&self) -> ConfigurationPayload {
        ConfigurationPayload {
            tags: self.tags.clone(),
            properties: self.properties.clone(),
            variables: self
                .variables
                .iter()
                .map(|((tag, property), value)| (Variable::format_name(tag, property), value.to_json()))
                .collect(),
            tag_identify_mode: Some(self.tag_identify_mode),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let payload: ConfigurationPayload = serde_json::from_str(json)?;
        Self::from_payload(payload)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_payload())?)
    }
}

/// Coerce a raw value to what `property` declares
fn coerce_value(property: &Property, value: ConfigValue) -> Result<ConfigValue> {
    let mismatch = |value: &ConfigValue| {
        GeneralizeError::InvalidParameter(format!(
            "Value {value:?} does not match property '{}' ({:?}{})",
            property.name,
            property.property_type,
            if property.is_list { " list" } else { "" }
        ))
    };

    match (property.property_type, property.is_list) {
        (PropertyType::Number, false) => match value {
            ConfigValue::Number(n) if n.is_finite() => Ok(ConfigValue::Number(n)),
            ConfigValue::Text(ref s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(ConfigValue::Number)
                .ok_or_else(|| mismatch(&value)),
            other => Err(mismatch(&other)),
        },
        (PropertyType::Number, true) => match value {
            ConfigValue::Numbers(v) => Ok(ConfigValue::Numbers(v)),
            ConfigValue::Number(n) => Ok(ConfigValue::Numbers(vec![n])),
            ConfigValue::Text(s) => Ok(ConfigValue::Numbers(parse_number_list(&s)?)),
            other => Err(mismatch(&other)),
        },
        (_, false) => match value {
            ConfigValue::Text(s) => Ok(ConfigValue::Text(s)),
            ConfigValue::Number(n) => Ok(ConfigValue::Text(n.to_string())),
            other => Err(mismatch(&other)),
        },
        (_, true) => match value {
            ConfigValue::Texts(v) => Ok(ConfigValue::Texts(v)),
            ConfigValue::Text(s) => Ok(ConfigValue::Texts(
                s.split(';')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            other => Err(mismatch(&other)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> ConfigurationStore {
        let mut store = ConfigurationStore::default();
        store.add_tag("poi");
        store.add_tag("roads");
        store.add_property(Property::new("_percentiles", "Percentiles per zoom", PropertyType::Number, true));
        store.set_variable("poi", "_zoom_min", ConfigValue::Number(10.0)).unwrap();
        store.set_variable("poi", "_zoom_max", ConfigValue::Number(13.0)).unwrap();
        store
            .set_variable("poi", "_percentiles", ConfigValue::Text("5;25;50;100".to_string()))
            .unwrap();
        store.set_variable("roads", "_zoom_min", ConfigValue::Number(4.0)).unwrap();
        store
    }

    #[test]
    fn test_default_properties() {
        let store = ConfigurationStore::default();
        assert_eq!(store.properties().len(), 12);
        assert!(store.property("_zoom_min").unwrap().is_default);
        assert!(store.property("_symbol_color_sequence").unwrap().is_list);
        assert!(store.tags().is_empty());
    }

    #[test]
    fn test_variable_name_parsing() {
        assert_eq!(
            Variable::parse_name("poi[_zoom_min]"),
            Some(("poi".to_string(), "_zoom_min".to_string()))
        );
        assert_eq!(
            Variable::parse_name("a[b][c]"),
            Some(("a[b]".to_string(), "c".to_string()))
        );
        assert_eq!(Variable::parse_name("no_brackets"), None);
        assert_eq!(Variable::parse_name("[prop]"), None);
        assert_eq!(Variable::parse_name("tag[]"), None);
        assert_eq!(Variable::format_name("poi", "_zoom_min"), "poi[_zoom_min]");
    }

    #[test]
    fn test_list_values_are_parsed() {
        let store = create_test_store();
        assert_eq!(
            store.variable("poi", "_percentiles"),
            Some(&ConfigValue::Numbers(vec![5.0, 25.0, 50.0, 100.0]))
        );
    }

    #[test]
    fn test_set_variable_validates() {
        let mut store = create_test_store();
        assert!(store.set_variable("unknown", "_zoom_min", ConfigValue::Number(1.0)).is_err());
        assert!(store.set_variable("poi", "_unknown", ConfigValue::Number(1.0)).is_err());
        assert!(store
            .set_variable("poi", "_zoom_min", ConfigValue::Text("ten".to_string()))
            .is_err());
        store
            .set_variable("poi", "_zoom_min", ConfigValue::Text(" 11 ".to_string()))
            .unwrap();
        assert_eq!(store.variable("poi", "_zoom_min"), Some(&ConfigValue::Number(11.0)));
    }

    #[test]
    fn test_rename_tag_moves_variables() {
        let mut store = create_test_store();
        store.rename_tag("poi", "places").unwrap();
        assert!(!store.tag_exists("poi"));
        assert!(store.tag_exists("places"));
        assert!(store.variable("poi", "_zoom_min").is_none());
        assert_eq!(store.variable("places", "_zoom_min"), Some(&ConfigValue::Number(10.0)));
        assert!(store.rename_tag("places", "roads").is_err());
        assert!(store.rename_tag("missing", "x").is_err());
    }

    #[test]
    fn test_rename_and_remove_property() {
        let mut store = create_test_store();
        store.rename_property("_zoom_min", "_min_zoom").unwrap();
        assert!(store.property("_zoom_min").is_none());
        assert_eq!(store.property("_min_zoom").unwrap().name, "_min_zoom");
        assert_eq!(store.variable("roads", "_min_zoom"), Some(&ConfigValue::Number(4.0)));

        store.remove_properties(&["_min_zoom"]);
        assert!(store.variables_by_property("_min_zoom").is_empty());
    }

    #[test]
    fn test_clone_and_remove_tags() {
        let mut store = create_test_store();
        store.clone_tag_properties("poi", "poi_copy").unwrap();
        assert!(store.tag_has_properties("poi_copy", &["_zoom_min", "_zoom_max", "_percentiles"]));
        assert!(!store.tag_has_properties("roads", &["_zoom_min", "_zoom_max"]));

        store.remove_tags(&["poi"]);
        assert!(store.variables_by_tag("poi").is_empty());
        assert_eq!(store.group_by_tag().len(), 2);
    }

    #[test]
    fn test_identify_tag_modes() {
        let mut store = create_test_store();
        assert_eq!(store.identify_tag("poi_restaurants", &[]), Some("poi"));
        assert_eq!(store.identify_tag("rivers", &[]), None);

        store.set_tag_identify_mode(TagIdentifyMode::CategoryMetadataContains);
        assert_eq!(store.identify_tag("poi_restaurants", &[]), None);
        assert_eq!(
            store.identify_tag("anything", &["misc".to_string(), "roads".to_string()]),
            Some("roads")
        );
    }

    #[test]
    fn test_json_payload() {
        let json = r#"{
            "tags": ["poi"],
            "properties": {
                "_zoom_min": {"description": "Minimum zoom level", "type": "number", "isList": false},
                "_percentiles": {"description": "Percentiles", "type": "number", "isList": true, "validValues": [5, 25]},
                "_style": {"description": "Style", "type": "file", "isList": false, "isDefault": true}
            },
            "variables": {
                "poi[_zoom_min]": 10,
                "poi[_percentiles]": "5;25;50;100",
                "other[_zoom_min]": 3,
                "poi[_unknown]": 1
            },
            "tagIdentifyMode": "category_metadata_contains"
        }"#;

        let store = ConfigurationStore::from_json(json).unwrap();
        assert_eq!(store.tags(), &["poi".to_string()]);
        assert_eq!(store.property("_zoom_min").unwrap().name, "_zoom_min");
        assert_eq!(store.property("_style").unwrap().property_type, PropertyType::File);
        assert_eq!(store.tag_identify_mode(), TagIdentifyMode::CategoryMetadataContains);
        assert_eq!(store.variables().count(), 2);

        let payload = store.to_payload();
        assert_eq!(
            payload.variables.get("poi[_percentiles]"),
            Some(&serde_json::Value::String("5;25;50;100".to_string()))
        );

        let reloaded = ConfigurationStore::from_json(&store.to_json().unwrap()).unwrap();
        assert_eq!(reloaded, store);
    }

    #[test]
    fn test_invalid_variable_value_is_an_error() {
        let json = r#"{
            "tags": ["poi"],
            "properties": {"_zoom_min": {"type": "number"}},
            "variables": {"poi[_zoom_min]": "not a number"}
        }"#;
        assert!(matches!(
            ConfigurationStore::from_json(json),
            Err(GeneralizeError::InvalidParameter(_))
        ));
    }
}
