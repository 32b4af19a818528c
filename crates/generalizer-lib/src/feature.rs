//! Feature and dataset storage
//!
//! Features are owned by their [`Dataset`]; the batch pipeline and the evaluation engine
//! only read them and produce annotation maps keyed by [`FeatureId`], which are merged
//! back into the dataset with [`Dataset::update_attribute`].

use crate::{GeneralizeError, Result};
use geo::{Coord, Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

/// Stable feature identifier
pub type FeatureId = u64;

/// A single attribute value: numeric, textual or null
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    #[default]
    Null,
    Number(f64),
    Text(String),
}

impl AttributeValue {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Numeric view of the value.
    ///
    /// Text that parses as a number is accepted, mirroring how rendering engines
    /// coerce string fields in numeric expressions.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Null => None,
            AttributeValue::Number(n) if n.is_finite() => Some(*n),
            AttributeValue::Number(_) => None,
            AttributeValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "NULL"),
            AttributeValue::Number(n) => write!(f, "{n}"),
            AttributeValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Number(value as f64)
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        AttributeValue::Number(value as f64)
    }
}

impl From<usize> for AttributeValue {
    fn from(value: usize) -> Self {
        AttributeValue::Number(value as f64)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttributeValue::Null)
    }
}

/// A point feature with named attributes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Stable identifier, unique within a dataset
    pub id: FeatureId,
    /// Point geometry in the dataset's (projected) coordinate system
    pub geometry: Point<f64>,
    /// Named attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Feature {
    pub fn new(id: FeatureId, geometry: Point<f64>) -> Self {
        Self {
            id,
            geometry,
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Raw attribute lookup (`None` when the attribute does not exist)
    #[inline]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Attribute lookup treating null values as absent
    #[inline]
    pub fn non_null_attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name).filter(|v| !v.is_null())
    }

    #[inline]
    pub fn numeric_attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).and_then(AttributeValue::as_f64)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<AttributeValue> {
        self.attributes.remove(name)
    }
}

/// An ordered collection of point features sharing a coordinate system
///
/// A dataset doubles as a rendered *layer*: its `name` and `categories` are what
/// tag identification inspects.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredDataset")]
pub struct Dataset {
    /// Layer name
    #[serde(default)]
    pub name: String,
    /// Layer metadata categories
    #[serde(default)]
    pub categories: Vec<String>,
    /// Features in insertion order
    #[serde(default)]
    features: Vec<Feature>,
    /// Position of each feature in `features`, kept in sync on every insertion
    #[serde(skip)]
    positions: HashMap<FeatureId, usize>,
}

/// Serialized shape of a [`Dataset`]; the id index is rebuilt on load
#[derive(Deserialize)]
struct StoredDataset {
    #[serde(default)]
    name: String,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    features: Vec<Feature>,
}

impl TryFrom<StoredDataset> for Dataset {
    type Error = GeneralizeError;

    fn try_from(stored: StoredDataset) -> Result<Self> {
        let mut dataset = Dataset::new(stored.name).with_categories(stored.categories);
        dataset.features.reserve(stored.features.len());
        dataset.positions.reserve(stored.features.len());
        for feature in stored.features {
            dataset.push(feature)?;
        }
        Ok(dataset)
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Dataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            categories: Vec::new(),
            features: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    /// Build a dataset from features, rejecting duplicate identifiers
    pub fn from_features(name: impl Into<String>, features: Vec<Feature>) -> Result<Self> {
        let mut dataset = Self::new(name);
        dataset.features.reserve(features.len());
        dataset.positions.reserve(features.len());
        for feature in features {
            dataset.push(feature)?;
        }
        Ok(dataset)
    }

    /// Append a feature; its identifier must be unused
    pub fn push(&mut self, feature: Feature) -> Result<()> {
        if self.positions.contains_key(&feature.id) {
            return Err(GeneralizeError::InvalidParameter(format!(
                "Duplicate feature id {} in dataset '{}'",
                feature.id, self.name
            )));
        }
        self.positions.insert(feature.id, self.features.len());
        self.features.push(feature);
        Ok(())
    }

    #[inline]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.positions.get(&id).map(|&position| &self.features[position])
    }

    /// `(id, point)` pairs in dataset order
    pub fn points(&self) -> Vec<(FeatureId, Point<f64>)> {
        self.features.iter().map(|f| (f.id, f.geometry)).collect()
    }

    /// Add an attribute to every feature that does not have it yet
    pub fn add_attribute(&mut self, name: &str, initial: AttributeValue) {
        for feature in &mut self.features {
            feature
                .attributes
                .entry(name.to_string())
                .or_insert_with(|| initial.clone());
        }
    }

    /// Remove an attribute from every feature
    pub fn remove_attribute(&mut self, name: &str) {
        for feature in &mut self.features {
            feature.attributes.remove(name);
        }
    }

    /// Write an annotation map into the dataset.
    ///
    /// Features missing from `values` receive a null value so the attribute exists
    /// on every feature afterwards.
    pub fn update_attribute(&mut self, name: &str, values: &HashMap<FeatureId, AttributeValue>) {
        for feature in &mut self.features {
            let value = values.get(&feature.id).cloned().unwrap_or_default();
            feature.attributes.insert(name.to_string(), value);
        }
    }

    /// Merge another dataset into this one
    ///
    /// Both datasets must have disjoint feature identifiers; on conflict nothing is merged.
    pub fn merge(&mut self, other: Dataset) -> Result<()> {
        if let Some(conflict) = other.features.iter().find(|f| self.positions.contains_key(&f.id)) {
            return Err(GeneralizeError::InvalidParameter(format!(
                "Cannot merge '{}' into '{}': feature id {} exists in both",
                other.name, self.name, conflict.id
            )));
        }
        for feature in other.features {
            self.positions.insert(feature.id, self.features.len());
            self.features.push(feature);
        }
        for category in other.categories {
            if !self.categories.contains(&category) {
                self.categories.push(category);
            }
        }
        Ok(())
    }

    /// Bounding box of all feature geometries (None if empty)
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        let first = self.features.first()?.geometry;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x(), first.y(), first.x(), first.y());
        for feature in &self.features[1..] {
            let p = feature.geometry;
            min_x = min_x.min(p.x());
            min_y = min_y.min(p.y());
            max_x = max_x.max(p.x());
            max_y = max_y.max(p.y());
        }
        Some(Rect::new(
            Coord { x: min_x, y: min_y },
            Coord { x: max_x, y: max_y },
        ))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
