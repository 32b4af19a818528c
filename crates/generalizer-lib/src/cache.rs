//! Request-scoped attribute cache
//!
//! Every visibility function is called once per feature per redraw, and most of them
//! depend on layer-wide statistics. The [`AttributeCache`] memoizes those results for
//! the lifetime of a single evaluation pass. There is no eviction: the cache is bounded
//! by the number of distinct keys touched during one pass and is dropped with its
//! [`EvaluationContext`](crate::EvaluationContext).

use crate::{FeatureId, SelectionMethod};
use std::collections::HashMap;
use std::sync::Arc;

/// One member of a ranked cluster: its selection value and feature id
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankedMember {
    pub value: f64,
    pub feature_id: FeatureId,
}

/// Members of one cluster in election order (best first, ties by lowest id), indexed
/// by feature id so a member's rank is a single lookup
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusterRanking {
    members: Vec<RankedMember>,
    ranks: HashMap<FeatureId, usize>,
}

impl ClusterRanking {
    pub fn new(mut members: Vec<RankedMember>, method: SelectionMethod) -> Self {
        members.sort_unstable_by(|a, b| {
            let by_value = match method {
                SelectionMethod::Max => b.value.total_cmp(&a.value),
                SelectionMethod::Min => a.value.total_cmp(&b.value),
            };
            by_value.then(a.feature_id.cmp(&b.feature_id))
        });
        let ranks = members
            .iter()
            .enumerate()
            .map(|(rank, member)| (member.feature_id, rank))
            .collect();
        Self { members, ranks }
    }

    #[inline]
    pub fn members(&self) -> &[RankedMember] {
        &self.members
    }

    /// 0-based position of `feature_id` in the ranking
    #[inline]
    pub fn rank_of(&self, feature_id: FeatureId) -> Option<usize> {
        self.ranks.get(&feature_id).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Values that can be stored in the cache
#[derive(Clone, Debug, PartialEq)]
pub enum CachedValue {
    Flag(bool),
    Number(Option<f64>),
    /// Sorted numeric values of one attribute over a whole layer
    Values(Arc<Vec<f64>>),
    /// Rankings of every cluster of a layer by cluster key
    Groups(Arc<HashMap<String, Arc<ClusterRanking>>>),
}

/// Conversion between a concrete result type and its [`CachedValue`] representation
pub trait Cacheable: Sized {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: &CachedValue) -> Option<Self>;
}

impl Cacheable for bool {
    fn into_cached(self) -> CachedValue {
        CachedValue::Flag(self)
    }

    fn from_cached(value: &CachedValue) -> Option<Self> {
        match value {
            CachedValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl Cacheable for Option<f64> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Number(self)
    }

    fn from_cached(value: &CachedValue) -> Option<Self> {
        match value {
            CachedValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl Cacheable for Arc<Vec<f64>> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Values(self)
    }

    fn from_cached(value: &CachedValue) -> Option<Self> {
        match value {
            CachedValue::Values(v) => Some(Arc::clone(v)),
            _ => None,
        }
    }
}

impl Cacheable for Arc<HashMap<String, Arc<ClusterRanking>>> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Groups(self)
    }

    fn from_cached(value: &CachedValue) -> Option<Self> {
        match value {
            CachedValue::Groups(g) => Some(Arc::clone(g)),
            _ => None,
        }
    }
}

/// Compute-once memo table keyed by strings
///
/// Keys must encode every input that affects the stored value; the cache itself
/// performs no namespacing.
#[derive(Debug, Default)]
pub struct AttributeCache {
    entries: HashMap<String, CachedValue>,
    /// Number of times a compute closure actually ran
    computations: usize,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl AttributeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value stored under `key`, computing and storing it on first use.
    ///
    /// An entry of a different type under the same key is treated as a miss and
    /// replaced.
    pub fn cached_section<V, F>(&mut self, key: impl Into<String>, compute: F) -> V
    where
        V: Cacheable + Clone,
        F: FnOnce() -> V,
    {
        let key = key.into();
        if let Some(value) = self.entries.get(&key).and_then(V::from_cached) {
            return value;
        }

        let value = compute();
        self.computations += 1;
        self.entries.insert(key, value.clone().into_cached());
        value
    }

    /// Fallible variant of [`cached_section`](Self::cached_section).
    ///
    /// Errors are returned to the caller and nothing is stored, so a later call with
    /// the same key retries the computation.
    pub fn try_cached_section<V, E, F>(&mut self, key: impl Into<String>, compute: F) -> Result<V, E>
    where
        V: Cacheable + Clone,
        F: FnOnce() -> Result<V, E>,
    {
        let key = key.into();
        if let Some(value) = self.entries.get(&key).and_then(V::from_cached) {
            return Ok(value);
        }

        let value = compute()?;
        self.computations += 1;
        self.entries.insert(key, value.clone().into_cached());
        Ok(value)
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&CachedValue> {
        self.entries.get(key)
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of compute closures run so far (cache misses)
    #[inline]
    pub fn computations(&self) -> usize {
        self.computations
    }
}
