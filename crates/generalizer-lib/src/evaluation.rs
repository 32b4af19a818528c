//! Evaluation contexts and render passes
//!
//! An [`EvaluationContext`] is the scope of one rendering pass over one layer: it knows
//! the layer, the configuration, the current zoom and the layer's tag, and owns the
//! [`AttributeCache`] every visibility function memoizes into. A context is never shared
//! between threads; parallel rendering gives each worker its own context.

use crate::resolver::FromConfigValue;
use crate::{
    AttributeCache, ConfigurationStore, Dataset, Feature, FeatureId, Result, ValueRef,
    VariableResolver,
};
use rayon::prelude::*;

/// Runtime scope of one rendering pass over one layer
#[derive(Debug)]
pub struct EvaluationContext<'a> {
    layer: &'a Dataset,
    store: &'a ConfigurationStore,
    /// Current zoom level (1-based, as reported by the host)
    zoom: u32,
    tag: Option<String>,
    cache: AttributeCache,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<'a> EvaluationContext<'a> {
    /// Create a context for `layer` at `zoom`; the tag is identified once from the
    /// layer's name or categories.
    pub fn new(layer: &'a Dataset, store: &'a ConfigurationStore, zoom: u32) -> Self {
        let tag = store
            .identify_tag(&layer.name, &layer.categories)
            .map(str::to_string);
        if tag.is_none() {
            tracing::debug!("Layer '{}' matches no configured tag", layer.name);
        }
        Self {
            layer,
            store,
            zoom,
            tag,
            cache: AttributeCache::new(),
        }
    }

    /// Override the identified tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[inline]
    pub fn layer(&self) -> &'a Dataset {
        self.layer
    }

    #[inline]
    pub fn store(&self) -> &'a ConfigurationStore {
        self.store
    }

    #[inline]
    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    #[inline]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    #[inline]
    pub fn resolver(&self) -> VariableResolver<'a> {
        VariableResolver::new(self.store)
    }

    #[inline]
    pub fn cache(&self) -> &AttributeCache {
        &self.cache
    }

    #[inline]
    pub fn cache_mut(&mut self) -> &mut AttributeCache {
        &mut self.cache
    }

    /// Resolve a literal-or-reference argument for `feature` against this layer's tag
    pub fn resolve<T: FromConfigValue + Clone>(&self, value: &ValueRef<T>, feature: &Feature) -> Result<T> {
        self.resolver().resolve_value(self.tag(), value, Some(feature))
    }
}

/// Evaluate `predicate` for every feature of `layer` within one fresh context.
///
/// Returns the ids of visible features. A feature whose evaluation fails is logged
/// and treated as not visible; the pass itself never aborts.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn render_pass<F>(layer: &Dataset, store: &ConfigurationStore, zoom: u32, mut predicate: F) -> Vec<FeatureId>
where
    F: FnMut(&mut EvaluationContext<'_>, &Feature) -> Result<bool>,
{
    let mut context = EvaluationContext::new(layer, store, zoom);
    let mut visible = Vec::new();
    let mut failures = 0usize;

    for feature in layer.features() {
        match predicate(&mut context, feature) {
            Ok(true) => visible.push(feature.id),
            Ok(false) => {}
            Err(e) => {
                failures += 1;
                tracing::warn!("Feature {} of layer '{}' hidden: {}", feature.id, layer.name, e);
            }
        }
    }

    tracing::debug!(
        "Rendered '{}' at zoom {}: {}/{} visible, {} failed, {} cached statistics",
        layer.name,
        zoom,
        visible.len(),
        layer.len(),
        failures,
        context.cache().len()
    );
    visible
}

/// [`render_pass`] over many layers in parallel, one context per layer.
///
/// Results are returned in the order of `layers`.
pub fn render_layers_parallel<F>(
    layers: &[Dataset],
    store: &ConfigurationStore,
    zoom: u32,
    predicate: F,
) -> Vec<Vec<FeatureId>>
where
    F: Fn(&mut EvaluationContext<'_>, &Feature) -> Result<bool> + Sync,
{
    profiling::scope!("render_layers_parallel");
    layers
        .par_iter()
        .map(|layer| render_pass(layer, store, zoom, &predicate))
        .collect()
}
