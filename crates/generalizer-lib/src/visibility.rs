//! Runtime visibility decisions
//!
//! Every function answers "is `feature` drawn at the context's zoom?" and is meant to be
//! called once per feature per render pass. Layer-wide statistics (the sorted attribute
//! scan, percentile thresholds, per-cluster rankings) are memoized in the context's
//! cache under keys that encode every input they depend on.
//!
//! Arguments are [`ValueRef`]s: either literals or `(tag, property)` references resolved
//! through the [`VariableResolver`](crate::VariableResolver) at call entry.

use crate::utils::{bound_value, percentile};
use crate::{
    AttributeValue, ClusterRanking, EvaluationContext, Feature, GeneralizeError, RankedMember,
    Result, SelectionMethod, ValueRef,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Boolean-as-integer form of a decision, as rendering filters expect it
#[inline]
pub fn filter_value(visible: bool) -> u8 {
    u8::from(visible)
}

/// `min_zoom <= Z <= max_zoom`
pub fn visible_by_zoom_range(
    context: &mut EvaluationContext<'_>,
    feature: &Feature,
    min_zoom: &ValueRef<f64>,
    max_zoom: &ValueRef<f64>,
) -> Result<bool> {
    let min_zoom = context.resolve(min_zoom, feature)?;
    let max_zoom = context.resolve(max_zoom, feature)?;
    let zoom = context.zoom() as f64;
    Ok(min_zoom <= zoom && zoom <= max_zoom)
}

/// `Z - min_zoom >= offset`; pair with the offset attribute baked by the batch pipeline
pub fn visible_by_offset(
    context: &mut EvaluationContext<'_>,
    feature: &Feature,
    min_zoom: &ValueRef<f64>,
    offset: &ValueRef<f64>,
) -> Result<bool> {
    let min_zoom = context.resolve(min_zoom, feature)?;
    let offset = context.resolve(offset, feature)?;
    Ok(context.zoom() as f64 - min_zoom >= offset)
}

/// Percentile schedule read from an array indexed by `Z - min_zoom`.
///
/// Inside `[min_zoom, max_zoom]` a feature is visible iff its attribute is at least the
/// `(100 - p)`-th percentile of the attribute over the whole layer. At `max_zoom` a null
/// attribute counts as visible.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn visible_by_percentile_array(
    context: &mut EvaluationContext<'_>,
    feature: &Feature,
    min_zoom: &ValueRef<f64>,
    max_zoom: &ValueRef<f64>,
    attribute: &str,
    percentiles: &ValueRef<Vec<f64>>,
) -> Result<bool> {
    let min_zoom = context.resolve(min_zoom, feature)?;
    let max_zoom = context.resolve(max_zoom, feature)?;
    let percentiles = context.resolve(percentiles, feature)?;

    if percentiles.is_empty() {
        return Err(GeneralizeError::InvalidParameter(
            "The percentile array cannot be empty".to_string(),
        ));
    }
    if let Some(p) = percentiles.iter().find(|p| !(0.0..=100.0).contains(*p)) {
        return Err(GeneralizeError::InvalidParameter(format!(
            "Percentile {p} is outside [0, 100]"
        )));
    }

    let zoom = context.zoom() as f64;
    if zoom < min_zoom || zoom > max_zoom {
        return Ok(false);
    }

    let index = bound_value((zoom - min_zoom).floor(), 0.0, (percentiles.len() - 1) as f64) as usize;
    visible_at_percentile(context, feature, attribute, percentiles[index], zoom == max_zoom)
}

/// Continuous percentile schedule:
/// `p = clamp(min_percentile + increment × (Z - min_zoom), min_percentile, 100)`
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn visible_by_percentile_increment(
    context: &mut EvaluationContext<'_>,
    feature: &Feature,
    min_zoom: &ValueRef<f64>,
    max_zoom: &ValueRef<f64>,
    attribute: &str,
    increment: &ValueRef<f64>,
    min_percentile: &ValueRef<f64>,
) -> Result<bool> {
    let min_zoom = context.resolve(min_zoom, feature)?;
    let max_zoom = context.resolve(max_zoom, feature)?;
    let increment = context.resolve(increment, feature)?;
    let min_percentile = context.resolve(min_percentile, feature)?;

    if !(0.0..=100.0).contains(&min_percentile) {
        return Err(GeneralizeError::InvalidParameter(format!(
            "Minimum percentile {min_percentile} is outside [0, 100]"
        )));
    }

    let zoom = context.zoom() as f64;
    if zoom < min_zoom || zoom > max_zoom {
        return Ok(false);
    }

    let p = bound_value(min_percentile + increment * (zoom - min_zoom), min_percentile, 100.0);
    visible_at_percentile(context, feature, attribute, p, zoom == max_zoom)
}

/// Live cluster election: the top (or bottom) `initial_count + increment × (Z - min_zoom)`
/// members of the feature's cluster by `selection_attribute` are visible.
///
/// Features without a cluster id or selection value are not visible.
#[allow(clippy::too_many_arguments)]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn visible_by_cluster(
    context: &mut EvaluationContext<'_>,
    feature: &Feature,
    min_zoom: &ValueRef<f64>,
    initial_count: &ValueRef<f64>,
    increment: &ValueRef<f64>,
    cluster_attribute: &str,
    selection_attribute: &str,
    method: SelectionMethod,
) -> Result<bool> {
    let min_zoom = context.resolve(min_zoom, feature)?;
    let initial_count = context.resolve(initial_count, feature)?;
    let increment = context.resolve(increment, feature)?;

    let zoom = context.zoom() as f64;
    if zoom < min_zoom {
        return Ok(false);
    }

    let count = (initial_count + increment * (zoom - min_zoom)).floor();
    if count < 1.0 {
        return Ok(false);
    }

    let Some(cluster) = feature.non_null_attribute(cluster_attribute).map(cluster_key) else {
        return Ok(false);
    };
    if feature.numeric_attribute(selection_attribute).is_none() {
        return Ok(false);
    }

    let ranking = cluster_ranking(context, cluster_attribute, selection_attribute, method, &cluster);
    let rank = ranking.and_then(|ranking| ranking.rank_of(feature.id));
    Ok(rank.is_some_and(|rank| (rank as f64) < count))
}

/// Shared tail of the percentile functions
fn visible_at_percentile(
    context: &mut EvaluationContext<'_>,
    feature: &Feature,
    attribute: &str,
    p: f64,
    at_max_zoom: bool,
) -> Result<bool> {
    let Some(value) = feature.numeric_attribute(attribute) else {
        return Ok(at_max_zoom);
    };

    let Some(threshold) = layer_percentile(context, attribute, 100.0 - p) else {
        // Nothing to compare against
        return Ok(false);
    };
    Ok(value >= threshold)
}

/// Sorted non-null numeric values of `attribute` over the whole layer (one scan per pass)
pub fn layer_values(context: &mut EvaluationContext<'_>, attribute: &str) -> Arc<Vec<f64>> {
    let layer = context.layer();
    context
        .cache_mut()
        .cached_section(format!("_layer_all_attrs_values:{attribute}"), || {
            let mut values: Vec<f64> = layer
                .features()
                .iter()
                .filter_map(|f| f.numeric_attribute(attribute))
                .collect();
            values.sort_unstable_by(f64::total_cmp);
            Arc::new(values)
        })
}

/// `q`-th percentile of `attribute` over the layer, memoized per `(attribute, q)`
pub fn layer_percentile(context: &mut EvaluationContext<'_>, attribute: &str, q: f64) -> Option<f64> {
    let values = layer_values(context, attribute);
    context
        .cache_mut()
        .cached_section(format!("_layer_percentile:{attribute}:{q}"), || percentile(&values, q))
}

/// Cluster ids are compared by their display form so `3` and `3.0` match
fn cluster_key(value: &AttributeValue) -> String {
    value.to_string()
}

/// Ranking of one cluster; every cluster of the layer is ranked in a single memoized pass
fn cluster_ranking(
    context: &mut EvaluationContext<'_>,
    cluster_attribute: &str,
    selection_attribute: &str,
    method: SelectionMethod,
    cluster: &str,
) -> Option<Arc<ClusterRanking>> {
    let namespace = format!("{cluster_attribute}:{selection_attribute}:{method:?}");
    let layer = context.layer();
    let groups: Arc<HashMap<String, Arc<ClusterRanking>>> =
        context
            .cache_mut()
            .cached_section(format!("_layer_cluster_groups:{namespace}"), || {
                let mut groups: HashMap<String, Vec<RankedMember>> = HashMap::new();
                for f in layer.features() {
                    let (Some(key), Some(value)) = (
                        f.non_null_attribute(cluster_attribute).map(cluster_key),
                        f.numeric_attribute(selection_attribute),
                    ) else {
                        continue;
                    };
                    groups.entry(key).or_default().push(RankedMember {
                        value,
                        feature_id: f.id,
                    });
                }
                let rankings = groups
                    .into_iter()
                    .map(|(key, members)| (key, Arc::new(ClusterRanking::new(members, method))))
                    .collect();
                Arc::new(rankings)
            });

    groups.get(cluster).cloned()
}
