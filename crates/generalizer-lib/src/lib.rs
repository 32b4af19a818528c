//! Webmap Generalizer - Zoom-level generalization of large point datasets
//!
//! This library decides, for every feature of a point dataset and every zoom level,
//! whether that feature should be drawn. It is split in two halves that share the
//! same data model:
//!
//! - an offline **batch pipeline** that clusters points at halving distance thresholds,
//!   elects one representative per cluster per level and bakes the result into a
//!   per-feature visibility offset attribute;
//! - a runtime **evaluation engine** that answers "is this feature visible at zoom `Z`?"
//!   from zoom ranges, layer-wide percentiles or live cluster rankings, memoizing the
//!   expensive layer scans in a per-pass [`EvaluationContext`].
//!
//! # Architecture
//!
//! - **[`Dataset`] / [`Feature`]**: point features with named attributes
//! - **[`AttributeCache`]**: request-scoped memo table owned by an [`EvaluationContext`]
//! - **[`ConfigurationStore`]**: tags, properties and per-tag variables
//! - **[`VariableResolver`]**: attribute → configured value → default precedence
//! - **[`PointIndex`]**: quadtree used for radius and nearest-neighbour queries
//! - **[`cluster_points`]** / **[`elect`]** / **[`ClusteredVisualization`]**: the batch pipeline
//! - **[`visibility`]** / **[`control`]**: the runtime decision and sizing functions
//!
//! # Performance Characteristics
//!
//! - **Clustering**: O(N log N) per level (quadtree radius queries + union-find)
//! - **Evaluation**: O(N log N) once per distinct statistic and pass, O(1) per feature afterwards

mod cache;
mod clustering;
mod config;
pub mod control;
mod election;
mod evaluation;
mod feature;
mod grid;
mod pipeline;
mod resolver;
mod spatial;
pub mod utils;
pub mod visibility;

// Public API exports
pub use cache::{AttributeCache, Cacheable, CachedValue, ClusterRanking, RankedMember};
pub use clustering::{
    ClusterAssignment, ClusterId, DEFAULT_CLUSTER_ID_ATTRIBUTE, DEFAULT_CLUSTER_SIZE_ATTRIBUTE,
    UnionFind, cluster_points, clusterize_by_distance,
};
pub use config::{
    ConfigValue, ConfigurationPayload, ConfigurationStore, Property, PropertyType,
    TagIdentifyMode, Variable,
};
pub use election::{
    ElectedSet, OffsetPolicy, SelectionMethod, VisibilityOffsets, advance_offsets, elect,
    finalize_offsets,
};
pub use evaluation::{EvaluationContext, render_layers_parallel, render_pass};
pub use feature::{AttributeValue, Dataset, Feature, FeatureId};
pub use grid::{GRID_OFFSET_ATTRIBUTE, GridConfig, GridVisualization};
pub use pipeline::{
    CancellationToken, ClusteredVisualization, DEFAULT_VISIBILITY_ATTRIBUTE, PipelineConfig,
};
pub use resolver::{
    FromConfigValue, PropertyRef, ValueRef, ValueSource, VariableResolver, parse_list_argument,
};
pub use spatial::PointIndex;

/// Error types for generalization and evaluation
#[derive(Debug, thiserror::Error)]
pub enum GeneralizeError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(
        "Missing configuration for property '{property}' of tag '{tag}'. Did you forget to tag/configure this layer?"
    )]
    MissingConfiguration { tag: String, property: String },

    #[error("Clustering failed at level {level}: {reason}")]
    ClusteringFailure { level: u32, reason: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GeneralizeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that all public types are accessible
        let _: fn() -> PipelineConfig = PipelineConfig::default;
        let _: fn() -> ConfigurationStore = ConfigurationStore::default;
        let _: fn() -> AttributeCache = AttributeCache::new;
    }

    #[test]
    fn test_missing_configuration_message_names_tag_and_property() {
        let err = GeneralizeError::MissingConfiguration {
            tag: "poi".to_string(),
            property: "_zoom_min".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("poi"));
        assert!(message.contains("_zoom_min"));
        assert!(message.contains("tag/configure"));
    }
}
