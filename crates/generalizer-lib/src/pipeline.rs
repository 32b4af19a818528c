//! Clustered visualization batch pipeline
//!
//! For levels `0..N` the dataset is clustered at `base_distance / 2^level`, one
//! representative per cluster is elected, and the elected features receive the level
//! as their visibility offset. Levels are computed as pure functions over the original
//! points; the dataset is only written once, after every level succeeded.

use crate::election::OffsetPolicy;
use crate::{
    Dataset, FeatureId, GeneralizeError, Result, SelectionMethod,
    VisibilityOffsets, advance_offsets, cluster_points, elect,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Attribute the pipeline writes unless configured otherwise
pub const DEFAULT_VISIBILITY_ATTRIBUTE: &str = "_visibility_offset";

/// Configuration for [`ClusteredVisualization`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Clustering distance at level 0, in dataset units
    pub base_distance: f64,
    /// Number of levels (>= 1)
    pub zoom_levels: u32,
    /// Numeric attribute deciding cluster elections
    pub election_attribute: String,
    pub method: SelectionMethod,
    /// Attribute receiving the visibility offset
    pub output_attribute: String,
    pub isolated_features_always_visible: bool,
    pub show_all_at_last_zoom_level: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_distance: 1000.0,
            zoom_levels: 5,
            election_attribute: String::new(),
            method: SelectionMethod::Max,
            output_attribute: DEFAULT_VISIBILITY_ATTRIBUTE.to_string(),
            isolated_features_always_visible: false,
            show_all_at_last_zoom_level: false,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.base_distance.is_finite() && self.base_distance > 0.0) {
            return Err(GeneralizeError::InvalidParameter(format!(
                "Base distance must be positive, got {}",
                self.base_distance
            )));
        }
        if self.zoom_levels == 0 {
            return Err(GeneralizeError::InvalidParameter(
                "Number of zoom levels must be at least 1".to_string(),
            ));
        }
        if self.election_attribute.is_empty() {
            return Err(GeneralizeError::InvalidParameter(
                "An election attribute is required".to_string(),
            ));
        }
        if self.output_attribute.is_empty() {
            return Err(GeneralizeError::InvalidParameter(
                "The output attribute name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Clustering distance of `level`
    #[inline]
    pub fn level_distance(&self, level: u32) -> f64 {
        self.base_distance / 2f64.powi(level as i32)
    }

    fn offset_policy(&self) -> OffsetPolicy {
        OffsetPolicy {
            isolated_features_always_visible: self.isolated_features_always_visible,
            show_all_at_last_zoom_level: self.show_all_at_last_zoom_level,
        }
    }
}

/// Cooperative cancellation flag shared between a running pipeline and its caller
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Cancellation point: fails with [`GeneralizeError::Cancelled`] once cancelled
    #[inline]
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(GeneralizeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// The multi-level clustering and election batch job
#[derive(Clone, Debug)]
pub struct ClusteredVisualization {
    config: PipelineConfig,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl ClusteredVisualization {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Compute visibility offsets for every feature of `dataset`.
    ///
    /// Cancellation is observed before each level and between clustering and election.
    /// Any error discards all levels computed so far.
    pub fn run(&self, dataset: &Dataset, cancel: &CancellationToken) -> Result<VisibilityOffsets> {
        let config = &self.config;
        let points = dataset.points();
        let selection_values = self.selection_values(dataset)?;
        let policy = config.offset_policy();
        let last_level = config.zoom_levels - 1;

        tracing::info!(
            "Clustering '{}': {} features, {} levels, base distance {}",
            dataset.name,
            points.len(),
            config.zoom_levels,
            config.base_distance
        );

        let mut offsets = VisibilityOffsets::new();
        for level in 0..config.zoom_levels {
            cancel.check()?;
            let distance = config.level_distance(level);
            let assignment = cluster_points(&points, level, distance)?;

            cancel.check()?;
            let elected = elect(&assignment, &selection_values, config.method, &offsets);
            let assigned_before = offsets.len();
            offsets = advance_offsets(offsets, &elected, &assignment, level, level == last_level, policy);

            tracing::info!(
                "Level {}: distance {:.3}, {} clusters, {} elected, {} offsets assigned",
                level,
                distance,
                assignment.cluster_count(),
                elected.len(),
                offsets.len() - assigned_before
            );
        }

        Ok(offsets)
    }

    /// Run the pipeline and write the offsets into `dataset` in one step.
    ///
    /// The dataset is left untouched if the run fails or is cancelled.
    pub fn apply(&self, dataset: &mut Dataset, cancel: &CancellationToken) -> Result<VisibilityOffsets> {
        let offsets = self.run(dataset, cancel)?;
        dataset.update_attribute(&self.config.output_attribute, &offsets.to_attribute_map());
        Ok(offsets)
    }

    fn selection_values(&self, dataset: &Dataset) -> Result<HashMap<FeatureId, f64>> {
        let attribute = &self.config.election_attribute;
        if !dataset.is_empty()
            && dataset
                .features()
                .iter()
                .all(|f| f.attribute(attribute).is_none())
        {
            return Err(GeneralizeError::InvalidParameter(format!(
                "Election attribute '{attribute}' does not exist in dataset '{}'",
                dataset.name
            )));
        }

        let values: HashMap<FeatureId, f64> = dataset
            .features()
            .iter()
            .filter_map(|f| f.numeric_attribute(attribute).map(|v| (f.id, v)))
            .collect();
        let nulls = dataset.len() - values.len();
        if nulls > 0 {
            tracing::warn!(
                "{} features have no numeric '{}' value and can only be shown by the terminal sweep",
                nulls,
                attribute
            );
        }
        Ok(values)
    }
}
