//! Grid visualization batch pipeline
//!
//! An alternative to clustering: at level `L` a square grid of points with side
//! `square_length / 2^L` is laid over the extent, and every grid point picks the nearest
//! feature within half a side. A feature becomes visible from the first level at which
//! some grid point picked it; features never picked keep a null offset.

use crate::{CancellationToken, Dataset, GeneralizeError, PointIndex, Result, VisibilityOffsets};
use geo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Attribute the grid pipeline writes unless configured otherwise
pub const GRID_OFFSET_ATTRIBUTE: &str = "_grid_zoom_offset";

/// Upper bound on grid points per level to keep a misconfigured run from exhausting memory
const MAX_GRID_POINTS_PER_LEVEL: u64 = 50_000_000;

/// Configuration for [`GridVisualization`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    /// Grid side at level 0, in dataset units
    pub square_length: f64,
    /// Number of levels (>= 1)
    pub zoom_levels: u32,
    /// Area to cover; defaults to the dataset's bounding box
    pub extent: Option<Rect<f64>>,
    pub output_attribute: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            square_length: 1000.0,
            zoom_levels: 5,
            extent: None,
            output_attribute: GRID_OFFSET_ATTRIBUTE.to_string(),
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.square_length.is_finite() && self.square_length > 0.0) {
            return Err(GeneralizeError::InvalidParameter(format!(
                "Grid square length must be positive, got {}",
                self.square_length
            )));
        }
        if self.zoom_levels == 0 {
            return Err(GeneralizeError::InvalidParameter(
                "Number of zoom levels must be at least 1".to_string(),
            ));
        }
        if self.output_attribute.is_empty() {
            return Err(GeneralizeError::InvalidParameter(
                "The output attribute name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn level_side(&self, level: u32) -> f64 {
        self.square_length / 2f64.powi(level as i32)
    }
}

/// The multi-level grid sampling batch job
#[derive(Clone, Debug)]
pub struct GridVisualization {
    config: GridConfig,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl GridVisualization {
    pub fn new(config: GridConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Compute grid offsets for `dataset`; unpicked features are absent from the result
    pub fn run(&self, dataset: &Dataset, cancel: &CancellationToken) -> Result<VisibilityOffsets> {
        let mut offsets = VisibilityOffsets::new();
        let Some(extent) = self.config.extent.or_else(|| dataset.bounding_box()) else {
            return Ok(offsets);
        };

        let features = dataset.features();
        let geometries: Vec<Point<f64>> = features.iter().map(|f| f.geometry).collect();
        let index = PointIndex::new(&geometries);

        for level in 0..self.config.zoom_levels {
            cancel.check()?;
            let side = self.config.level_side(level);
            let (columns, rows) = grid_dimensions(extent, side, level)?;

            let mut picked = 0usize;
            for row in 0..rows {
                // Rows are independent; keep cancellation responsive on large grids
                if row % 1024 == 0 {
                    cancel.check()?;
                }
                let y = extent.min().y + row as f64 * side;
                for column in 0..columns {
                    let x = extent.min().x + column as f64 * side;
                    if let Some(nearest) = index.nearest_within(Point::new(x, y), side / 2.0) {
                        if offsets.assign(features[nearest].id, level) {
                            picked += 1;
                        }
                    }
                }
            }

            tracing::info!(
                "Grid level {}: side {:.3}, {}x{} points, {} new features",
                level,
                side,
                columns,
                rows,
                picked
            );
        }

        Ok(offsets)
    }

    /// Run the grid pipeline and write the offsets into `dataset`
    pub fn apply(&self, dataset: &mut Dataset, cancel: &CancellationToken) -> Result<VisibilityOffsets> {
        let offsets = self.run(dataset, cancel)?;
        dataset.update_attribute(&self.config.output_attribute, &offsets.to_attribute_map());
        Ok(offsets)
    }
}

/// Grid points per axis covering `extent` with spacing `side`
fn grid_dimensions(extent: Rect<f64>, side: f64, level: u32) -> Result<(u64, u64)> {
    let columns = (extent.width() / side).floor() as u64 + 1;
    let rows = (extent.height() / side).floor() as u64 + 1;
    if columns.saturating_mul(rows) > MAX_GRID_POINTS_PER_LEVEL {
        return Err(GeneralizeError::InvalidParameter(format!(
            "Grid at level {level} would have {columns}x{rows} points; increase the square length or reduce the levels"
        )));
    }
    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Feature;
    use geo::Coord;

    fn create_dataset() -> Dataset {
        Dataset::from_features(
            "poi",
            vec![
                Feature::new(1, Point::new(0.0, 0.0)),
                Feature::new(2, Point::new(1.0, 0.0)),
                Feature::new(3, Point::new(5.0, 0.0)),
                Feature::new(4, Point::new(8.0, 0.2)),
                Feature::new(5, Point::new(6.6, 0.0)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_config_validation() {
        assert!(GridConfig::default().validate().is_ok());
        assert!(GridConfig { square_length: 0.0, ..Default::default() }.validate().is_err());
        assert!(GridConfig { zoom_levels: 0, ..Default::default() }.validate().is_err());
    }

    #[test]
    fn test_offsets_take_minimum_level() {
        let dataset = create_dataset();
        let config = GridConfig {
            square_length: 8.0,
            zoom_levels: 3,
            ..Default::default()
        };
        let offsets = GridVisualization::new(config)
            .unwrap()
            .run(&dataset, &CancellationToken::new())
            .unwrap();

        // Level 0 (side 8): grid x = 0, 8
        assert_eq!(offsets.get(1), Some(0));
        assert_eq!(offsets.get(4), Some(0));
        // Level 1 (side 4): grid x = 0, 4, 8 → 4 picks 3 (distance 1 <= 2)
        assert_eq!(offsets.get(3), Some(1));
        // Level 2 (side 2): grid x = 0, 2, 4, 6, 8 → 2 picks 2, 6 picks 5
        assert_eq!(offsets.get(2), Some(2));
        assert_eq!(offsets.get(5), Some(2));
    }

    #[test]
    fn test_unpicked_features_stay_null() {
        let dataset = create_dataset();
        let config = GridConfig {
            square_length: 8.0,
            zoom_levels: 1,
            ..Default::default()
        };
        let mut dataset_out = dataset.clone();
        GridVisualization::new(config)
            .unwrap()
            .apply(&mut dataset_out, &CancellationToken::new())
            .unwrap();

        let offset = |id| dataset_out.feature(id).unwrap().attribute(GRID_OFFSET_ATTRIBUTE).cloned();
        assert_eq!(offset(1), Some(0u32.into()));
        assert_eq!(offset(3), Some(crate::AttributeValue::Null));
    }

    #[test]
    fn test_explicit_extent_and_empty_dataset() {
        let config = GridConfig {
            square_length: 10.0,
            zoom_levels: 2,
            extent: Some(Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 10.0 })),
            ..Default::default()
        };
        let grid = GridVisualization::new(config).unwrap();
        assert!(grid.run(&Dataset::new("empty"), &CancellationToken::new()).unwrap().is_empty());

        let no_extent = GridVisualization::new(GridConfig::default()).unwrap();
        assert!(no_extent.run(&Dataset::new("empty"), &CancellationToken::new()).unwrap().is_empty());
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let extent = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1e9, y: 1e9 });
        assert!(grid_dimensions(extent, 1.0, 0).is_err());
        assert_eq!(grid_dimensions(extent, 1e9, 0).unwrap(), (2, 2));
    }

    #[test]
    fn test_cancelled_grid() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let grid = GridVisualization::new(GridConfig::default()).unwrap();
        assert!(matches!(grid.run(&create_dataset(), &cancel), Err(GeneralizeError::Cancelled)));
    }
}
