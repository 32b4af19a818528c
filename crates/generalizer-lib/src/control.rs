//! Zoom-driven numeric controls
//!
//! Symbol and label sizes grow with the zoom level. These functions compute such a value
//! for the context's zoom, relative to the layer tag's `_zoom_min` (and `_zoom_max`).

use crate::utils::{bound_value, normalize_min_max};
use crate::{EvaluationContext, Feature, GeneralizeError, Result, ValueRef};

const ZOOM_MIN_PROPERTY: &str = "_zoom_min";
const ZOOM_MAX_PROPERTY: &str = "_zoom_max";

/// `clamp(min_value + (Z - zoom_min) × increment, min_value, max_value)`
pub fn control_by_increment(
    context: &mut EvaluationContext<'_>,
    feature: &Feature,
    increment: &ValueRef<f64>,
    min_value: &ValueRef<f64>,
    max_value: &ValueRef<f64>,
) -> Result<f64> {
    let zoom_min: f64 = context.resolve(&ValueRef::property(ZOOM_MIN_PROPERTY), feature)?;
    let increment = context.resolve(increment, feature)?;
    let min_value = context.resolve(min_value, feature)?;
    let max_value = context.resolve(max_value, feature)?;

    let value = min_value + (context.zoom() as f64 - zoom_min) * increment;
    Ok(bound_value(value, min_value, max_value))
}

/// `array[clamp(Z - zoom_min, 0, len - 1)]`
pub fn control_by_array(
    context: &mut EvaluationContext<'_>,
    feature: &Feature,
    array: &ValueRef<Vec<f64>>,
) -> Result<f64> {
    let zoom_min: f64 = context.resolve(&ValueRef::property(ZOOM_MIN_PROPERTY), feature)?;
    let array = context.resolve(array, feature)?;

    let Some(last) = array.len().checked_sub(1) else {
        return Err(GeneralizeError::InvalidParameter(
            "The control array cannot be empty".to_string(),
        ));
    };
    let index = bound_value((context.zoom() as f64 - zoom_min).floor(), 0.0, last as f64) as usize;
    Ok(array[index])
}

/// Interpolate `Z` from `[zoom_min, zoom_max]` onto `[min_value, max_value]`, clamped.
/// A degenerate zoom range yields `min_value`.
pub fn control_by_min_max_normalization(
    context: &mut EvaluationContext<'_>,
    feature: &Feature,
    min_value: &ValueRef<f64>,
    max_value: &ValueRef<f64>,
) -> Result<f64> {
    let zoom_min: f64 = context.resolve(&ValueRef::property(ZOOM_MIN_PROPERTY), feature)?;
    let zoom_max: f64 = context.resolve(&ValueRef::property(ZOOM_MAX_PROPERTY), feature)?;
    let min_value = context.resolve(min_value, feature)?;
    let max_value = context.resolve(max_value, feature)?;

    let value = normalize_min_max(context.zoom() as f64, zoom_min, zoom_max, min_value, max_value);
    Ok(bound_value(value, min_value, max_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigValue, ConfigurationStore, Dataset, Property, PropertyType};
    use geo::Point;

    fn create_test_store() -> ConfigurationStore {
        let mut store = ConfigurationStore::default();
        store.add_property(Property::new("_symbol_sizes", "Symbol size per zoom", PropertyType::Number, true));
        store.add_tag("poi");
        for (property, value) in [
            ("_zoom_min", 10.0),
            ("_zoom_max", 14.0),
            ("_symbol_size_min", 2.0),
            ("_symbol_size_max", 6.0),
            ("_symbol_size_increment", 1.5),
        ] {
            store.set_variable("poi", property, ConfigValue::Number(value)).unwrap();
        }
        store
            .set_variable("poi", "_symbol_sizes", ConfigValue::Text("1;2;4".to_string()))
            .unwrap();
        store
    }

    fn create_layer() -> Dataset {
        Dataset::from_features("poi", vec![Feature::new(1, Point::new(0.0, 0.0))]).unwrap()
    }

    #[test]
    fn test_control_by_increment() {
        let store = create_test_store();
        let layer = create_layer();
        let feature = &layer.features()[0];

        let size = |zoom| {
            let mut context = EvaluationContext::new(&layer, &store, zoom);
            control_by_increment(
                &mut context,
                feature,
                &"_symbol_size_increment".into(),
                &"_symbol_size_min".into(),
                &"_symbol_size_max".into(),
            )
            .unwrap()
        };
        assert_eq!(size(8), 2.0);
        assert_eq!(size(10), 2.0);
        assert_eq!(size(11), 3.5);
        assert_eq!(size(12), 5.0);
        assert_eq!(size(13), 6.0);
    }

    #[test]
    fn test_control_by_array() {
        let store = create_test_store();
        let layer = create_layer();
        let feature = &layer.features()[0];

        let size = |zoom| {
            let mut context = EvaluationContext::new(&layer, &store, zoom);
            control_by_array(&mut context, feature, &"_symbol_sizes".into()).unwrap()
        };
        assert_eq!(size(3), 1.0);
        assert_eq!(size(10), 1.0);
        assert_eq!(size(11), 2.0);
        assert_eq!(size(12), 4.0);
        assert_eq!(size(18), 4.0);

        let mut context = EvaluationContext::new(&layer, &store, 12);
        let result = control_by_array(&mut context, feature, &Vec::new().into());
        assert!(matches!(result, Err(GeneralizeError::InvalidParameter(_))));
    }

    #[test]
    fn test_control_by_min_max_normalization() {
        let store = create_test_store();
        let layer = create_layer();
        let feature = &layer.features()[0];

        let size = |zoom| {
            let mut context = EvaluationContext::new(&layer, &store, zoom);
            control_by_min_max_normalization(&mut context, feature, &2.0.into(), &10.0.into()).unwrap()
        };
        assert_eq!(size(9), 2.0);
        assert_eq!(size(10), 2.0);
        assert_eq!(size(12), 6.0);
        assert_eq!(size(14), 10.0);
        assert_eq!(size(16), 10.0);
    }

    #[test]
    fn test_degenerate_zoom_range_yields_minimum() {
        let mut store = create_test_store();
        store.set_variable("poi", "_zoom_max", ConfigValue::Number(10.0)).unwrap();
        let layer = create_layer();
        let feature = &layer.features()[0];
        let mut context = EvaluationContext::new(&layer, &store, 12);
        let size = control_by_min_max_normalization(&mut context, feature, &2.0.into(), &10.0.into()).unwrap();
        assert_eq!(size, 2.0);
    }

    #[test]
    fn test_feature_attribute_overrides_configuration() {
        let store = create_test_store();
        let layer = Dataset::from_features(
            "poi",
            vec![Feature::new(1, Point::new(0.0, 0.0)).with_attribute("_zoom_min", 12.0)],
        )
        .unwrap();
        let feature = &layer.features()[0];
        let mut context = EvaluationContext::new(&layer, &store, 12);
        let size = control_by_array(&mut context, feature, &vec![7.0, 8.0].into()).unwrap();
        assert_eq!(size, 7.0);
    }
}
