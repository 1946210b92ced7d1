//! Antimeridian handling.
//!
//! Geometry within `buffer` of the world edges is copied into the neighbouring
//! world so that tiles on either side of x = 0 / x = 1 render the full feature.
//! The result only holds geometry inside `[-buffer, 1 + buffer]`.
//!
//! Output features are marked as wrapped and pass through a second `wrap`
//! unchanged, so the only copies ever produced are the -1, 0 and +1 shifts.

use std::sync::Arc;

use crate::clip::{clip, Axis};
use crate::feature::VtFeature;

/// Fold the left (x < 0) and right (x > 1) world copies into the centre world.
///
/// # Arguments
///
/// * `features` - Projected features
/// * `buffer` - Tile buffer as a fraction of the tile extent
/// * `line_metrics` - Passed through to the clipper
pub fn wrap(
    features: Vec<Arc<VtFeature>>,
    buffer: f64,
    line_metrics: bool,
) -> Vec<Arc<VtFeature>> {
    let (done, pending): (Vec<_>, Vec<_>) = features.into_iter().partition(|f| f.wrapped);
    if pending.is_empty() {
        return done;
    }

    let left = clip(&pending, 1.0, -1.0 - buffer, buffer, Axis::X, -1.0, 2.0, line_metrics);
    let right = clip(&pending, 1.0, 1.0 - buffer, 2.0 + buffer, Axis::X, -1.0, 2.0, line_metrics);

    if left.is_none() && right.is_none() {
        return pending.into_iter().chain(done).collect();
    }

    let center = clip(&pending, 1.0, -buffer, 1.0 + buffer, Axis::X, -1.0, 2.0, line_metrics)
        .unwrap_or_default();

    let mut merged = Vec::with_capacity(center.len() + done.len());
    if let Some(left) = left {
        merged.extend(shift_features(&left, 1.0));
    }
    merged.extend(center.into_iter().map(mark_wrapped));
    if let Some(right) = right {
        merged.extend(shift_features(&right, -1.0));
    }

    merged.extend(done);
    merged
}

fn shift_features(
    features: &[Arc<VtFeature>],
    offset: f64,
) -> impl Iterator<Item = Arc<VtFeature>> + '_ {
    features.iter().map(move |feature| {
        let mut shifted = VtFeature::new(
            feature.id.clone(),
            feature.geometry.shifted(offset),
            feature.properties.clone(),
        );
        shifted.wrapped = true;
        Arc::new(shifted)
    })
}

fn mark_wrapped(feature: Arc<VtFeature>) -> Arc<VtFeature> {
    if feature.wrapped {
        return feature;
    }
    let mut feature = Arc::unwrap_or_clone(feature);
    feature.wrapped = true;
    Arc::new(feature)
}
