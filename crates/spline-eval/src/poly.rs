//! Splines whose evaluated points are the control points themselves.

use std::any::Any;

use spline_attributes::{GArray, GSpan};
use spline_math::{Point3, Vector3};

use crate::spline::{Spline, SplineCommon, SplinePtr, SplineType};

/// A polyline. A cyclic poly spline has as many evaluated points as control
/// points; the edge back to the first point is implied by the cyclic flag.
#[derive(Debug, Clone, Default)]
pub struct PolySpline {
    common: SplineCommon,
    positions: Vec<Point3>,
    radii: Vec<f64>,
    tilts: Vec<f64>,
}

impl PolySpline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, position: Point3, radius: f64, tilt: f64) {
        self.positions.push(position);
        self.radii.push(radius);
        self.tilts.push(tilt);
        let size = self.positions.len();
        self.common.attributes.reallocate(size);
        self.mark_cache_invalid();
    }
}

impl Spline for PolySpline {
    fn spline_type(&self) -> SplineType {
        SplineType::Poly
    }

    fn common(&self) -> &SplineCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut SplineCommon {
        &mut self.common
    }

    fn size(&self) -> usize {
        self.positions.len()
    }

    fn resize(&mut self, size: usize) {
        self.positions.resize(size, Point3::ZERO);
        self.radii.resize(size, 1.0);
        self.tilts.resize(size, 0.0);
        self.common.attributes.reallocate(size);
        self.mark_cache_invalid();
    }

    fn positions(&self) -> &[Point3] {
        &self.positions
    }

    fn positions_mut(&mut self) -> &mut [Point3] {
        self.mark_cache_invalid();
        &mut self.positions
    }

    fn radii(&self) -> &[f64] {
        &self.radii
    }

    fn radii_mut(&mut self) -> &mut [f64] {
        &mut self.radii
    }

    fn tilts(&self) -> &[f64] {
        &self.tilts
    }

    fn tilts_mut(&mut self) -> &mut [f64] {
        self.common.normals.invalidate();
        &mut self.tilts
    }

    fn mark_cache_invalid(&mut self) {
        self.common.invalidate();
    }

    fn evaluated_points_size(&self) -> usize {
        self.size()
    }

    fn evaluated_positions(&self) -> &[Point3] {
        &self.positions
    }

    fn interpolate_to_evaluated(&self, src: GSpan<'_>) -> GArray {
        debug_assert_eq!(src.len(), self.size());
        src.to_owned_array()
    }

    fn correct_end_tangents(&self, _tangents: &mut [Vector3]) {}

    fn copy(&self) -> SplinePtr {
        Box::new(self.clone())
    }

    fn copy_only_settings(&self) -> SplinePtr {
        Box::new(Self {
            common: self.common.copy_settings(),
            ..Self::default()
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
