//! Non-uniform rational B-spline evaluation.

pub mod knot;

use std::any::Any;

use rayon::prelude::*;
use spline_attributes::sampler::mix_weighted;
use spline_attributes::{GArray, GSpan, WeightWindow};
use spline_core::{Result, SplineError};
use spline_math::{Point3, Vector3};
use tracing::{debug, trace};

pub use knot::{basis_functions, calculate_knots, find_span, knots_size, KnotsMode};

use crate::cache::EvalCache;
use crate::spline::{Spline, SplineCommon, SplinePtr, SplineType};

/// The control points influencing one evaluated point and their rational
/// weights (basis value times control weight). Blending is normalized by the
/// sum of the weights.
pub type BasisCache = WeightWindow;

pub const DEFAULT_ORDER: usize = 4;
pub const DEFAULT_RESOLUTION: usize = 12;

#[derive(Debug, Clone)]
pub struct NurbsSpline {
    common: SplineCommon,
    positions: Vec<Point3>,
    radii: Vec<f64>,
    tilts: Vec<f64>,
    weights: Vec<f64>,
    order: usize,
    resolution: usize,
    knots_mode: KnotsMode,
    knots: EvalCache<Vec<f64>>,
    basis_cache: EvalCache<Vec<BasisCache>>,
    evaluated_positions: EvalCache<Vec<Point3>>,
}

impl Default for NurbsSpline {
    fn default() -> Self {
        Self {
            common: SplineCommon::default(),
            positions: Vec::new(),
            radii: Vec::new(),
            tilts: Vec::new(),
            weights: Vec::new(),
            order: DEFAULT_ORDER,
            resolution: DEFAULT_RESOLUTION,
            knots_mode: KnotsMode::default(),
            knots: EvalCache::new(),
            basis_cache: EvalCache::new(),
            evaluated_positions: EvalCache::new(),
        }
    }
}

impl NurbsSpline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, position: Point3, radius: f64, tilt: f64, weight: f64) {
        self.positions.push(position);
        self.radii.push(radius);
        self.tilts.push(tilt);
        self.weights.push(weight);
        let size = self.positions.len();
        self.common.attributes.reallocate(size);
        self.mark_cache_invalid();
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn set_order(&mut self, order: usize) -> Result<()> {
        if order < 2 {
            return Err(SplineError::InvalidArgument(format!(
                "NURBS order must be at least 2, got {order}"
            )));
        }
        self.order = order;
        self.mark_cache_invalid();
        Ok(())
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn set_resolution(&mut self, resolution: usize) -> Result<()> {
        if resolution == 0 {
            return Err(SplineError::InvalidArgument(
                "resolution must be at least 1".into(),
            ));
        }
        self.resolution = resolution;
        self.mark_cache_invalid();
        Ok(())
    }

    pub fn knots_mode(&self) -> KnotsMode {
        self.knots_mode
    }

    pub fn set_knots_mode(&mut self, mode: KnotsMode) {
        self.knots_mode = mode;
        self.mark_cache_invalid();
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut [f64] {
        self.mark_cache_invalid();
        &mut self.weights
    }

    /// A spline needs at least `order` points to define a single span.
    pub fn check_valid_size_and_order(&self) -> bool {
        self.size() >= self.order
    }

    pub fn knots_size(&self) -> usize {
        knots_size(self.size(), self.order, self.is_cyclic())
    }

    pub fn knots(&self) -> &[f64] {
        self.knots.get_or_compute(|| {
            calculate_knots(self.size(), self.order, self.knots_mode, self.is_cyclic())
        })
    }

    /// Basis weights for every evaluated point.
    pub fn basis_cache(&self) -> &[BasisCache] {
        self.basis_cache
            .get_or_compute(|| self.calculate_basis_cache())
    }

    fn calculate_basis_cache(&self) -> Vec<BasisCache> {
        let eval_size = self.evaluated_points_size();
        if eval_size == 0 {
            debug!(
                size = self.size(),
                order = self.order,
                "NURBS spline has fewer points than its order, evaluating to nothing"
            );
            return Vec::new();
        }
        trace!(size = self.size(), eval_size, "calculating NURBS basis cache");

        let size = self.size();
        let degree = self.order - 1;
        let cyclic = self.is_cyclic();
        let knots = self.knots();
        let wrapped_size = size + if cyclic { degree } else { 0 };

        let start = knots[degree];
        let end = knots[wrapped_size];
        let divisions = if cyclic { eval_size } else { eval_size - 1 };
        let step = (end - start) / divisions as f64;
        let weights = &self.weights;

        (0..eval_size)
            .into_par_iter()
            .map(|i| {
                let parameter = (start + step * i as f64).min(end);
                let span = find_span(degree, knots, wrapped_size - 1, parameter);
                let start_index = span - degree;
                let basis = basis_functions(degree, knots, span, parameter);
                BasisCache {
                    start_index,
                    weights: basis
                        .iter()
                        .enumerate()
                        .map(|(j, b)| b * weights[(start_index + j) % size])
                        .collect(),
                }
            })
            .collect()
    }
}

impl Spline for NurbsSpline {
    fn spline_type(&self) -> SplineType {
        SplineType::Nurbs
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
        self.weights.resize(size, 1.0);
        self.common.attributes.reallocate(size);
        self.mark_cache_invalid();
    }

    fn positions(&self) -> &[Point3] {
        &self.positions
    }

    fn positions_mut(&mut self) -> &mut [Point3] {
        self.evaluated_positions.invalidate();
        self.common.invalidate();
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
        self.knots.invalidate();
        self.basis_cache.invalidate();
        self.evaluated_positions.invalidate();
        self.common.invalidate();
    }

    fn evaluated_points_size(&self) -> usize {
        if !self.check_valid_size_and_order() {
            return 0;
        }
        let points = self.segments_size() * self.resolution;
        if self.is_cyclic() {
            points
        } else {
            points + 1
        }
    }

    fn evaluated_positions(&self) -> &[Point3] {
        self.evaluated_positions
            .get_or_compute(|| mix_weighted(&self.positions, self.basis_cache()))
    }

    fn interpolate_to_evaluated(&self, src: GSpan<'_>) -> GArray {
        debug_assert_eq!(src.len(), self.size());
        src.mix_weighted(self.basis_cache())
    }

    fn correct_end_tangents(&self, _tangents: &mut [Vector3]) {}

    fn copy(&self) -> SplinePtr {
        Box::new(self.clone())
    }

    fn copy_only_settings(&self) -> SplinePtr {
        Box::new(Self {
            common: self.common.copy_settings(),
            order: self.order,
            resolution: self.resolution,
            knots_mode: self.knots_mode,
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
