//! The spline abstraction shared by every evaluator.
//!
//! A concrete spline type only has to provide two things: its evaluated
//! positions and a way to interpolate control point data to the evaluated
//! points. Tangents, normals, accumulated lengths, lookups, and uniform
//! sampling are built on top of those in the provided methods of [`Spline`].

use std::any::Any;
use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};
use spline_attributes::{AttributeElement, AttributeStorage, GArray, GSpan, LinearSample};
use spline_core::{Result, SplineError, Tolerance};
use spline_math::{
    angle_signed_on_axis, direction_bisect, rotate_direction_around_axis, z_up_normal, Aabb3,
    DMat4, DVec3, Point3, Vector3,
};
use tracing::trace;

use crate::cache::EvalCache;

pub type SplinePtr = Box<dyn Spline>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplineType {
    Bezier,
    Nurbs,
    Poly,
}

/// How the normal at each evaluated point is derived from its tangent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormalCalculationMode {
    /// Perpendicular to the tangent and to the world Z axis.
    ZUp,
    /// Propagated along the curve with the smallest possible twist.
    #[default]
    Minimum,
    /// The tangent itself, for flat ribbon display.
    Tangent,
}

/// A location between two adjacent evaluated points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    /// The index of the evaluated point before the location, i.e. the edge it
    /// lies on. At the very end of a non-cyclic spline this is the second to
    /// last index.
    pub evaluated_index: usize,
    /// The evaluated point after the location, wrapping to 0 on cyclic splines.
    pub next_evaluated_index: usize,
    /// Portion of the way from `evaluated_index` to `next_evaluated_index`.
    pub factor: f64,
}

impl LookupResult {
    /// Split a fractional index into the two surrounding indices of a domain of
    /// `size` elements.
    pub fn from_index_factor(index_factor: f64, size: usize, cyclic: bool) -> Self {
        if size < 2 {
            return Self::default();
        }
        let index_factor = index_factor.max(0.0);
        if cyclic {
            if index_factor < size as f64 {
                let index = index_factor.floor() as usize;
                let next_index = if index < size - 1 { index + 1 } else { 0 };
                return Self::new(index, next_index, index_factor - index as f64);
            }
            return Self::new(size - 1, 0, 1.0);
        }
        if index_factor < (size - 1) as f64 {
            let index = index_factor.floor() as usize;
            return Self::new(index, index + 1, index_factor - index as f64);
        }
        Self::new(size - 2, size - 1, 1.0)
    }

    pub fn new(evaluated_index: usize, next_evaluated_index: usize, factor: f64) -> Self {
        Self {
            evaluated_index,
            next_evaluated_index,
            factor,
        }
    }
}

impl From<LookupResult> for LinearSample {
    fn from(lookup: LookupResult) -> Self {
        LinearSample {
            index: lookup.evaluated_index,
            next_index: lookup.next_evaluated_index,
            factor: lookup.factor,
        }
    }
}

/// State shared by every spline type: settings, point-domain attributes, and
/// the caches derived from evaluated positions.
#[derive(Debug, Clone, Default)]
pub struct SplineCommon {
    pub(crate) cyclic: bool,
    pub(crate) normal_mode: NormalCalculationMode,
    pub(crate) tolerance: Tolerance,
    pub(crate) attributes: AttributeStorage,
    pub(crate) tangents: EvalCache<Vec<Vector3>>,
    pub(crate) normals: EvalCache<Vec<Vector3>>,
    pub(crate) lengths: EvalCache<Vec<f64>>,
}

impl SplineCommon {
    pub(crate) fn invalidate(&mut self) {
        self.tangents.invalidate();
        self.normals.invalidate();
        self.lengths.invalidate();
    }

    /// Settings only; attributes are left empty.
    pub(crate) fn copy_settings(&self) -> Self {
        Self {
            cyclic: self.cyclic,
            normal_mode: self.normal_mode,
            tolerance: self.tolerance,
            ..Self::default()
        }
    }
}

/// A single branch-less curve made of control points and its evaluated data.
///
/// Mutating methods take `&mut self`, so the borrow checker guarantees that no
/// reader observes control points changing underneath an evaluation. Mutable
/// accessors to control data invalidate the caches that depend on it.
pub trait Spline: Send + Sync + fmt::Debug {
    fn spline_type(&self) -> SplineType;
    fn common(&self) -> &SplineCommon;
    fn common_mut(&mut self) -> &mut SplineCommon;

    /// Return the number of control points.
    fn size(&self) -> usize;
    /// Grow or shrink every per-point array, including attributes.
    fn resize(&mut self, size: usize);

    fn positions(&self) -> &[Point3];
    fn positions_mut(&mut self) -> &mut [Point3];
    fn radii(&self) -> &[f64];
    fn radii_mut(&mut self) -> &mut [f64];
    fn tilts(&self) -> &[f64];
    fn tilts_mut(&mut self) -> &mut [f64];

    /// Mark every cache for recomputation, including type specific ones.
    fn mark_cache_invalid(&mut self);
    fn evaluated_points_size(&self) -> usize;
    fn evaluated_positions(&self) -> &[Point3];

    /// Interpolate data with one element per control point to the evaluated
    /// points. `src.len()` must equal [`Spline::size`].
    fn interpolate_to_evaluated(&self, src: GSpan<'_>) -> GArray;

    /// Adjust the first and last tangent of a non-cyclic spline after the
    /// generic calculation.
    fn correct_end_tangents(&self, tangents: &mut [Vector3]);

    fn copy(&self) -> SplinePtr;
    /// A spline of the same type and settings with no control points.
    fn copy_only_settings(&self) -> SplinePtr;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn copy_without_attributes(&self) -> SplinePtr {
        let mut copy = self.copy();
        copy.common_mut().attributes = AttributeStorage::new(self.size());
        copy
    }

    fn translate(&mut self, translation: Vector3) {
        for position in self.positions_mut() {
            *position += translation;
        }
    }

    fn transform(&mut self, matrix: &DMat4) {
        for position in self.positions_mut() {
            *position = matrix.transform_point3(*position);
        }
    }

    fn set_position(&mut self, index: usize, position: Point3) -> Result<()> {
        SplineError::check_index(index, self.size())?;
        self.positions_mut()[index] = position;
        Ok(())
    }

    fn is_cyclic(&self) -> bool {
        self.common().cyclic
    }

    fn set_cyclic(&mut self, value: bool) {
        self.common_mut().cyclic = value;
        self.mark_cache_invalid();
    }

    fn normal_mode(&self) -> NormalCalculationMode {
        self.common().normal_mode
    }

    fn set_normal_mode(&mut self, mode: NormalCalculationMode) {
        let common = self.common_mut();
        common.normal_mode = mode;
        common.normals.invalidate();
    }

    fn tolerance(&self) -> Tolerance {
        self.common().tolerance
    }

    fn set_tolerance(&mut self, tolerance: Tolerance) {
        let common = self.common_mut();
        common.tolerance = tolerance;
        common.normals.invalidate();
    }

    fn attributes(&self) -> &AttributeStorage {
        &self.common().attributes
    }

    fn attributes_mut(&mut self) -> &mut AttributeStorage {
        &mut self.common_mut().attributes
    }

    /// Number of curve segments between control points.
    fn segments_size(&self) -> usize {
        let size = self.size();
        if self.is_cyclic() {
            size
        } else {
            size.saturating_sub(1)
        }
    }

    /// Number of edges between evaluated points, including the closing edge of
    /// a cyclic spline.
    fn evaluated_edges_size(&self) -> usize {
        let eval_size = self.evaluated_points_size();
        if eval_size < 2 {
            0
        } else if self.is_cyclic() {
            eval_size
        } else {
            eval_size - 1
        }
    }

    /// Total arc length of the evaluated points.
    fn length(&self) -> f64 {
        self.evaluated_lengths().last().copied().unwrap_or(0.0)
    }

    /// Accumulated length at the end of every evaluated edge. The first value
    /// is the length of the first edge rather than 0.
    fn evaluated_lengths(&self) -> &[f64] {
        self.common().lengths.get_or_compute(|| {
            trace!(spline = ?self.spline_type(), "accumulating evaluated lengths");
            accumulate_lengths(self.evaluated_positions(), self.is_cyclic())
        })
    }

    /// Direction of the spline at each evaluated point.
    fn evaluated_tangents(&self) -> &[Vector3] {
        self.common().tangents.get_or_compute(|| {
            trace!(spline = ?self.spline_type(), "calculating evaluated tangents");
            let mut tangents = calculate_tangents(self.evaluated_positions(), self.is_cyclic());
            if !self.is_cyclic() && !tangents.is_empty() {
                self.correct_end_tangents(&mut tangents);
            }
            tangents
        })
    }

    /// Normal direction at each evaluated point, rotated by the interpolated tilt.
    fn evaluated_normals(&self) -> &[Vector3] {
        self.common().normals.get_or_compute(|| {
            trace!(
                spline = ?self.spline_type(),
                mode = ?self.normal_mode(),
                "calculating evaluated normals"
            );
            let tangents = self.evaluated_tangents();
            let tolerance = self.tolerance();
            let mut normals = match self.normal_mode() {
                NormalCalculationMode::ZUp => tangents
                    .iter()
                    .map(|&tangent| z_up_normal(tangent, tolerance))
                    .collect(),
                NormalCalculationMode::Minimum => {
                    calculate_normals_minimum(tangents, self.is_cyclic(), tolerance)
                }
                NormalCalculationMode::Tangent => tangents.to_vec(),
            };

            let tilts = self.interpolate_to_evaluated(GSpan::Float(self.tilts()));
            if let Some(tilts) = tilts.typed::<f64>() {
                for ((normal, &tangent), &tilt) in normals.iter_mut().zip(tangents).zip(tilts) {
                    if tilt != 0.0 {
                        *normal = rotate_direction_around_axis(*normal, tangent, tilt);
                    }
                }
            }
            normals
        })
    }

    fn bounds_min_max(&self, use_evaluated: bool) -> Option<Aabb3> {
        if use_evaluated {
            Aabb3::from_points(self.evaluated_positions())
        } else {
            Aabb3::from_points(self.positions())
        }
    }

    /// Find the evaluated edge at `factor` (0 to 1) of the total length.
    fn lookup_evaluated_factor(&self, factor: f64) -> LookupResult {
        self.lookup_evaluated_length(self.length() * factor)
    }

    /// Find the evaluated edge at `length` along the spline, clamped to the
    /// spline's length. Empty splines return the default result.
    fn lookup_evaluated_length(&self, length: f64) -> LookupResult {
        let lengths = self.evaluated_lengths();
        let Some(&total) = lengths.last() else {
            return LookupResult::default();
        };
        let length = length.clamp(0.0, total);

        let index = lengths.partition_point(|&l| l < length).min(lengths.len() - 1);
        let next_index = if index == self.evaluated_points_size() - 1 {
            0
        } else {
            index + 1
        };

        let previous_length = if index == 0 { 0.0 } else { lengths[index - 1] };
        let edge_length = lengths[index] - previous_length;
        let factor = if self.tolerance().is_zero(edge_length) {
            0.0
        } else {
            ((length - previous_length) / edge_length).clamp(0.0, 1.0)
        };
        LookupResult::new(index, next_index, factor)
    }

    /// Index factors in the evaluated point domain for `samples_size` points
    /// spaced evenly by length. Cyclic splines leave the last step before the
    /// start point open.
    fn sample_uniform_index_factors(&self, samples_size: usize) -> Result<Vec<f64>> {
        if samples_size == 0 {
            return Err(SplineError::InvalidArgument(
                "uniform sampling needs at least one sample".into(),
            ));
        }
        let lengths = self.evaluated_lengths();
        let mut samples = vec![0.0; samples_size];
        if samples_size == 1 || lengths.is_empty() {
            return Ok(samples);
        }

        let cyclic = self.is_cyclic();
        let total_length = self.length();
        let divisions = if cyclic { samples_size } else { samples_size - 1 };
        let sample_length = total_length / divisions as f64;

        // The lengths array has no leading zero, so track the previous length.
        let mut prev_length = 0.0;
        let mut i_sample = 1;
        for (i_evaluated, &length) in lengths.iter().enumerate() {
            while i_sample < samples_size && sample_length * (i_sample as f64) < length {
                let factor =
                    (sample_length * i_sample as f64 - prev_length) / (length - prev_length);
                samples[i_sample] = i_evaluated as f64 + factor;
                i_sample += 1;
            }
            prev_length = length;
        }

        // Float error or zero length edges can leave trailing samples unset.
        let end = lengths.len() as f64;
        for sample in &mut samples[i_sample..] {
            *sample = end;
        }
        if !cyclic {
            samples[samples_size - 1] = end;
        }
        Ok(samples)
    }

    fn lookup_data_from_index_factor(&self, index_factor: f64) -> LookupResult {
        LookupResult::from_index_factor(
            index_factor,
            self.evaluated_points_size(),
            self.is_cyclic(),
        )
    }

    /// Blend evaluated point data at fractional evaluated indices, e.g. the
    /// output of [`Spline::sample_uniform_index_factors`].
    fn sample_with_index_factors(
        &self,
        src: GSpan<'_>,
        index_factors: &[f64],
    ) -> Result<GArray> {
        let eval_size = self.evaluated_points_size();
        if src.len() != eval_size {
            return Err(SplineError::InvalidArgument(format!(
                "sampled data has {} elements, expected {eval_size} evaluated points",
                src.len()
            )));
        }
        if eval_size == 0 {
            if index_factors.is_empty() {
                return Ok(src.to_owned_array());
            }
            return Err(SplineError::OutOfRange { index: 0, size: 0 });
        }
        let samples: Vec<LinearSample> = index_factors
            .iter()
            .map(|&index_factor| self.lookup_data_from_index_factor(index_factor).into())
            .collect();
        Ok(src.mix_linear(&samples))
    }
}

/// Typed conveniences over the type-erased [`Spline`] methods.
pub trait SplineExt: Spline {
    fn interpolate_to_evaluated_typed<T: AttributeElement>(&self, src: &[T]) -> Vec<T> {
        self.interpolate_to_evaluated(T::span(src))
            .into_typed()
            .unwrap_or_default()
    }

    fn sample_with_index_factors_typed<T: AttributeElement>(
        &self,
        src: &[T],
        index_factors: &[f64],
    ) -> Result<Vec<T>> {
        let sampled = self.sample_with_index_factors(T::span(src), index_factors)?;
        Ok(sampled.into_typed().unwrap_or_default())
    }

    /// Downcast to a concrete spline type.
    fn downcast_ref<S: Spline + 'static>(&self) -> Option<&S> {
        self.as_any().downcast_ref()
    }

    fn downcast_mut<S: Spline + 'static>(&mut self) -> Option<&mut S> {
        self.as_any_mut().downcast_mut()
    }
}

impl<S: Spline + ?Sized> SplineExt for S {}

pub(crate) fn accumulate_lengths(positions: &[Point3], cyclic: bool) -> Vec<f64> {
    let mut lengths = Vec::with_capacity(positions.len());
    let mut length = 0.0;
    for pair in positions.windows(2) {
        length += pair[0].distance(pair[1]);
        lengths.push(length);
    }
    if let (true, [first, .., last]) = (cyclic, positions) {
        lengths.push(length + last.distance(*first));
    }
    lengths
}

pub(crate) fn calculate_tangents(positions: &[Point3], cyclic: bool) -> Vec<Vector3> {
    match positions {
        [] => Vec::new(),
        [_] => vec![DVec3::Z],
        [first, second, ..] => {
            let last = &positions[positions.len() - 1];
            let second_to_last = positions[positions.len() - 2];
            let mut tangents = Vec::with_capacity(positions.len());
            if cyclic {
                tangents.push(direction_bisect(*last, *first, *second));
            } else {
                tangents.push((*second - *first).normalize_or_zero());
            }
            tangents.extend(
                positions
                    .windows(3)
                    .map(|w| direction_bisect(w[0], w[1], w[2])),
            );
            if cyclic {
                tangents.push(direction_bisect(second_to_last, *last, *first));
            } else {
                tangents.push((*last - second_to_last).normalize_or_zero());
            }
            tangents
        }
    }
}

/// Rotate the last normal in the same way the tangent has been rotated.
fn calculate_next_normal(
    last_normal: Vector3,
    last_tangent: Vector3,
    current_tangent: Vector3,
) -> Vector3 {
    if last_tangent == DVec3::ZERO || current_tangent == DVec3::ZERO {
        return last_normal;
    }
    let angle = last_tangent.angle_between(current_tangent);
    if angle == 0.0 {
        return last_normal;
    }
    let axis = last_tangent.cross(current_tangent).normalize_or_zero();
    if axis == DVec3::ZERO {
        return last_normal;
    }
    rotate_direction_around_axis(last_normal, axis, angle)
}

/// Minimal twist normals. On cyclic splines the frame propagated around the
/// whole loop generally does not return to the first normal; the mismatch is
/// spread evenly over all points so the seam is continuous.
pub(crate) fn calculate_normals_minimum(
    tangents: &[Vector3],
    cyclic: bool,
    tolerance: Tolerance,
) -> Vec<Vector3> {
    let Some(&first_tangent) = tangents.first() else {
        return Vec::new();
    };
    let mut normals = Vec::with_capacity(tangents.len());
    normals.push(z_up_normal(first_tangent, tolerance));
    for pair in tangents.windows(2) {
        let last_normal = normals[normals.len() - 1];
        normals.push(calculate_next_normal(last_normal, pair[0], pair[1]));
    }

    if !cyclic {
        return normals;
    }

    let last_normal = normals[normals.len() - 1];
    let last_tangent = tangents[tangents.len() - 1];
    let uncorrected_first = calculate_next_normal(last_normal, last_tangent, first_tangent);
    let mut correction = angle_signed_on_axis(uncorrected_first, normals[0], first_tangent);
    if correction > PI {
        correction -= 2.0 * PI;
    }

    let angle_step = correction / normals.len() as f64;
    for (i, (normal, &tangent)) in normals.iter_mut().zip(tangents).enumerate() {
        *normal = rotate_direction_around_axis(*normal, tangent, angle_step * i as f64);
    }
    normals
}
