//! Cubic Bezier splines with per-point handles.

use std::any::Any;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use spline_attributes::{GArray, GSpan, LinearSample};
use spline_core::{Result, SplineError};
use spline_math::{DMat4, Point3, Vector3};
use tracing::trace;

use crate::cache::EvalCache;
use crate::spline::{LookupResult, Spline, SplineCommon, SplinePtr, SplineType};

pub const DEFAULT_RESOLUTION: usize = 12;

/// Scale between the averaged neighbour direction and an auto handle length.
const AUTO_HANDLE_FACTOR: f64 = 2.5614;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleType {
    /// Positioned freely by the user.
    #[default]
    Free,
    /// Derived from the neighbouring points for a smooth curve.
    Auto,
    /// Pointing at the neighbouring point, making a straight segment.
    Vector,
    /// Kept in line with the opposite handle.
    Align,
}

/// Handle positions with auto and vector handles resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlePositions {
    pub left: Vec<Point3>,
    pub right: Vec<Point3>,
}

/// The two control points around a control point index factor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InterpolationData {
    pub control_point_index: usize,
    pub next_control_point_index: usize,
    pub factor: f64,
}

/// The result of splitting a segment with De Casteljau's algorithm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsertResult {
    /// New right handle of the segment's start point.
    pub handle_prev: Point3,
    pub left_handle: Point3,
    pub position: Point3,
    pub right_handle: Point3,
    /// New left handle of the segment's end point.
    pub handle_next: Point3,
}

#[derive(Debug, Clone)]
pub struct BezierSpline {
    common: SplineCommon,
    positions: Vec<Point3>,
    radii: Vec<f64>,
    tilts: Vec<f64>,
    handle_types_left: Vec<HandleType>,
    handle_types_right: Vec<HandleType>,
    handle_positions_left: Vec<Point3>,
    handle_positions_right: Vec<Point3>,
    resolution: usize,
    handles: EvalCache<HandlePositions>,
    offsets: EvalCache<Vec<usize>>,
    evaluated_positions: EvalCache<Vec<Point3>>,
    mappings: EvalCache<Vec<f64>>,
}

impl Default for BezierSpline {
    fn default() -> Self {
        Self {
            common: SplineCommon::default(),
            positions: Vec::new(),
            radii: Vec::new(),
            tilts: Vec::new(),
            handle_types_left: Vec::new(),
            handle_types_right: Vec::new(),
            handle_positions_left: Vec::new(),
            handle_positions_right: Vec::new(),
            resolution: DEFAULT_RESOLUTION,
            handles: EvalCache::new(),
            offsets: EvalCache::new(),
            evaluated_positions: EvalCache::new(),
            mappings: EvalCache::new(),
        }
    }
}

impl BezierSpline {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_point(
        &mut self,
        position: Point3,
        handle_type_left: HandleType,
        handle_position_left: Point3,
        handle_type_right: HandleType,
        handle_position_right: Point3,
        radius: f64,
        tilt: f64,
    ) {
        self.positions.push(position);
        self.handle_types_left.push(handle_type_left);
        self.handle_positions_left.push(handle_position_left);
        self.handle_types_right.push(handle_type_right);
        self.handle_positions_right.push(handle_position_right);
        self.radii.push(radius);
        self.tilts.push(tilt);
        let size = self.positions.len();
        self.common.attributes.reallocate(size);
        self.mark_cache_invalid();
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

    pub fn handle_types_left(&self) -> &[HandleType] {
        &self.handle_types_left
    }

    pub fn handle_types_left_mut(&mut self) -> &mut [HandleType] {
        self.bake_handles();
        self.mark_cache_invalid();
        &mut self.handle_types_left
    }

    pub fn handle_types_right(&self) -> &[HandleType] {
        &self.handle_types_right
    }

    pub fn handle_types_right_mut(&mut self) -> &mut [HandleType] {
        self.bake_handles();
        self.mark_cache_invalid();
        &mut self.handle_types_right
    }

    /// Left handle positions, with auto and vector handles resolved.
    pub fn handle_positions_left(&self) -> &[Point3] {
        &self.ensure_auto_handles().left
    }

    /// Right handle positions, with auto and vector handles resolved.
    pub fn handle_positions_right(&self) -> &[Point3] {
        &self.ensure_auto_handles().right
    }

    pub fn handle_positions_left_mut(&mut self) -> &mut [Point3] {
        self.bake_handles();
        self.mark_cache_invalid();
        &mut self.handle_positions_left
    }

    pub fn handle_positions_right_mut(&mut self) -> &mut [Point3] {
        self.bake_handles();
        self.mark_cache_invalid();
        &mut self.handle_positions_right
    }

    /// Resolve auto and vector handles from the current positions.
    pub fn ensure_auto_handles(&self) -> &HandlePositions {
        self.handles.get_or_compute(|| self.calculate_auto_handles())
    }

    /// Write the resolved handles back into the stored handle arrays.
    fn bake_handles(&mut self) {
        let HandlePositions { left, right } = self.ensure_auto_handles().clone();
        self.handle_positions_left = left;
        self.handle_positions_right = right;
    }

    fn calculate_auto_handles(&self) -> HandlePositions {
        let mut left = self.handle_positions_left.clone();
        let mut right = self.handle_positions_right.clone();
        let size = self.size();
        if size <= 1 {
            return HandlePositions { left, right };
        }

        let positions = &self.positions;
        let cyclic = self.is_cyclic();
        for i in 0..size {
            let type_left = self.handle_types_left[i];
            let type_right = self.handle_types_right[i];
            let derived = |t: HandleType| matches!(t, HandleType::Auto | HandleType::Vector);
            if !derived(type_left) && !derived(type_right) {
                continue;
            }

            let position = positions[i];
            // Non-cyclic ends mirror the single neighbour to get a virtual one.
            let prev = match (i, cyclic) {
                (0, true) => positions[size - 1],
                (0, false) => position * 2.0 - positions[1],
                _ => positions[i - 1],
            };
            let next = match (i == size - 1, cyclic) {
                (true, true) => positions[0],
                (true, false) => position * 2.0 - positions[size - 2],
                _ => positions[i + 1],
            };

            if type_left == HandleType::Auto || type_right == HandleType::Auto {
                let prev_diff = position - prev;
                let next_diff = next - position;
                let mut prev_len = prev_diff.length();
                let mut next_len = next_diff.length();
                if prev_len == 0.0 {
                    prev_len = 1.0;
                }
                if next_len == 0.0 {
                    next_len = 1.0;
                }
                let dir = next_diff / next_len + prev_diff / prev_len;
                let len = dir.length() * AUTO_HANDLE_FACTOR;
                if len != 0.0 {
                    if type_left == HandleType::Auto {
                        let prev_len_clamped = prev_len.min(next_len * 5.0);
                        left[i] = position + dir * -(prev_len_clamped / len);
                    }
                    if type_right == HandleType::Auto {
                        let next_len_clamped = next_len.min(prev_len * 5.0);
                        right[i] = position + dir * (next_len_clamped / len);
                    }
                }
            }

            if type_left == HandleType::Vector {
                left[i] = position.lerp(prev, 1.0 / 3.0);
            }
            if type_right == HandleType::Vector {
                right[i] = position.lerp(next, 1.0 / 3.0);
            }
        }
        HandlePositions { left, right }
    }

    /// Whether the segment starting at `index` is a straight line between two
    /// vector handles. The last point of a non-cyclic spline only contributes
    /// itself, so it counts as a vector segment.
    pub fn segment_is_vector(&self, index: usize) -> Result<bool> {
        SplineError::check_index(index, self.size())?;
        Ok(self.is_vector_segment(index))
    }

    fn is_vector_segment(&self, index: usize) -> bool {
        let size = self.size();
        if index == size - 1 {
            if !self.is_cyclic() {
                return true;
            }
            return self.handle_types_right[index] == HandleType::Vector
                && self.handle_types_left[0] == HandleType::Vector;
        }
        self.handle_types_right[index] == HandleType::Vector
            && self.handle_types_left[index + 1] == HandleType::Vector
    }

    /// Whether the curve has a corner at the point instead of a smooth
    /// tangent.
    pub fn point_is_sharp(&self, index: usize) -> Result<bool> {
        SplineError::check_index(index, self.size())?;
        let sharp = |t: HandleType| matches!(t, HandleType::Vector | HandleType::Free);
        Ok(sharp(self.handle_types_left[index]) || sharp(self.handle_types_right[index]))
    }

    /// The first evaluated point of every segment, plus the total count.
    pub fn control_point_offsets(&self) -> &[usize] {
        self.offsets.get_or_compute(|| {
            let size = self.size();
            if size == 1 {
                return vec![0, 1];
            }
            let mut offsets = Vec::with_capacity(size + 1);
            let mut offset = 0;
            for i in 0..size {
                offsets.push(offset);
                offset += if self.is_vector_segment(i) {
                    1
                } else {
                    self.resolution
                };
            }
            offsets.push(offset);
            offsets
        })
    }

    /// Evaluate the segment from `index` to `next_index` into `positions`,
    /// including the start point but not the end point.
    pub fn evaluate_segment(
        &self,
        index: usize,
        next_index: usize,
        positions: &mut [Point3],
    ) -> Result<()> {
        SplineError::check_index(index, self.size())?;
        SplineError::check_index(next_index, self.size())?;
        let handles = self.ensure_auto_handles();
        evaluate_cubic(
            self.positions[index],
            handles.right[index],
            handles.left[next_index],
            self.positions[next_index],
            positions,
        );
        Ok(())
    }

    /// The control point index factor of every evaluated point.
    pub fn evaluated_mappings(&self) -> &[f64] {
        self.mappings.get_or_compute(|| {
            let offsets = self.control_point_offsets();
            let mut mappings = Vec::with_capacity(offsets.last().copied().unwrap_or(0));
            for (i, pair) in offsets.windows(2).enumerate() {
                let len = pair[1] - pair[0];
                mappings.extend((0..len).map(|j| i as f64 + j as f64 / len as f64));
            }
            mappings
        })
    }

    /// Convert a control point index factor, as found in
    /// [`Self::evaluated_mappings`], into the surrounding control points.
    pub fn interpolation_data_from_index_factor(&self, index_factor: f64) -> InterpolationData {
        let lookup = LookupResult::from_index_factor(index_factor, self.size(), self.is_cyclic());
        InterpolationData {
            control_point_index: lookup.evaluated_index,
            next_control_point_index: lookup.next_evaluated_index,
            factor: lookup.factor,
        }
    }

    /// Find the positions and handles of a new point inserted at `parameter`
    /// on the segment between `index` and `next_index`, without changing the
    /// spline.
    pub fn calculate_segment_insertion(
        &self,
        index: usize,
        next_index: usize,
        parameter: f64,
    ) -> Result<InsertResult> {
        let size = self.size();
        SplineError::check_index(index, size)?;
        SplineError::check_index(next_index, size)?;
        if next_index != index + 1 && next_index != 0 {
            return Err(SplineError::InvalidArgument(format!(
                "points {index} and {next_index} do not form a segment"
            )));
        }
        if !(0.0..=1.0).contains(&parameter) {
            return Err(SplineError::InvalidArgument(format!(
                "segment parameter {parameter} is outside 0..=1"
            )));
        }

        let handles = self.ensure_auto_handles();
        let start = self.positions[index];
        let handle_start = handles.right[index];
        let handle_end = handles.left[next_index];
        let end = self.positions[next_index];

        let center = handle_start.lerp(handle_end, parameter);
        let handle_prev = start.lerp(handle_start, parameter);
        let handle_next = handle_end.lerp(end, parameter);
        let left_handle = handle_prev.lerp(center, parameter);
        let right_handle = center.lerp(handle_next, parameter);
        let position = left_handle.lerp(right_handle, parameter);
        Ok(InsertResult {
            handle_prev,
            left_handle,
            position,
            right_handle,
            handle_next,
        })
    }

    fn calculate_evaluated_positions(&self) -> Vec<Point3> {
        let size = self.size();
        let offsets = self.control_point_offsets();
        let eval_size = offsets.last().copied().unwrap_or(0);
        trace!(size, eval_size, "evaluating Bezier segments");
        let mut evaluated = vec![Point3::ZERO; eval_size];
        if size == 1 {
            evaluated[0] = self.positions[0];
            return evaluated;
        }

        let handles = self.ensure_auto_handles();
        let mut segments = Vec::with_capacity(size);
        let mut rest = evaluated.as_mut_slice();
        for (i, pair) in offsets.windows(2).enumerate() {
            let (segment, tail) = std::mem::take(&mut rest).split_at_mut(pair[1] - pair[0]);
            segments.push((i, segment));
            rest = tail;
        }

        let positions = &self.positions;
        let cyclic = self.is_cyclic();
        segments.into_par_iter().for_each(|(i, segment)| {
            if i == size - 1 && !cyclic {
                segment[0] = positions[i];
                return;
            }
            let next = if i == size - 1 { 0 } else { i + 1 };
            evaluate_cubic(
                positions[i],
                handles.right[i],
                handles.left[next],
                positions[next],
                segment,
            );
        });
        evaluated
    }
}

/// Sample a cubic Bezier at `t = i / out.len()` for every output element.
fn evaluate_cubic(
    point_0: Point3,
    point_1: Point3,
    point_2: Point3,
    point_3: Point3,
    out: &mut [Point3],
) {
    let len = out.len() as f64;
    for (i, position) in out.iter_mut().enumerate() {
        let t = i as f64 / len;
        let s = 1.0 - t;
        *position = point_0 * (s * s * s)
            + point_1 * (3.0 * s * s * t)
            + point_2 * (3.0 * s * t * t)
            + point_3 * (t * t * t);
    }
}

impl Spline for BezierSpline {
    fn spline_type(&self) -> SplineType {
        SplineType::Bezier
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
        self.handle_types_left.resize(size, HandleType::default());
        self.handle_types_right.resize(size, HandleType::default());
        self.handle_positions_left.resize(size, Point3::ZERO);
        self.handle_positions_right.resize(size, Point3::ZERO);
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
        self.handles.invalidate();
        self.offsets.invalidate();
        self.evaluated_positions.invalidate();
        self.mappings.invalidate();
        self.common.invalidate();
    }

    fn evaluated_points_size(&self) -> usize {
        self.control_point_offsets().last().copied().unwrap_or(0)
    }

    fn evaluated_positions(&self) -> &[Point3] {
        self.evaluated_positions
            .get_or_compute(|| self.calculate_evaluated_positions())
    }

    fn interpolate_to_evaluated(&self, src: GSpan<'_>) -> GArray {
        debug_assert_eq!(src.len(), self.size());
        if self.size() == 1 {
            return src.pick(&[0]);
        }
        let samples: Vec<LinearSample> = self
            .evaluated_mappings()
            .iter()
            .map(|&mapping| {
                let data = self.interpolation_data_from_index_factor(mapping);
                LinearSample {
                    index: data.control_point_index,
                    next_index: data.next_control_point_index,
                    factor: data.factor,
                }
            })
            .collect();
        src.mix_linear(&samples)
    }

    /// Use the direction of the outer handles at the ends, which the
    /// evaluated points alone do not capture.
    fn correct_end_tangents(&self, tangents: &mut [Vector3]) {
        let size = self.size();
        if size == 0 || tangents.is_empty() {
            return;
        }
        let handles = self.ensure_auto_handles();
        let last = size - 1;
        if handles.left[0] != self.positions[0] {
            tangents[0] = (self.positions[0] - handles.left[0]).normalize_or_zero();
        }
        if handles.right[last] != self.positions[last] {
            let last_tangent = tangents.len() - 1;
            tangents[last_tangent] =
                (handles.right[last] - self.positions[last]).normalize_or_zero();
        }
    }

    fn translate(&mut self, translation: Vector3) {
        self.bake_handles();
        for position in self
            .positions
            .iter_mut()
            .chain(&mut self.handle_positions_left)
            .chain(&mut self.handle_positions_right)
        {
            *position += translation;
        }
        self.mark_cache_invalid();
    }

    fn transform(&mut self, matrix: &DMat4) {
        self.bake_handles();
        for position in self
            .positions
            .iter_mut()
            .chain(&mut self.handle_positions_left)
            .chain(&mut self.handle_positions_right)
        {
            *position = matrix.transform_point3(*position);
        }
        self.mark_cache_invalid();
    }

    fn copy(&self) -> SplinePtr {
        Box::new(self.clone())
    }

    fn copy_only_settings(&self) -> SplinePtr {
        Box::new(Self {
            common: self.common.copy_settings(),
            resolution: self.resolution,
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use spline_math::dvec3;

    type PointSpec = (Point3, HandleType, Point3, HandleType, Point3);

    fn bezier(points: &[PointSpec], resolution: usize) -> BezierSpline {
        let mut spline = BezierSpline::new();
        for &(position, type_left, left, type_right, right) in points {
            spline.add_point(position, type_left, left, type_right, right, 1.0, 0.0);
        }
        spline.set_resolution(resolution).unwrap();
        spline
    }

    fn free_line() -> BezierSpline {
        let start = dvec3(0.0, 0.0, 0.0);
        let end = dvec3(10.0, 0.0, 0.0);
        bezier(
            &[
                (start, HandleType::Free, start, HandleType::Free, start),
                (end, HandleType::Free, end, HandleType::Free, end),
            ],
            4,
        )
    }

    fn auto_points(points: &[Point3]) -> Vec<PointSpec> {
        points
            .iter()
            .map(|&p| (p, HandleType::Auto, p, HandleType::Auto, p))
            .collect()
    }

    #[test]
    fn test_straight_segment_evaluation() {
        let spline = free_line();
        assert_eq!(spline.evaluated_points_size(), 5);
        assert_eq!(spline.control_point_offsets(), &[0, 4, 5]);
        let evaluated = spline.evaluated_positions();
        assert_abs_diff_eq!(evaluated[2].x, 5.0, epsilon = 1e-12);
        assert_eq!(evaluated[4], dvec3(10.0, 0.0, 0.0));
        assert_abs_diff_eq!(spline.length(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vector_segment_is_two_points() {
        let a = Point3::ZERO;
        let b = dvec3(3.0, 4.0, 0.0);
        let spline = bezier(
            &[
                (a, HandleType::Vector, a, HandleType::Vector, a),
                (b, HandleType::Vector, b, HandleType::Vector, b),
            ],
            12,
        );
        assert!(spline.segment_is_vector(0).unwrap());
        assert_eq!(spline.evaluated_positions(), &[a, b]);
        assert_abs_diff_eq!(spline.length(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vector_handles_third_of_the_way() {
        let points = [Point3::ZERO, dvec3(3.0, 0.0, 0.0), dvec3(3.0, 3.0, 0.0)];
        let spline = bezier(
            &points
                .iter()
                .map(|&p| (p, HandleType::Vector, p, HandleType::Vector, p))
                .collect::<Vec<_>>(),
            4,
        );
        let left = spline.handle_positions_left();
        let right = spline.handle_positions_right();
        assert_abs_diff_eq!(left[1].distance(dvec3(2.0, 0.0, 0.0)), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(right[1].distance(dvec3(3.0, 1.0, 0.0)), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_auto_handles_on_a_line_stay_straight() {
        let spline = bezier(&auto_points(&[Point3::ZERO, dvec3(10.0, 0.0, 0.0)]), 8);
        let right = spline.handle_positions_right();
        assert_abs_diff_eq!(right[0].x, 20.0 / (2.0 * AUTO_HANDLE_FACTOR), epsilon = 1e-12);
        for pair in spline.evaluated_positions().windows(2) {
            assert_eq!(pair[0].y, 0.0);
            assert!(pair[1].x > pair[0].x);
        }
    }

    #[test]
    fn test_auto_handles_follow_position_changes() {
        let mut spline = bezier(
            &auto_points(&[Point3::ZERO, dvec3(1.0, 1.0, 0.0), dvec3(2.0, 0.0, 0.0)]),
            4,
        );
        let before = spline.handle_positions_left()[1];
        assert_abs_diff_eq!(before.y, 1.0, epsilon = 1e-12);
        spline.positions_mut()[1].y = 2.0;
        let after = spline.handle_positions_left()[1];
        assert_abs_diff_eq!(after.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_evaluated_mappings() {
        let spline = free_line();
        assert_eq!(spline.evaluated_mappings(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
        let data = spline.interpolation_data_from_index_factor(1.0);
        assert_eq!(data.control_point_index, 0);
        assert_eq!(data.next_control_point_index, 1);
        assert_eq!(data.factor, 1.0);
    }

    #[test]
    fn test_interpolate_radii() {
        let mut spline = free_line();
        spline.radii_mut().copy_from_slice(&[1.0, 3.0]);
        let radii = spline.interpolate_to_evaluated(GSpan::Float(spline.radii()));
        assert_eq!(radii, GArray::Float(vec![1.0, 1.5, 2.0, 2.5, 3.0]));
    }

    #[test]
    fn test_cyclic_offsets() {
        let mut spline = bezier(
            &auto_points(&[Point3::ZERO, dvec3(1.0, 0.0, 0.0), dvec3(0.0, 1.0, 0.0)]),
            6,
        );
        spline.set_cyclic(true);
        assert_eq!(spline.control_point_offsets(), &[0, 6, 12, 18]);
        assert_eq!(spline.evaluated_points_size(), 18);
        assert_eq!(spline.evaluated_mappings()[17], 2.0 + 5.0 / 6.0);
    }

    #[test]
    fn test_single_point() {
        let p = dvec3(1.0, 2.0, 3.0);
        let spline = bezier(&[(p, HandleType::Free, p, HandleType::Free, p)], 12);
        assert_eq!(spline.evaluated_positions(), &[p]);
        assert_eq!(spline.length(), 0.0);
    }

    #[test]
    fn test_segment_insertion() {
        let spline = free_line();
        let insert = spline.calculate_segment_insertion(0, 1, 0.5).unwrap();
        assert_abs_diff_eq!(
            insert.position.distance(spline.evaluated_positions()[2]),
            0.0,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(insert.left_handle.x, 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(insert.right_handle.x, 7.5, epsilon = 1e-12);
        assert_eq!(insert.handle_prev, Point3::ZERO);

        assert!(matches!(
            spline.calculate_segment_insertion(0, 5, 0.5),
            Err(SplineError::OutOfRange { index: 5, size: 2 })
        ));
        assert!(matches!(
            spline.calculate_segment_insertion(0, 1, 1.5),
            Err(SplineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_insertion_requires_adjacent_points() {
        let spline = bezier(
            &auto_points(&[Point3::ZERO, Point3::X, Point3::Y]),
            4,
        );
        assert!(spline.calculate_segment_insertion(0, 2, 0.5).is_err());
        assert!(spline.calculate_segment_insertion(2, 0, 0.5).is_ok());
    }

    #[test]
    fn test_end_tangents_use_handles() {
        let spline = bezier(
            &[
                (
                    Point3::ZERO,
                    HandleType::Free,
                    dvec3(-1.0, 0.0, 0.0),
                    HandleType::Free,
                    dvec3(1.0, 0.0, 0.0),
                ),
                (
                    dvec3(10.0, 0.0, 0.0),
                    HandleType::Free,
                    dvec3(9.0, 0.0, 0.0),
                    HandleType::Free,
                    dvec3(10.0, 1.0, 0.0),
                ),
            ],
            4,
        );
        let tangents = spline.evaluated_tangents();
        assert_eq!(tangents[0], dvec3(1.0, 0.0, 0.0));
        assert_eq!(tangents[tangents.len() - 1], dvec3(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_point_is_sharp() {
        let mut spline = bezier(&auto_points(&[Point3::ZERO, Point3::X]), 4);
        assert!(!spline.point_is_sharp(0).unwrap());
        spline.handle_types_right_mut()[0] = HandleType::Free;
        assert!(spline.point_is_sharp(0).unwrap());
    }

    #[test]
    fn test_changing_handle_type_keeps_resolved_position() {
        let mut spline = bezier(
            &auto_points(&[Point3::ZERO, dvec3(4.0, 2.0, 0.5), dvec3(8.0, 0.0, 0.0)]),
            4,
        );
        let right = spline.handle_positions_right()[1];
        let left = spline.handle_positions_left()[1];
        assert_ne!(right, spline.positions()[1]);

        spline.handle_types_right_mut()[1] = HandleType::Free;
        spline.handle_types_left_mut()[1] = HandleType::Align;
        assert_eq!(spline.handle_positions_right()[1], right);
        assert_eq!(spline.handle_positions_left()[1], left);

        // Free handles no longer follow the point.
        spline.positions_mut()[1].y = 5.0;
        assert_eq!(spline.handle_positions_right()[1], right);
    }

    #[test]
    fn test_index_queries_out_of_range() {
        let spline = bezier(&auto_points(&[Point3::ZERO, Point3::X, Point3::Y]), 4);
        assert_eq!(
            spline.point_is_sharp(5),
            Err(SplineError::OutOfRange { index: 5, size: 3 })
        );
        assert_eq!(
            spline.segment_is_vector(9),
            Err(SplineError::OutOfRange { index: 9, size: 3 })
        );
        let mut out = [Point3::ZERO; 4];
        assert_eq!(
            spline.evaluate_segment(7, 8, &mut out),
            Err(SplineError::OutOfRange { index: 7, size: 3 })
        );
        assert_eq!(out, [Point3::ZERO; 4]);
    }

    #[test]
    fn test_evaluate_segment_matches_evaluated_positions() {
        let spline = bezier(&auto_points(&[Point3::ZERO, dvec3(2.0, 1.0, 0.0), Point3::Y]), 4);
        let mut out = [Point3::ZERO; 4];
        spline.evaluate_segment(1, 2, &mut out).unwrap();
        let offsets = spline.control_point_offsets();
        let evaluated = &spline.evaluated_positions()[offsets[1]..offsets[2]];
        for (a, b) in out.iter().zip(evaluated) {
            assert_abs_diff_eq!(a.distance(*b), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_positions_mut_invalidates() {
        let mut spline = free_line();
        assert_abs_diff_eq!(spline.length(), 10.0, epsilon = 1e-12);
        spline.positions_mut()[1] = dvec3(20.0, 0.0, 0.0);
        spline.handle_positions_left_mut()[1] = dvec3(20.0, 0.0, 0.0);
        assert_abs_diff_eq!(spline.length(), 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_translate_moves_handles() {
        let mut spline = free_line();
        spline.translate(dvec3(0.0, 0.0, 5.0));
        assert_eq!(spline.handle_positions_right()[0], dvec3(0.0, 0.0, 5.0));
        for position in spline.evaluated_positions() {
            assert_abs_diff_eq!(position.z, 5.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_set_resolution_zero_fails() {
        let mut spline = free_line();
        assert!(spline.set_resolution(0).is_err());
        assert_eq!(spline.resolution(), 4);
    }
}
