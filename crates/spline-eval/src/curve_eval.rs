//! An ordered collection of splines with attributes on all of their points.

use rayon::prelude::*;
use spline_attributes::AttributeStorage;
use spline_core::{Result, SplineError, Validate};
use spline_math::{Aabb3, DMat4, Vector3};
use tracing::warn;

use crate::spline::{SplinePtr, SplineType};

/// A curve made of independent splines.
///
/// The point-domain attributes of the collection are indexed by the
/// concatenation of every spline's control points, in spline order.
#[derive(Debug, Default)]
pub struct CurveEval {
    splines: Vec<SplinePtr>,
    attributes: AttributeStorage,
}

impl Clone for CurveEval {
    fn clone(&self) -> Self {
        Self {
            splines: self.splines.iter().map(|spline| spline.copy()).collect(),
            attributes: self.attributes.clone(),
        }
    }
}

impl CurveEval {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn splines(&self) -> &[SplinePtr] {
        &self.splines
    }

    /// Mutable access to the splines. Changing a spline's size through this
    /// leaves the collection attributes out of date until the next structural
    /// edit; [`Validate::validate`] reports the mismatch.
    pub fn splines_mut(&mut self) -> &mut [SplinePtr] {
        &mut self.splines
    }

    pub fn has_spline_with_type(&self, spline_type: SplineType) -> bool {
        self.splines
            .iter()
            .any(|spline| spline.spline_type() == spline_type)
    }

    pub fn add_spline(&mut self, spline: SplinePtr) {
        self.splines.push(spline);
        self.attributes.reallocate(self.total_control_points());
    }

    /// Remove the splines at `indices` along with their points' attribute
    /// values. Nothing is removed if any index is out of range.
    pub fn remove_splines(&mut self, indices: &[usize]) -> Result<()> {
        let len = self.splines.len();
        for &index in indices {
            SplineError::check_index(index, len)?;
        }

        let mut remove = vec![false; len];
        for &index in indices {
            remove[index] = true;
        }

        let mut point_mask = Vec::with_capacity(self.total_control_points());
        for (spline, &removed) in self.splines.iter().zip(&remove) {
            point_mask.extend(std::iter::repeat(!removed).take(spline.size()));
        }
        self.attributes.retain_mask(&point_mask);

        let mut removed = remove.iter();
        self.splines.retain(|_| !removed.next().copied().unwrap_or(false));
        Ok(())
    }

    /// Drop trailing splines so that `size` remain.
    pub fn resize(&mut self, size: usize) -> Result<()> {
        if size > self.splines.len() {
            return Err(SplineError::InvalidArgument(format!(
                "cannot grow a curve from {} to {size} splines, add them instead",
                self.splines.len()
            )));
        }
        self.splines.truncate(size);
        self.attributes.reallocate(self.total_control_points());
        Ok(())
    }

    pub fn attributes(&self) -> &AttributeStorage {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeStorage {
        &mut self.attributes
    }

    pub fn translate(&mut self, translation: Vector3) {
        for spline in &mut self.splines {
            spline.translate(translation);
        }
    }

    pub fn transform(&mut self, matrix: &DMat4) {
        for spline in &mut self.splines {
            spline.transform(matrix);
        }
    }

    /// Bounds of the control or evaluated positions of every spline, or `None`
    /// if no spline has any points.
    pub fn bounds_min_max(&self, use_evaluated: bool) -> Option<Aabb3> {
        self.splines
            .par_iter()
            .filter_map(|spline| spline.bounds_min_max(use_evaluated))
            .reduce_with(|a, b| a.merge(&b))
    }

    /// The index of the first control point of every spline, followed by the
    /// total number of control points.
    pub fn control_point_offsets(&self) -> Vec<usize> {
        prefix_sums(self.splines.iter().map(|spline| spline.size()))
    }

    /// The index of the first evaluated point of every spline, followed by the
    /// total number of evaluated points.
    pub fn evaluated_point_offsets(&self) -> Vec<usize> {
        prefix_sums(
            self.splines
                .iter()
                .map(|spline| spline.evaluated_points_size()),
        )
    }

    pub fn total_control_points(&self) -> usize {
        self.splines.iter().map(|spline| spline.size()).sum()
    }

    pub fn assert_valid_point_attributes(&self) {
        debug_assert!(
            self.validate().is_ok(),
            "curve point attributes do not match the spline sizes"
        );
    }
}

impl Validate for CurveEval {
    fn validate(&self) -> Result<()> {
        let total = self.total_control_points();
        if let Err(err) = self.attributes.validate_size(total) {
            warn!(%err, total, "curve attributes do not cover every control point");
            return Err(err);
        }
        for (index, spline) in self.splines.iter().enumerate() {
            if let Err(err) = spline.attributes().validate_size(spline.size()) {
                warn!(%err, index, "spline attributes do not match its size");
                return Err(err);
            }
        }
        Ok(())
    }
}

fn prefix_sums(sizes: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut offsets = vec![0];
    let mut total = 0;
    for size in sizes {
        total += size;
        offsets.push(total);
    }
    offsets
}
