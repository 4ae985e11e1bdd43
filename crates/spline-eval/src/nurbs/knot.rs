//! Knot vector construction and B-spline basis evaluation.

use serde::{Deserialize, Serialize};

/// How the knot vector of a NURBS spline is laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnotsMode {
    /// Uniform knots. The curve does not reach the first and last points.
    #[default]
    Normal,
    /// Knots repeated `order` times at both ends so the curve passes through
    /// the end points.
    EndPoint,
    /// Clamped ends with interior knots repeated `order - 1` times, so every
    /// `order - 1` points form a Bezier segment.
    Bezier,
}

/// Number of knots for `size` control points.
///
/// Cyclic splines wrap `order - 1` extra points around the seam.
pub fn knots_size(size: usize, order: usize, cyclic: bool) -> usize {
    size + order + if cyclic { order - 1 } else { 0 }
}

/// Build the knot vector for the given point count, order, and mode.
///
/// Cyclic splines always use uniform knots over the wrapped point window.
pub fn calculate_knots(size: usize, order: usize, mode: KnotsMode, cyclic: bool) -> Vec<f64> {
    let len = knots_size(size, order, cyclic);
    if cyclic {
        return (0..len).map(|i| i as f64).collect();
    }
    match mode {
        KnotsMode::Normal => (0..len).map(|i| i as f64).collect(),
        KnotsMode::EndPoint => {
            let last = (size + 1).saturating_sub(order);
            (0..len)
                .map(|i| i.saturating_sub(order - 1).min(last) as f64)
                .collect()
        }
        KnotsMode::Bezier => {
            let interior = |i: usize| ((i - order) / (order - 1) + 1) as f64;
            let end = if size <= order { 1.0 } else { interior(size - 1) + 1.0 };
            (0..len)
                .map(|i| {
                    if i < order {
                        0.0
                    } else if i < size {
                        interior(i)
                    } else {
                        end
                    }
                })
                .collect()
        }
    }
}

/// Find the knot span index for parameter `t` in the knot vector.
///
/// Returns the index `i` such that `knots[i] <= t < knots[i+1]`,
/// with special handling for the upper boundary.
///
/// # Arguments
/// * `degree` - Degree of the B-spline
/// * `knots` - The knot vector
/// * `n` - Number of (wrapped) control points minus 1
/// * `t` - Parameter value
pub fn find_span(degree: usize, knots: &[f64], n: usize, t: f64) -> usize {
    if t >= knots[n + 1] {
        return n;
    }
    if t <= knots[degree] {
        return degree;
    }

    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Compute the non-vanishing basis functions at parameter `t`.
///
/// Returns `degree + 1` values N_{span-degree,degree}(t) through
/// N_{span,degree}(t), which sum to one inside the domain.
pub fn basis_functions(degree: usize, knots: &[f64], span: usize, t: f64) -> Vec<f64> {
    let mut basis = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    basis[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            let denominator = right[r + 1] + left[j - r];
            let temp = if denominator == 0.0 {
                0.0
            } else {
                basis[r] / denominator
            };
            basis[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        basis[j] = saved;
    }
    basis
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knots_size() {
        assert_eq!(knots_size(5, 3, false), 8);
        assert_eq!(knots_size(5, 3, true), 10);
    }

    #[test]
    fn test_normal_knots_are_uniform() {
        assert_eq!(
            calculate_knots(4, 3, KnotsMode::Normal, false),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn test_endpoint_knots_are_clamped() {
        assert_eq!(
            calculate_knots(5, 3, KnotsMode::EndPoint, false),
            vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 3.0, 3.0]
        );
    }

    #[test]
    fn test_bezier_knots_repeat_interior() {
        assert_eq!(
            calculate_knots(7, 4, KnotsMode::Bezier, false),
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0]
        );
        assert_eq!(
            calculate_knots(4, 4, KnotsMode::Bezier, false),
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]
        );
    }

    #[test]
    fn test_cyclic_ignores_mode() {
        let knots = calculate_knots(4, 3, KnotsMode::EndPoint, true);
        assert_eq!(knots.len(), 9);
        assert!(knots.windows(2).all(|w| w[1] - w[0] == 1.0));
    }

    #[test]
    fn test_find_span_clamped() {
        let knots = vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 3.0, 3.0];
        let n = 4;
        let degree = 2;

        assert_eq!(find_span(degree, &knots, n, 0.0), 2);
        assert_eq!(find_span(degree, &knots, n, 0.5), 2);
        assert_eq!(find_span(degree, &knots, n, 1.0), 3);
        assert_eq!(find_span(degree, &knots, n, 1.5), 3);
        assert_eq!(find_span(degree, &knots, n, 2.5), 4);
        assert_eq!(find_span(degree, &knots, n, 3.0), 4);
    }

    #[test]
    fn test_basis_functions_partition_of_unity() {
        let degree = 3;
        for mode in [KnotsMode::Normal, KnotsMode::EndPoint, KnotsMode::Bezier] {
            let knots = calculate_knots(7, degree + 1, mode, false);
            let n = 6;
            let (start, end) = (knots[degree], knots[n + 1]);
            for i in 0..=20 {
                let t = start + (end - start) * i as f64 / 20.0;
                let span = find_span(degree, &knots, n, t);
                let sum: f64 = basis_functions(degree, &knots, span, t).iter().sum();
                assert!(
                    (sum - 1.0).abs() < 1e-12,
                    "Partition of unity failed for {:?} at t={}: sum={}",
                    mode,
                    t,
                    sum
                );
            }
        }
    }

    #[test]
    fn test_basis_functions_non_negative() {
        let knots = vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let degree = 3;
        let n = 3;

        for i in 0..=20 {
            let t = i as f64 / 20.0;
            let span = find_span(degree, &knots, n, t);
            let basis = basis_functions(degree, &knots, span, t);
            for (j, &val) in basis.iter().enumerate() {
                assert!(val >= -1e-15, "Negative basis at t={}, j={}: {}", t, j, val);
            }
        }
    }
}
