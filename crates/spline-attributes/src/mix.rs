//! Blending rules for attribute element types.

use std::ops::{Add, Mul};

use spline_math::{Color, DVec2, DVec3};

/// An element type that can be blended between control points.
///
/// Values are blended in an accumulator space (`f64` or a float vector) and
/// converted back. Integers round to the nearest value and booleans pick the
/// side holding the larger share of weight, which makes a two-way blend of a
/// boolean a nearest-neighbour selection.
pub trait Mix: Copy + Default + Send + Sync + 'static {
    type Accumulator: Copy
        + Default
        + Add<Output = Self::Accumulator>
        + Mul<f64, Output = Self::Accumulator>;

    fn to_accumulator(self) -> Self::Accumulator;
    fn from_accumulator(value: Self::Accumulator) -> Self;

    /// Blend from `a` (factor 0) to `b` (factor 1).
    fn mix2(factor: f64, a: Self, b: Self) -> Self {
        Self::from_accumulator(a.to_accumulator() * (1.0 - factor) + b.to_accumulator() * factor)
    }
}

macro_rules! impl_mix_identity {
    ($($ty:ty),*) => {
        $(
            impl Mix for $ty {
                type Accumulator = $ty;

                fn to_accumulator(self) -> $ty {
                    self
                }

                fn from_accumulator(value: $ty) -> $ty {
                    value
                }
            }
        )*
    };
}

impl_mix_identity!(f64, DVec2, DVec3, Color);

impl Mix for i32 {
    type Accumulator = f64;

    fn to_accumulator(self) -> f64 {
        f64::from(self)
    }

    fn from_accumulator(value: f64) -> i32 {
        value.round() as i32
    }
}

impl Mix for bool {
    type Accumulator = f64;

    fn to_accumulator(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }

    fn from_accumulator(value: f64) -> bool {
        value >= 0.5
    }
}

/// Accumulates weighted contributions per output element and normalizes them
/// by the total weight on [`Mixer::finalize`].
#[derive(Debug, Clone)]
pub struct Mixer<T: Mix> {
    sums: Vec<T::Accumulator>,
    total_weights: Vec<f64>,
}

impl<T: Mix> Mixer<T> {
    pub fn new(len: usize) -> Self {
        Self {
            sums: vec![T::Accumulator::default(); len],
            total_weights: vec![0.0; len],
        }
    }

    pub fn mix_in(&mut self, index: usize, value: T, weight: f64) {
        self.sums[index] = self.sums[index] + value.to_accumulator() * weight;
        self.total_weights[index] += weight;
    }

    /// Elements that received no weight become `T::default()`.
    pub fn finalize(self) -> Vec<T> {
        self.sums
            .into_iter()
            .zip(self.total_weights)
            .map(|(sum, weight)| {
                if weight > 0.0 {
                    T::from_accumulator(sum * (1.0 / weight))
                } else {
                    T::default()
                }
            })
            .collect()
    }
}
