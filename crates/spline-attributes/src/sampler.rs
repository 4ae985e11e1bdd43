//! Generic resampling of attribute arrays.
//!
//! Each evaluator describes how a target element is built from the source
//! array, either as a blend between two neighbours ([`LinearSample`]) or as a
//! normalized weighted sum over a window of elements ([`WeightWindow`]). The
//! routines here apply that description to any element type.

use serde::{Deserialize, Serialize};

use crate::array::{GArray, GSpan};
use crate::dispatch_span;
use crate::mix::{Mix, Mixer};

/// Blend between `src[index]` (factor 0) and `src[next_index]` (factor 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearSample {
    pub index: usize,
    pub next_index: usize,
    pub factor: f64,
}

/// Weights for the elements `start_index + i`, wrapped around the source length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightWindow {
    pub start_index: usize,
    pub weights: Vec<f64>,
}

pub fn mix_linear<T: Mix>(src: &[T], samples: &[LinearSample]) -> Vec<T> {
    samples
        .iter()
        .map(|s| T::mix2(s.factor, src[s.index], src[s.next_index]))
        .collect()
}

pub fn mix_weighted<T: Mix>(src: &[T], windows: &[WeightWindow]) -> Vec<T> {
    let size = src.len();
    let mut mixer = Mixer::new(windows.len());
    for (i, window) in windows.iter().enumerate() {
        for (j, &weight) in window.weights.iter().enumerate() {
            mixer.mix_in(i, src[(window.start_index + j) % size], weight);
        }
    }
    mixer.finalize()
}

pub fn pick<T: Copy>(src: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| src[i]).collect()
}

impl GSpan<'_> {
    /// Linear blend per sample; the result has one element per sample.
    pub fn mix_linear(self, samples: &[LinearSample]) -> GArray {
        dispatch_span!(self, |src| mix_linear(src, samples))
    }

    /// Normalized weighted sum per window; the result has one element per window.
    pub fn mix_weighted(self, windows: &[WeightWindow]) -> GArray {
        dispatch_span!(self, |src| mix_weighted(src, windows))
    }

    /// Nearest-neighbour selection, valid for every element type.
    pub fn pick(self, indices: &[usize]) -> GArray {
        dispatch_span!(self, |src| pick(src, indices))
    }
}
