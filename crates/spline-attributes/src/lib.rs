//! Type-erased per-point attribute arrays.
//!
//! Splines store arbitrary named data per control point. The data is kept in
//! [`GArray`] (owned) and [`GSpan`] (borrowed) sum types over the supported
//! element types; generic code is written once against [`Mix`] and dispatched
//! a single time per array with [`dispatch_span!`].

pub mod array;
pub mod mix;
pub mod sampler;
pub mod storage;

pub use array::{AttributeElement, AttributeType, GArray, GSpan};
pub use mix::{Mix, Mixer};
pub use sampler::{LinearSample, WeightWindow};
pub use storage::AttributeStorage;
