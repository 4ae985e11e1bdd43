//! Owned and borrowed type-erased arrays.

use serde::{Deserialize, Serialize};
use spline_math::{Color, DVec2, DVec3};

use crate::mix::Mix;

/// Element type of an attribute array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    Float,
    Float2,
    Float3,
    Color,
    Int32,
    Bool,
}

/// An owned array of one of the supported element types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GArray {
    Float(Vec<f64>),
    Float2(Vec<DVec2>),
    Float3(Vec<DVec3>),
    Color(Vec<Color>),
    Int32(Vec<i32>),
    Bool(Vec<bool>),
}

/// A borrowed view of a [`GArray`] or of any typed slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GSpan<'a> {
    Float(&'a [f64]),
    Float2(&'a [DVec2]),
    Float3(&'a [DVec3]),
    Color(&'a [Color]),
    Int32(&'a [i32]),
    Bool(&'a [bool]),
}

/// Run a generic expression over the typed slice inside a [`GSpan`] and wrap
/// the resulting `Vec` back into a [`GArray`] of the same element type.
///
/// ```
/// use spline_attributes::{dispatch_span, GArray, GSpan};
///
/// let values = [1.0, 2.0];
/// let doubled = dispatch_span!(GSpan::Float(&values), |src| src.iter().chain(src).copied().collect());
/// assert_eq!(doubled, GArray::Float(vec![1.0, 2.0, 1.0, 2.0]));
/// ```
#[macro_export]
macro_rules! dispatch_span {
    ($span:expr, |$src:ident| $body:expr) => {
        match $span {
            $crate::GSpan::Float($src) => $crate::GArray::Float($body),
            $crate::GSpan::Float2($src) => $crate::GArray::Float2($body),
            $crate::GSpan::Float3($src) => $crate::GArray::Float3($body),
            $crate::GSpan::Color($src) => $crate::GArray::Color($body),
            $crate::GSpan::Int32($src) => $crate::GArray::Int32($body),
            $crate::GSpan::Bool($src) => $crate::GArray::Bool($body),
        }
    };
}

macro_rules! for_each_garray {
    ($array:expr, |$values:ident| $body:expr) => {
        match $array {
            GArray::Float($values) => $body,
            GArray::Float2($values) => $body,
            GArray::Float3($values) => $body,
            GArray::Color($values) => $body,
            GArray::Int32($values) => $body,
            GArray::Bool($values) => $body,
        }
    };
}

/// Conversion between a concrete element type and the type-erased arrays.
pub trait AttributeElement: Mix {
    const TYPE: AttributeType;

    fn wrap(values: Vec<Self>) -> GArray;
    fn span(values: &[Self]) -> GSpan<'_>;
    fn from_array(array: GArray) -> Option<Vec<Self>>;
    fn from_span(span: GSpan<'_>) -> Option<&[Self]>;
    fn from_array_mut(array: &mut GArray) -> Option<&mut Vec<Self>>;
}

macro_rules! impl_attribute_element {
    ($ty:ty, $variant:ident) => {
        impl AttributeElement for $ty {
            const TYPE: AttributeType = AttributeType::$variant;

            fn wrap(values: Vec<Self>) -> GArray {
                GArray::$variant(values)
            }

            fn span(values: &[Self]) -> GSpan<'_> {
                GSpan::$variant(values)
            }

            fn from_array(array: GArray) -> Option<Vec<Self>> {
                match array {
                    GArray::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn from_span(span: GSpan<'_>) -> Option<&[Self]> {
                match span {
                    GSpan::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn from_array_mut(array: &mut GArray) -> Option<&mut Vec<Self>> {
                match array {
                    GArray::$variant(values) => Some(values),
                    _ => None,
                }
            }
        }
    };
}

impl_attribute_element!(f64, Float);
impl_attribute_element!(DVec2, Float2);
impl_attribute_element!(DVec3, Float3);
impl_attribute_element!(Color, Color);
impl_attribute_element!(i32, Int32);
impl_attribute_element!(bool, Bool);

impl GArray {
    /// An array of `len` default values.
    pub fn new_default(attribute_type: AttributeType, len: usize) -> Self {
        match attribute_type {
            AttributeType::Float => GArray::Float(vec![0.0; len]),
            AttributeType::Float2 => GArray::Float2(vec![DVec2::ZERO; len]),
            AttributeType::Float3 => GArray::Float3(vec![DVec3::ZERO; len]),
            AttributeType::Color => GArray::Color(vec![Color::ZERO; len]),
            AttributeType::Int32 => GArray::Int32(vec![0; len]),
            AttributeType::Bool => GArray::Bool(vec![false; len]),
        }
    }

    pub fn from_vec<T: AttributeElement>(values: Vec<T>) -> Self {
        T::wrap(values)
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.as_span().attribute_type()
    }

    pub fn len(&self) -> usize {
        for_each_garray!(self, |values| values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_span(&self) -> GSpan<'_> {
        match self {
            GArray::Float(values) => GSpan::Float(values),
            GArray::Float2(values) => GSpan::Float2(values),
            GArray::Float3(values) => GSpan::Float3(values),
            GArray::Color(values) => GSpan::Color(values),
            GArray::Int32(values) => GSpan::Int32(values),
            GArray::Bool(values) => GSpan::Bool(values),
        }
    }

    pub fn typed<T: AttributeElement>(&self) -> Option<&[T]> {
        T::from_span(self.as_span())
    }

    pub fn typed_mut<T: AttributeElement>(&mut self) -> Option<&mut [T]> {
        T::from_array_mut(self).map(Vec::as_mut_slice)
    }

    pub fn into_typed<T: AttributeElement>(self) -> Option<Vec<T>> {
        T::from_array(self)
    }

    /// Grow with default values or truncate to `len`.
    pub fn resize(&mut self, len: usize) {
        for_each_garray!(self, |values| values.resize(len, Default::default()))
    }

    /// Keep only the elements whose entry in `keep` is true.
    pub fn retain_mask(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.len());
        for_each_garray!(self, |values| {
            let mut index = 0;
            values.retain(|_| {
                let kept = keep[index];
                index += 1;
                kept
            });
        })
    }
}

impl<'a> GSpan<'a> {
    pub fn from_slice<T: AttributeElement>(values: &'a [T]) -> Self {
        T::span(values)
    }

    pub fn attribute_type(&self) -> AttributeType {
        match self {
            GSpan::Float(_) => AttributeType::Float,
            GSpan::Float2(_) => AttributeType::Float2,
            GSpan::Float3(_) => AttributeType::Float3,
            GSpan::Color(_) => AttributeType::Color,
            GSpan::Int32(_) => AttributeType::Int32,
            GSpan::Bool(_) => AttributeType::Bool,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            GSpan::Float(values) => values.len(),
            GSpan::Float2(values) => values.len(),
            GSpan::Float3(values) => values.len(),
            GSpan::Color(values) => values.len(),
            GSpan::Int32(values) => values.len(),
            GSpan::Bool(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn typed<T: AttributeElement>(self) -> Option<&'a [T]> {
        T::from_span(self)
    }

    pub fn to_owned_array(self) -> GArray {
        dispatch_span!(self, |values| values.to_vec())
    }
}

impl<'a, T: AttributeElement> From<&'a [T]> for GSpan<'a> {
    fn from(values: &'a [T]) -> Self {
        T::span(values)
    }
}

impl<'a, T: AttributeElement> From<&'a Vec<T>> for GSpan<'a> {
    fn from(values: &'a Vec<T>) -> Self {
        T::span(values)
    }
}

impl<'a> From<&'a GArray> for GSpan<'a> {
    fn from(array: &'a GArray) -> Self {
        array.as_span()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_default_and_type() {
        let array = GArray::new_default(AttributeType::Float3, 3);
        assert_eq!(array.len(), 3);
        assert_eq!(array.attribute_type(), AttributeType::Float3);
        assert_eq!(array.typed::<DVec3>(), Some(&[DVec3::ZERO; 3][..]));
        assert!(array.typed::<f64>().is_none());
    }

    #[test]
    fn test_resize_pads_with_default() {
        let mut array = GArray::from_vec(vec![1_i32, 2]);
        array.resize(4);
        assert_eq!(array.into_typed::<i32>(), Some(vec![1, 2, 0, 0]));
    }

    #[test]
    fn test_retain_mask() {
        let mut array = GArray::from_vec(vec![true, false, true]);
        array.retain_mask(&[false, true, true]);
        assert_eq!(array, GArray::Bool(vec![false, true]));
    }

    #[test]
    fn test_span_roundtrip() {
        let values = vec![DVec2::new(1.0, 2.0)];
        let span = GSpan::from(&values);
        assert_eq!(span.attribute_type(), AttributeType::Float2);
        assert_eq!(span.to_owned_array(), GArray::Float2(values.clone()));
        assert_eq!(span.typed::<DVec2>(), Some(&values[..]));
    }
}
