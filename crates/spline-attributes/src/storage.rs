//! Named attribute arrays that share one domain size.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use spline_core::{Result, SplineError};

use crate::array::{AttributeElement, AttributeType, GArray, GSpan};

/// A set of named [`GArray`]s, each with exactly `size()` elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeStorage {
    size: usize,
    attributes: BTreeMap<String, GArray>,
}

impl AttributeStorage {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            attributes: BTreeMap::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Change the domain size, padding new elements with defaults.
    pub fn reallocate(&mut self, size: usize) {
        self.size = size;
        for array in self.attributes.values_mut() {
            array.resize(size);
        }
    }

    /// Add a default-initialized attribute. Returns false if the name is taken.
    pub fn create(&mut self, name: impl Into<String>, attribute_type: AttributeType) -> bool {
        let name = name.into();
        if self.attributes.contains_key(&name) {
            return false;
        }
        let array = GArray::new_default(attribute_type, self.size);
        self.attributes.insert(name, array);
        true
    }

    /// Insert or replace an attribute with existing data.
    pub fn insert(&mut self, name: impl Into<String>, array: GArray) -> Result<()> {
        let name = name.into();
        if array.len() != self.size {
            return Err(SplineError::AttributeSize {
                name,
                expected: self.size,
                actual: array.len(),
            });
        }
        self.attributes.insert(name, array);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.attributes.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<GSpan<'_>> {
        self.attributes.get(name).map(GArray::as_span)
    }

    pub fn get_typed<T: AttributeElement>(&self, name: &str) -> Result<&[T]> {
        let array = self.attributes.get(name).ok_or_else(|| type_error(name))?;
        array.typed().ok_or_else(|| type_error(name))
    }

    pub fn get_typed_mut<T: AttributeElement>(&mut self, name: &str) -> Result<&mut [T]> {
        let array = self.attributes.get_mut(name).ok_or_else(|| type_error(name))?;
        array.typed_mut().ok_or_else(|| type_error(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, GSpan<'_>)> {
        self.attributes
            .iter()
            .map(|(name, array)| (name.as_str(), array.as_span()))
    }

    /// Keep only the elements whose entry in `keep` is true, in every attribute.
    pub fn retain_mask(&mut self, keep: &[bool]) {
        for array in self.attributes.values_mut() {
            array.retain_mask(keep);
        }
        self.size = keep.iter().filter(|&&kept| kept).count();
    }

    /// Check that every attribute has `size()` elements.
    pub fn validate(&self) -> Result<()> {
        self.validate_size(self.size)
    }

    /// Check that every attribute has `expected` elements.
    pub fn validate_size(&self, expected: usize) -> Result<()> {
        for (name, array) in &self.attributes {
            if array.len() != expected {
                return Err(SplineError::AttributeSize {
                    name: name.clone(),
                    expected,
                    actual: array.len(),
                });
            }
        }
        Ok(())
    }
}

fn type_error(name: &str) -> SplineError {
    SplineError::AttributeType {
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_reallocate() {
        let mut storage = AttributeStorage::new(2);
        assert!(storage.create("weight", AttributeType::Float));
        assert!(!storage.create("weight", AttributeType::Int32));
        storage.get_typed_mut::<f64>("weight").unwrap()[1] = 3.0;

        storage.reallocate(4);
        assert_eq!(storage.get_typed::<f64>("weight").unwrap(), &[0.0, 3.0, 0.0, 0.0]);
        storage.validate().unwrap();
    }

    #[test]
    fn test_insert_rejects_wrong_size() {
        let mut storage = AttributeStorage::new(3);
        let err = storage.insert("id", GArray::Int32(vec![1, 2])).unwrap_err();
        assert_eq!(
            err,
            SplineError::AttributeSize {
                name: "id".into(),
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_typed_access_errors() {
        let mut storage = AttributeStorage::new(1);
        storage.create("flag", AttributeType::Bool);
        assert!(storage.get_typed::<f64>("flag").is_err());
        assert!(storage.get_typed::<bool>("missing").is_err());
        assert_eq!(storage.names().collect::<Vec<_>>(), vec!["flag"]);
    }

    #[test]
    fn test_retain_mask_shrinks_domain() {
        let mut storage = AttributeStorage::new(3);
        storage.insert("id", GArray::Int32(vec![1, 2, 3])).unwrap();
        storage.retain_mask(&[true, false, true]);
        assert_eq!(storage.size(), 2);
        assert_eq!(storage.get_typed::<i32>("id").unwrap(), &[1, 3]);
    }
}
