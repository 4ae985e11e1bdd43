use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Index {index} out of range for size {size}")]
    OutOfRange { index: usize, size: usize },

    #[error("Attribute '{name}' has {actual} elements, expected {expected}")]
    AttributeSize {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Attribute '{name}' has an unexpected element type")]
    AttributeType { name: String },
}

impl SplineError {
    /// Fail with [`SplineError::OutOfRange`] unless `index < size`.
    pub fn check_index(index: usize, size: usize) -> Result<()> {
        if index < size {
            Ok(())
        } else {
            Err(Self::OutOfRange { index, size })
        }
    }
}

pub type Result<T> = std::result::Result<T, SplineError>;
