use crate::error::Result;

/// Validate structural integrity of a spline or spline collection.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}
