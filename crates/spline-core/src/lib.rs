pub mod error;
pub mod tolerance;
pub mod traits;

pub use error::{Result, SplineError};
pub use tolerance::Tolerance;
pub use traits::Validate;
