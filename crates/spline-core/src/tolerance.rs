/// Tolerances used while evaluating splines.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tolerance {
    /// Linear tolerance for length and distance comparisons (in model units)
    pub linear: f64,
    /// Below this `|x| + |y|` a direction is treated as parallel to the Z axis
    pub direction: f64,
}

impl Tolerance {
    pub const DEFAULT_LINEAR: f64 = 1e-7;
    pub const DEFAULT_DIRECTION: f64 = 1e-4;

    pub const fn new(linear: f64, direction: f64) -> Self {
        Self { linear, direction }
    }

    pub const fn default_precision() -> Self {
        Self {
            linear: Self::DEFAULT_LINEAR,
            direction: Self::DEFAULT_DIRECTION,
        }
    }

    /// Check if two values are equal within linear tolerance
    pub fn linear_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.linear
    }

    /// Check if a value is zero within linear tolerance
    pub fn is_zero(self, v: f64) -> bool {
        v.abs() < self.linear
    }

    /// Whether a direction with these X/Y components is (nearly) vertical.
    pub fn is_vertical(self, x: f64, y: f64) -> bool {
        x.abs() + y.abs() < self.direction
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::default_precision()
    }
}
