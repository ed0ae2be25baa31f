//! Made-to-order dimensions.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Custom height and width for a made-to-order item, in inches.
///
/// Two lines for the same product and variant with different dimensions are
/// different cart lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub height: Decimal,
    pub width: Decimal,
}

impl Dimensions {
    #[must_use]
    pub const fn new(height: Decimal, width: Decimal) -> Self {
        Self { height, width }
    }

    /// Identity form with trailing zeros removed, so `36.0` and `36` compare
    /// equal.
    #[must_use]
    pub fn normalize(self) -> Self {
        Self {
            height: self.height.normalize(),
            width: self.width.normalize(),
        }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\" x {}\"", self.height.normalize(), self.width.normalize())
    }
}
