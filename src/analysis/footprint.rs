// src/analysis/footprint.rs
//
// Zone intersection on the ground-contact edge only. Testing the full box
// would flag objects that merely overlap the zone from above (overpasses,
// tall vehicles in the next lane); the bottom edge approximates where the
// object actually stands.

use crate::types::{BoundingBox, Point2D};
use crate::zone::ZoneMask;

pub const DEFAULT_EDGE_MARGIN: i32 = 25;

#[derive(Debug, Clone, Copy)]
pub struct IntersectionDetector {
    /// Inward trim at both ends of the bottom edge, so a box whose corner
    /// just grazes the zone outline is not counted.
    margin: i32,
}

impl Default for IntersectionDetector {
    fn default() -> Self {
        Self::new(DEFAULT_EDGE_MARGIN)
    }
}

impl IntersectionDetector {
    pub fn new(margin: i32) -> Self {
        Self { margin }
    }

    /// True iff any pixel of the trimmed bottom edge lies in the zone.
    ///
    /// When the box is narrower than twice the margin the trimmed endpoints
    /// cross over and the segment is taken between them as given. The edge
    /// is horizontal, so only its span inside the frame is scanned.
    pub fn footprint_intersects(&self, bbox: &BoundingBox, zone: &ZoneMask) -> bool {
        let (from, to) = bbox.footprint(self.margin);
        let y = from.y;
        if y < 0 || y as i64 >= zone.height() as i64 {
            return false;
        }

        let lo = from.x.min(to.x).max(0);
        let hi = (from.x.max(to.x) as i64).min(zone.width() as i64 - 1) as i32;
        if lo > hi {
            return false;
        }
        (lo..=hi).any(|x| zone.contains(Point2D::new(x, y)))
    }
}
