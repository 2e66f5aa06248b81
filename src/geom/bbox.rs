use geo::{BoundingRect, MultiPolygon};
use rstar::{RTreeObject, AABB};

/// A bounding box in an R-tree, associated with a division's MultiPolygon by enumeration index.
#[derive(Debug, Clone)]
pub(super) struct BoundingBox {
    idx: usize, // Position of the division in dataset enumeration order
    envelope: AABB<[f64; 2]>,
}

impl BoundingBox {
    /// Build the box for `shape`, or `None` if the shape has no coordinates.
    pub(super) fn of(idx: usize, shape: &MultiPolygon<f64>) -> Option<Self> {
        let rect = shape.bounding_rect()?;
        Some(Self { idx, envelope: AABB::from_corners(rect.min().into(), rect.max().into()) })
    }

    /// Get the enumeration index of the corresponding division.
    #[inline] pub(super) fn idx(&self) -> usize { self.idx }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope { self.envelope }
}
