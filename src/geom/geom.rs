use geo::{BoundingRect, Coord, CoordinatePosition, MultiPolygon, Rect};
use geo::algorithm::coordinate_position::CoordPos;
use rstar::{RTree, AABB};

use crate::geom::BoundingBox;

/// Anything that carries a MultiPolygon footprint.
pub(crate) trait Shaped {
    fn shape(&self) -> &MultiPolygon<f64>;
}

impl Shaped for MultiPolygon<f64> {
    #[inline] fn shape(&self) -> &MultiPolygon<f64> { self }
}

/// Geometries holds shapes in enumeration order, backed by an R-tree of bounding boxes.
///
/// The index only prunes candidates; every answer is confirmed by an exact
/// point-in-polygon test, so results do not depend on the tree's layout.
#[derive(Debug, Clone)]
pub(crate) struct Geometries<S> {
    items: Vec<S>,
    rtree: RTree<BoundingBox>,
}

impl<S: Shaped> Geometries<S> {
    /// Construct a Geometries object from shapes in enumeration order.
    pub(crate) fn new(items: Vec<S>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                items.iter().enumerate()
                    .filter_map(|(i, item)| BoundingBox::of(i, item.shape()))
                    .collect()
            ),
            items,
        }
    }

    /// Get the number of shapes.
    #[inline] pub(crate) fn len(&self) -> usize { self.items.len() }

    /// Get the shapes in enumeration order.
    #[inline] pub(crate) fn items(&self) -> &[S] { &self.items }

    /// Indices of shapes whose bounding box contains `coord`, ascending.
    pub(crate) fn candidates(&self, coord: Coord<f64>) -> Vec<usize> {
        let mut hits: Vec<usize> = self.rtree
            .locate_in_envelope_intersecting(&AABB::from_point([coord.x, coord.y]))
            .map(BoundingBox::idx)
            .collect();
        // R-tree traversal order is layout-dependent
        hits.sort_unstable();
        hits
    }

    /// Index of the first shape, in enumeration order, that contains `coord`.
    pub(crate) fn locate(&self, coord: Coord<f64>) -> Option<usize> {
        self.candidates(coord).into_iter()
            .find(|&idx| contains(self.items[idx].shape(), coord))
    }

    /// Same answer as [`Geometries::locate`], without the index.
    pub(crate) fn locate_linear(&self, coord: Coord<f64>) -> Option<usize> {
        self.items.iter().position(|item| contains(item.shape(), coord))
    }

    /// Compute the bounding rectangle of all shapes.
    pub(crate) fn bounds(&self) -> Option<Rect<f64>> {
        self.items.iter()
            .filter_map(|item| item.shape().bounding_rect())
            .reduce(|a, b| Rect::new(
                Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            ))
    }
}

/// Point-in-polygon over every part of `shape`, honoring holes.
/// Points exactly on a ring count as inside.
pub(crate) fn contains(shape: &MultiPolygon<f64>, coord: Coord<f64>) -> bool {
    !matches!(shape.coordinate_position(&coord), CoordPos::Outside)
}
