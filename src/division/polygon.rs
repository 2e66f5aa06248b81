use geo::{Coord, MultiPolygon};

use crate::geom::{contains, Shaped};
use crate::normalize::normalize;

/// An administrative division: display name, optional code and footprint.
///
/// Immutable once loaded; the store hands out shared references only.
#[derive(Debug, Clone)]
pub struct DivisionPolygon {
    code: Option<String>,
    name: String,
    key: String, // normalized name, cached
    geometry: MultiPolygon<f64>,
}

impl DivisionPolygon {
    /// Build a division. A blank `code` is treated as absent.
    pub fn new(code: Option<String>, name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        let name = name.into();
        Self {
            code: code.filter(|c| !c.trim().is_empty()),
            key: normalize(&name),
            name,
            geometry,
        }
    }

    /// Get the division code, if the dataset supplied one.
    #[inline] pub fn code(&self) -> Option<&str> { self.code.as_deref() }

    /// Get the display name.
    #[inline] pub fn name(&self) -> &str { &self.name }

    /// Get the normalized aggregation key of the name.
    #[inline] pub fn key(&self) -> &str { &self.key }

    /// Get the footprint, in longitude/latitude order.
    #[inline] pub fn geometry(&self) -> &MultiPolygon<f64> { &self.geometry }

    /// Check whether the point lies inside (or on the boundary of) any part of the footprint.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        contains(&self.geometry, Coord { x: lng, y: lat })
    }
}

impl Shaped for DivisionPolygon {
    #[inline] fn shape(&self) -> &MultiPolygon<f64> { &self.geometry }
}
