use tracing::debug;

use crate::division::{DivisionPolygon, PolygonStore};
use crate::resolve::Coordinate;

/// Result of resolving a point.
///
/// `Unresolved` is a normal outcome (the point is outside every division),
/// not an error.
#[derive(Debug, Clone, Copy)]
pub enum Resolution<'a> {
    Division(&'a DivisionPolygon),
    Unresolved,
}

impl<'a> Resolution<'a> {
    #[inline] pub fn division(self) -> Option<&'a DivisionPolygon> {
        match self {
            Resolution::Division(division) => Some(division),
            Resolution::Unresolved => None,
        }
    }

    #[inline] pub fn is_unresolved(&self) -> bool { matches!(self, Resolution::Unresolved) }
}

/// Maps coordinates to divisions of one store.
///
/// When divisions overlap, the first one in dataset enumeration order wins and
/// the later one never receives the shared area. Points exactly on a boundary
/// count as inside.
#[derive(Debug, Clone, Copy)]
pub struct PointResolver<'a> {
    store: &'a PolygonStore,
}

impl<'a> PointResolver<'a> {
    #[inline] pub fn new(store: &'a PolygonStore) -> Self { Self { store } }

    /// Get the store this resolver reads.
    #[inline] pub fn store(&self) -> &'a PolygonStore { self.store }

    /// Resolve a latitude/longitude pair using the bounding-box index.
    pub fn resolve(&self, lat: f64, lng: f64) -> Resolution<'a> {
        self.resolve_with(Coordinate::new(lat, lng), PolygonStore::locate)
    }

    /// Resolve by testing every division in order. Same answers as [`PointResolver::resolve`], slower.
    pub fn resolve_linear(&self, lat: f64, lng: f64) -> Resolution<'a> {
        self.resolve_with(Coordinate::new(lat, lng), PolygonStore::locate_linear)
    }

    #[inline]
    pub fn resolve_coordinate(&self, coordinate: Coordinate) -> Resolution<'a> {
        self.resolve(coordinate.lat, coordinate.lng)
    }

    fn resolve_with(
        &self,
        coordinate: Coordinate,
        locate: impl Fn(&PolygonStore, geo::Coord<f64>) -> Option<usize>,
    ) -> Resolution<'a> {
        if !coordinate.lat.is_finite() || !coordinate.lng.is_finite() {
            return Resolution::Unresolved;
        }
        match locate(self.store, coordinate.to_geo()).and_then(|idx| self.store.get(idx)) {
            Some(division) => Resolution::Division(division),
            None => Resolution::Unresolved,
        }
    }

    /// Resolve a record's division identity.
    ///
    /// A declared name wins (it is the aggregation identity even when the
    /// dataset does not know it); then a declared code looked up in the
    /// dataset; then the coordinate. `None` if nothing yields a name.
    pub fn identify<'r>(
        &self,
        declared_code: Option<&'r str>,
        declared_name: Option<&'r str>,
        coordinate: Option<Coordinate>,
    ) -> Option<DivisionRef<'r>>
    where
        'a: 'r,
    {
        let declared_code = declared_code.map(str::trim).filter(|code| !code.is_empty());

        if let Some(name) = declared_name.filter(|name| !name.trim().is_empty()) {
            let code = declared_code.or_else(|| self.store.find_by_name(name).and_then(DivisionPolygon::code));
            return Some(DivisionRef { code, name, via: Via::Name });
        }

        if let Some(division) = declared_code.and_then(|code| self.store.find_by_code(code)) {
            return Some(DivisionRef {
                code: division.code().or(declared_code),
                name: division.name(),
                via: Via::Code,
            });
        }

        let division = self.resolve_coordinate(coordinate?).division()?;
        debug!(name = division.name(), "resolved record by coordinate");
        Some(DivisionRef { code: division.code(), name: division.name(), via: Via::Point })
    }
}

/// Free-function form of [`PointResolver::resolve`].
#[inline]
pub fn resolve(lat: f64, lng: f64, store: &PolygonStore) -> Resolution<'_> {
    PointResolver::new(store).resolve(lat, lng)
}

/// How a record's division was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Via {
    /// The record declared a division name.
    Name,
    /// The record declared only a code, found in the dataset.
    Code,
    /// The record's coordinate fell inside a division.
    Point,
}

/// A division identity borrowed from a record or the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DivisionRef<'a> {
    pub code: Option<&'a str>,
    pub name: &'a str,
    pub via: Via,
}

#[cfg(test)]
mod tests {
    use geo::{polygon, MultiPolygon};

    use super::{resolve, PointResolver, Via};
    use crate::division::{DivisionPolygon, PolygonStore};
    use crate::resolve::Coordinate;

    fn rect(code: Option<&str>, name: &str, (x0, y0): (f64, f64), (x1, y1): (f64, f64)) -> DivisionPolygon {
        let shape = MultiPolygon(vec![polygon![
            (x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1), (x: x0, y: y0),
        ]]);
        DivisionPolygon::new(code.map(str::to_string), name, shape)
    }

    fn store() -> PolygonStore {
        PolygonStore::from_divisions(vec![
            rect(Some("W"), "West", (0.0, 0.0), (1.0, 1.0)),
            rect(Some("E"), "East", (1.0, 0.0), (2.0, 1.0)),
            rect(None, "Overlap", (0.5, 0.0), (1.5, 1.0)),
        ]).unwrap()
    }

    #[test]
    fn unit_square_scenario() {
        let store = PolygonStore::from_divisions(vec![rect(Some("SQ"), "Square", (0.0, 0.0), (1.0, 1.0))]).unwrap();
        assert_eq!(resolve(0.5, 0.5, &store).division().map(|d| d.name()), Some("Square"));
        assert!(resolve(2.0, 2.0, &store).is_unresolved());
    }

    #[test]
    fn overlap_goes_to_first_in_enumeration_order() {
        let store = store();
        let resolver = PointResolver::new(&store);
        // (lat 0.5, lng 0.75) is inside both West and Overlap
        assert_eq!(resolver.resolve(0.5, 0.75).division().map(|d| d.name()), Some("West"));
        assert_eq!(resolver.resolve(0.5, 1.25).division().map(|d| d.name()), Some("East"));
    }

    #[test]
    fn shared_edge_is_stable() {
        let store = store();
        let resolver = PointResolver::new(&store);
        let first = resolver.resolve(0.5, 1.0).division().map(|d| d.name());
        for _ in 0..10 {
            assert_eq!(resolver.resolve(0.5, 1.0).division().map(|d| d.name()), first);
        }
        assert_eq!(first, Some("West"));
    }

    #[test]
    fn non_finite_is_unresolved() {
        let store = store();
        assert!(resolve(f64::NAN, 0.5, &store).is_unresolved());
        assert!(resolve(0.5, f64::INFINITY, &store).is_unresolved());
    }

    #[test]
    fn identify_precedence() {
        let store = store();
        let resolver = PointResolver::new(&store);
        let inside_east = Some(Coordinate::new(0.5, 1.75));

        // declared name wins over coordinate, code backfilled from the dataset
        let r = resolver.identify(None, Some(" west "), inside_east).unwrap();
        assert_eq!((r.name, r.code, r.via), (" west ", Some("W"), Via::Name));

        // declared name unknown to the dataset is still usable
        let r = resolver.identify(Some("X-1"), Some("Elsewhere"), None).unwrap();
        assert_eq!((r.name, r.code, r.via), ("Elsewhere", Some("X-1"), Via::Name));

        // code only, case-insensitive lookup reports the dataset's spelling
        let r = resolver.identify(Some("w"), Some("  "), inside_east).unwrap();
        assert_eq!((r.name, r.code, r.via), ("West", Some("W"), Via::Code));

        // unknown code falls through to the coordinate
        let r = resolver.identify(Some("nope"), None, inside_east).unwrap();
        assert_eq!((r.name, r.code, r.via), ("East", Some("E"), Via::Point));

        assert!(resolver.identify(None, None, Some(Coordinate::new(5.0, 5.0))).is_none());
        assert!(resolver.identify(None, None, None).is_none());
    }
}
