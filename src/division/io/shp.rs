use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::{dbase::Record, PolygonRing, Reader, Shape};

use crate::division::io::RawFeature;
use crate::error::DatasetError;

/// Read all polygon shapes + attribute records from a `.shp` file (with its `.dbf` sidecar).
pub(crate) fn read_features(path: &Path) -> Result<Vec<RawFeature<Record>>, DatasetError> {
    let mut reader = Reader::from_path(path)?;

    let mut features = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;
        let geometry = match &shape {
            Shape::Polygon(p) => rings_to_geo(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
            Shape::PolygonM(p) => rings_to_geo(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
            Shape::PolygonZ(p) => rings_to_geo(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
            other => Err(format!("unsupported shape type {:?}", other.shapetype())),
        };
        features.push(RawFeature { properties: record, geometry });
    }
    Ok(features)
}

/// Convert shapefile rings to a geo::MultiPolygon.
///
/// Shapefiles store each outer ring followed by its holes, and tag every ring
/// as `Outer` or `Inner`, so no orientation test is needed.
fn rings_to_geo<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> Coord<f64>) -> Result<MultiPolygon<f64>, String> {
    /// Ensure first and last are the same for geo::LineString coords
    fn closed(mut coords: Vec<Coord<f64>>) -> Result<LineString<f64>, String> {
        if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
            if first != last { coords.push(first) }
        }
        if coords.len() < 4 {
            return Err(format!("ring has {} points, a closed ring needs at least 4", coords.len()));
        }
        Ok(LineString(coords))
    }

    let mut polys: Vec<Polygon<f64>> = Vec::new();
    let mut current_exterior: Option<LineString<f64>> = None;
    let mut current_holes: Vec<LineString<f64>> = Vec::new();

    for ring in rings {
        let ls = closed(ring.points().iter().map(&xy).collect())?;
        match ring {
            PolygonRing::Outer(_) => {
                // flush previous polygon
                if let Some(ext) = current_exterior.take() {
                    polys.push(Polygon::new(ext, std::mem::take(&mut current_holes)));
                }
                current_exterior = Some(ls);
            }
            PolygonRing::Inner(_) => {
                if current_exterior.is_none() {
                    return Err("hole ring appears before any outer ring".to_string());
                }
                current_holes.push(ls);
            }
        }
    }
    match current_exterior {
        Some(ext) => polys.push(Polygon::new(ext, current_holes)),
        None => return Err("shape has no outer ring".to_string()),
    }

    Ok(MultiPolygon(polys))
}

#[cfg(test)]
mod tests {
    use geo::Coord;
    use shapefile::{Point, PolygonRing};

    use super::rings_to_geo;

    fn ring(points: &[(f64, f64)]) -> Vec<Point> {
        points.iter().map(|&(x, y)| Point { x, y }).collect()
    }

    fn xy(p: &Point) -> Coord<f64> { Coord { x: p.x, y: p.y } }

    #[test]
    fn groups_holes_with_preceding_outer() {
        let rings = vec![
            PolygonRing::Outer(ring(&[(0., 0.), (0., 4.), (4., 4.), (4., 0.), (0., 0.)])),
            PolygonRing::Inner(ring(&[(1., 1.), (3., 1.), (3., 3.), (1., 3.), (1., 1.)])),
            PolygonRing::Outer(ring(&[(10., 10.), (10., 11.), (11., 11.), (10., 10.)])),
        ];
        let shape = rings_to_geo(&rings, xy).unwrap();
        assert_eq!(shape.0.len(), 2);
        assert_eq!(shape.0[0].interiors().len(), 1);
        assert!(shape.0[1].interiors().is_empty());
    }

    #[test]
    fn orphan_hole_is_rejected() {
        let rings = vec![PolygonRing::Inner(ring(&[(1., 1.), (3., 1.), (3., 3.), (1., 1.)]))];
        assert!(rings_to_geo(&rings, xy).is_err());
    }
}
