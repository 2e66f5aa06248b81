use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{Map, Value};

use crate::division::io::RawFeature;
use crate::error::DatasetError;

/// Read features from GeoJSON FeatureCollection bytes.
///
/// Only a malformed document is an error; a malformed feature is returned
/// with its geometry error so the caller can drop and count it.
pub(crate) fn read_features(bytes: &[u8]) -> Result<Vec<RawFeature<Map<String, Value>>>, DatasetError> {
    let value: Value = serde_json::from_slice(bytes)?;

    match value["type"].as_str() {
        Some("FeatureCollection") => {}
        Some(other) => return Err(DatasetError::NotFeatureCollection(other.to_string())),
        None => return Err(DatasetError::NotFeatureCollection("untyped JSON".to_string())),
    }
    let features = value["features"].as_array()
        .ok_or_else(|| DatasetError::InvalidGeometry("FeatureCollection has no features array".to_string()))?;

    Ok(features.iter().map(|feature| RawFeature {
        properties: feature["properties"].as_object().cloned().unwrap_or_default(),
        geometry: parse_geometry(&feature["geometry"]),
    }).collect())
}

/// Parse a Polygon or MultiPolygon geometry object into a geo::MultiPolygon.
fn parse_geometry(geometry: &Value) -> Result<MultiPolygon<f64>, String> {
    let coords = geometry["coordinates"].as_array();
    match (geometry["type"].as_str(), coords) {
        (Some("Polygon"), Some(rings)) => Ok(MultiPolygon(vec![parse_polygon_coords(rings)?])),
        (Some("MultiPolygon"), Some(polygons)) => {
            let polygons = polygons.iter()
                .map(|polygon| polygon.as_array()
                    .ok_or_else(|| "MultiPolygon member is not an array".to_string())
                    .and_then(|rings| parse_polygon_coords(rings)))
                .collect::<Result<Vec<_>, _>>()?;
            if polygons.is_empty() { return Err("MultiPolygon has no polygons".to_string()) }
            Ok(MultiPolygon(polygons))
        }
        (Some(ty @ ("Polygon" | "MultiPolygon")), None) => Err(format!("{ty} has no coordinates")),
        (Some(other), _) => Err(format!("unsupported geometry type {other}")),
        (None, _) => Err("feature has no geometry".to_string()),
    }
}

/// Parse GeoJSON Polygon coordinates: the first ring is the exterior, the rest are holes.
fn parse_polygon_coords(rings: &[Value]) -> Result<Polygon<f64>, String> {
    let mut rings = rings.iter().map(|ring| {
        ring.as_array()
            .ok_or_else(|| "ring is not an array".to_string())
            .and_then(|coords| parse_ring_coords(coords))
    });

    let exterior = rings.next().ok_or_else(|| "polygon has no exterior ring".to_string())??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Parse a ring of `[lng, lat]` positions, closing it if needed.
fn parse_ring_coords(coords: &[Value]) -> Result<LineString<f64>, String> {
    let mut points = coords.iter().map(|position| -> Result<Coord<f64>, String> {
        let pair = position.as_array().filter(|p| p.len() >= 2)
            .ok_or_else(|| "position must have at least two numbers".to_string())?;
        match (pair[0].as_f64(), pair[1].as_f64()) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Ok(Coord { x, y }),
            _ => Err(format!("invalid position {position}")),
        }
    }).collect::<Result<Vec<_>, _>>()?;

    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if first != last { points.push(first) }
    }
    if points.len() < 4 {
        return Err(format!("ring has {} positions, a closed ring needs at least 4", points.len()));
    }
    Ok(LineString(points))
}
