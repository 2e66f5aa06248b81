use std::sync::OnceLock;

use geo::Coord;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A WGS84 point, latitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[inline] pub fn new(lat: f64, lng: f64) -> Self { Self { lat, lng } }

    /// Finite, with latitude in [-90, 90] and longitude in [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Parse the storage layer's point text, `POINT(lng lat)`, optionally prefixed with `SRID=n;`.
    pub fn parse_wkt(text: &str) -> Option<Self> {
        static WKT_POINT: OnceLock<Regex> = OnceLock::new();
        let re = WKT_POINT.get_or_init(|| {
            Regex::new(r"(?i)^\s*(?:SRID=\d+\s*;\s*)?POINT\s*\(\s*([^\s()]+)\s+([^\s()]+)\s*\)\s*$")
                .expect("WKT point pattern is valid")
        });
        let caps = re.captures(text)?;
        let lng = caps[1].parse::<f64>().ok()?;
        let lat = caps[2].parse::<f64>().ok()?;
        Some(Self { lat, lng })
    }

    /// As a geo coordinate (x = longitude, y = latitude).
    #[inline] pub(crate) fn to_geo(self) -> Coord<f64> { Coord { x: self.lng, y: self.lat } }
}

/// Read a location in any form the submission and storage layers produce:
/// `{lat, lng}`, a GeoJSON `Point` (`[lng, lat]`), or `POINT(lng lat)` text.
/// Unrecognized values become `None` rather than failing the whole document.
pub(crate) fn deserialize_location<'de, D>(deserializer: D) -> Result<Option<Coordinate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(location_from_value))
}

fn location_from_value(value: &Value) -> Option<Coordinate> {
    match value {
        Value::String(text) => Coordinate::parse_wkt(text),
        Value::Object(map) => {
            if let (Some(lat), Some(lng)) = (map.get("lat"), map.get("lng")) {
                return Some(Coordinate::new(lat.as_f64()?, lng.as_f64()?));
            }
            let position = map.get("coordinates")?.as_array()?;
            match (map.get("type")?.as_str()?, position.as_slice()) {
                ("Point", [lng, lat, ..]) => Some(Coordinate::new(lat.as_f64()?, lng.as_f64()?)),
                _ => None,
            }
        }
        _ => None,
    }
}
