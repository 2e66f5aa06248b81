mod geojson;
mod shp;

use std::{fs::File, io::Read, path::Path};

use flate2::read::GzDecoder;
use geo::MultiPolygon;
use tracing::warn;

use crate::division::{polygon::DivisionPolygon, props::{Properties, CODE_KEYS, NAME_KEYS}};
use crate::error::DatasetError;

/// One feature as read from a dataset, before its name and code are resolved.
#[derive(Debug)]
pub(crate) struct RawFeature<P> {
    pub(crate) properties: P,
    pub(crate) geometry: Result<MultiPolygon<f64>, String>,
}

impl<P: Properties> RawFeature<P> {
    /// Resolve the name/code aliases; a feature without a usable name or geometry is dropped.
    fn into_division(self) -> Result<DivisionPolygon, String> {
        let name = self.properties.first_of(&NAME_KEYS)
            .ok_or_else(|| format!("no name under any of {NAME_KEYS:?}"))?;
        let geometry = self.geometry.map_err(|e| format!("{name}: {e}"))?;
        Ok(DivisionPolygon::new(self.properties.first_of(&CODE_KEYS), name, geometry))
    }
}

/// Supported on-disk dataset formats, chosen by file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DatasetFormat {
    GeoJson,
    GeoJsonGz,
    Shapefile,
}

impl DatasetFormat {
    pub(crate) fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let file_name = path.file_name()
            .map(|name| name.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if file_name.ends_with(".gz") {
            Ok(Self::GeoJsonGz)
        } else if file_name.ends_with(".geojson") || file_name.ends_with(".json") {
            Ok(Self::GeoJson)
        } else if file_name.ends_with(".shp") {
            Ok(Self::Shapefile)
        } else {
            Err(DatasetError::UnsupportedFormat(path.display().to_string()))
        }
    }
}

/// Divisions that survived loading, plus how many features were dropped.
pub(crate) struct ReadOutcome {
    pub(crate) divisions: Vec<DivisionPolygon>,
    pub(crate) dropped: usize,
}

/// Read a dataset file into divisions, in feature order.
pub(crate) fn read_path(path: &Path) -> Result<ReadOutcome, DatasetError> {
    let io_err = |source| DatasetError::Io { path: path.to_path_buf(), source };

    match DatasetFormat::from_path(path)? {
        DatasetFormat::GeoJson => {
            let bytes = std::fs::read(path).map_err(io_err)?;
            read_geojson_bytes(&bytes)
        }
        DatasetFormat::GeoJsonGz => {
            let file = File::open(path).map_err(io_err)?;
            let mut bytes = Vec::new();
            GzDecoder::new(file).read_to_end(&mut bytes).map_err(io_err)?;
            read_geojson_bytes(&bytes)
        }
        DatasetFormat::Shapefile => Ok(collect(shp::read_features(path)?)),
    }
}

/// Read GeoJSON FeatureCollection bytes into divisions, in feature order.
pub(crate) fn read_geojson_bytes(bytes: &[u8]) -> Result<ReadOutcome, DatasetError> {
    Ok(collect(geojson::read_features(bytes)?))
}

fn collect<P: Properties>(features: Vec<RawFeature<P>>) -> ReadOutcome {
    let mut divisions = Vec::with_capacity(features.len());
    let mut dropped = 0;
    for (idx, feature) in features.into_iter().enumerate() {
        match feature.into_division() {
            Ok(division) => divisions.push(division),
            Err(reason) => {
                warn!(feature = idx, %reason, "dropping dataset feature");
                dropped += 1;
            }
        }
    }
    ReadOutcome { divisions, dropped }
}
