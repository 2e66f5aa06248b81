use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex, OnceLock, PoisonError},
    time::Instant,
};

use ahash::AHashMap;
use geo::{Coord, Rect};
use serde::Serialize;
use tracing::{debug, info};

use crate::division::{io, polygon::DivisionPolygon};
use crate::error::DatasetError;
use crate::geom::Geometries;
use crate::normalize::normalize;

/// Outcome counts of a dataset load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub dropped: usize,
}

/// One row of the division selection list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub code: Option<String>,
    pub name: String,
}

/// The immutable division dataset, with a bounding-box index and name/code lookups.
///
/// Safe to share across threads; nothing mutates it after construction.
#[derive(Debug)]
pub struct PolygonStore {
    geoms: Geometries<DivisionPolygon>,
    by_key: AHashMap<String, usize>,        // normalized name -> first division with it
    by_code: AHashMap<String, usize>,       // exact code -> first division with it
    by_code_lower: AHashMap<String, usize>, // lower-cased code -> first division with it
    report: LoadReport,
}

/// Process-wide cache of stores loaded from disk, keyed by canonical path.
fn cache() -> &'static Mutex<AHashMap<PathBuf, Arc<PolygonStore>>> {
    static CACHE: OnceLock<Mutex<AHashMap<PathBuf, Arc<PolygonStore>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(AHashMap::new()))
}

impl PolygonStore {
    /// Load the dataset at `path`, once per process.
    ///
    /// Later calls for the same file return the cached store without re-parsing.
    /// Format is chosen by extension: `.geojson`/`.json`, gzipped `.gz`, or `.shp`.
    pub fn load(path: impl AsRef<Path>) -> Result<Arc<Self>, DatasetError> {
        let path = path.as_ref();
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        // Held across the parse so concurrent first loads parse once.
        let mut cache = cache().lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(store) = cache.get(&key) {
            debug!(path = %key.display(), "dataset cache hit");
            return Ok(Arc::clone(store));
        }

        let started = Instant::now();
        let outcome = io::read_path(path)?;
        let store = Arc::new(Self::build(outcome.divisions, outcome.dropped)?);
        info!(
            path = %key.display(),
            loaded = store.report.loaded,
            dropped = store.report.dropped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded division dataset",
        );

        cache.insert(key, Arc::clone(&store));
        Ok(store)
    }

    /// Build a store from GeoJSON FeatureCollection bytes (uncached).
    pub fn from_geojson_bytes(bytes: &[u8]) -> Result<Self, DatasetError> {
        let outcome = io::read_geojson_bytes(bytes)?;
        Self::build(outcome.divisions, outcome.dropped)
    }

    /// Build a store from a GeoJSON FeatureCollection string (uncached).
    pub fn from_geojson_str(text: &str) -> Result<Self, DatasetError> {
        Self::from_geojson_bytes(text.as_bytes())
    }

    /// Build a store from divisions already in memory, keeping their order.
    pub fn from_divisions(divisions: Vec<DivisionPolygon>) -> Result<Self, DatasetError> {
        Self::build(divisions, 0)
    }

    fn build(divisions: Vec<DivisionPolygon>, dropped: usize) -> Result<Self, DatasetError> {
        if divisions.is_empty() {
            return Err(DatasetError::Empty { dropped });
        }

        let mut by_key = AHashMap::with_capacity(divisions.len());
        let mut by_code = AHashMap::with_capacity(divisions.len());
        let mut by_code_lower = AHashMap::with_capacity(divisions.len());
        for (idx, division) in divisions.iter().enumerate() {
            by_key.entry(division.key().to_string()).or_insert(idx);
            if let Some(code) = division.code() {
                by_code.entry(code.to_string()).or_insert(idx);
                by_code_lower.entry(code.to_ascii_lowercase()).or_insert(idx);
            }
        }

        Ok(Self {
            report: LoadReport { loaded: divisions.len(), dropped },
            geoms: Geometries::new(divisions),
            by_key,
            by_code,
            by_code_lower,
        })
    }

    /// Get the number of divisions.
    #[inline] pub fn len(&self) -> usize { self.geoms.len() }

    /// A loaded store always holds at least one division.
    #[inline] pub fn is_empty(&self) -> bool { self.geoms.len() == 0 }

    /// Get the load outcome counts.
    #[inline] pub fn report(&self) -> LoadReport { self.report }

    /// Iterate divisions in stable enumeration (dataset) order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, DivisionPolygon> { self.geoms.items().iter() }

    /// Get the division at enumeration position `idx`.
    #[inline] pub fn get(&self, idx: usize) -> Option<&DivisionPolygon> { self.geoms.items().get(idx) }

    /// Compute the bounding rectangle of the whole dataset.
    #[inline] pub fn bounds(&self) -> Option<Rect<f64>> { self.geoms.bounds() }

    /// First division (in enumeration order) whose name normalizes to the same key as `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&DivisionPolygon> {
        self.by_key.get(&normalize(name)).and_then(|&idx| self.get(idx))
    }

    /// First division with exactly this code, falling back to an ASCII case-insensitive match.
    pub fn find_by_code(&self, code: &str) -> Option<&DivisionPolygon> {
        let code = code.trim();
        self.by_code.get(code)
            .or_else(|| self.by_code_lower.get(&code.to_ascii_lowercase()))
            .and_then(|&idx| self.get(idx))
    }

    /// Unique divisions by normalized name (first occurrence wins), sorted by that name.
    pub fn directory(&self) -> Vec<DirectoryEntry> {
        let mut entries: Vec<(&str, DirectoryEntry)> = self.by_key.iter()
            .filter_map(|(key, &idx)| self.get(idx).map(|d| (key.as_str(), DirectoryEntry {
                code: d.code().map(str::to_string),
                name: d.name().to_string(),
            })))
            .collect();
        entries.sort_by(|(ka, a), (kb, b)| ka.cmp(kb).then_with(|| a.name.cmp(&b.name)));
        entries.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Enumeration index of the first division containing `coord` (lng/lat), via the index.
    #[inline]
    pub(crate) fn locate(&self, coord: Coord<f64>) -> Option<usize> { self.geoms.locate(coord) }

    /// Same as [`PolygonStore::locate`] but by exhaustive scan.
    #[inline]
    pub(crate) fn locate_linear(&self, coord: Coord<f64>) -> Option<usize> { self.geoms.locate_linear(coord) }
}

impl<'a> IntoIterator for &'a PolygonStore {
    type Item = &'a DivisionPolygon;
    type IntoIter = std::slice::Iter<'a, DivisionPolygon>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

#[cfg(test)]
mod tests {
    use geo::{polygon, MultiPolygon};

    use super::PolygonStore;
    use crate::division::polygon::DivisionPolygon;
    use crate::error::DatasetError;

    fn unit(code: Option<&str>, name: &str, x0: f64) -> DivisionPolygon {
        let shape = MultiPolygon(vec![polygon![
            (x: x0, y: 0.0), (x: x0 + 1.0, y: 0.0), (x: x0 + 1.0, y: 1.0), (x: x0, y: 1.0), (x: x0, y: 0.0),
        ]]);
        DivisionPolygon::new(code.map(str::to_string), name, shape)
    }

    #[test]
    fn empty_store_is_an_error() {
        assert!(matches!(PolygonStore::from_divisions(vec![]), Err(DatasetError::Empty { dropped: 0 })));
    }

    #[test]
    fn lookups_prefer_first_occurrence() {
        let store = PolygonStore::from_divisions(vec![
            unit(Some("K-1"), "Kandy North", 0.0),
            unit(Some("K-2"), "KANDY  north", 1.0),
            unit(None, "Galle", 2.0),
        ]).unwrap();

        assert_eq!(store.find_by_name(" kandy NORTH ").and_then(|d| d.code()), Some("K-1"));
        assert_eq!(store.find_by_code("K-2").map(|d| d.name()), Some("KANDY  north"));
        assert_eq!(store.find_by_code("k-2").map(|d| d.name()), Some("KANDY  north"));
        assert!(store.find_by_code("K-9").is_none());
        assert!(store.find_by_name("Matara").is_none());
    }

    #[test]
    fn directory_is_unique_and_sorted() {
        let store = PolygonStore::from_divisions(vec![
            unit(Some("M"), "Matara", 0.0),
            unit(Some("K-1"), "Kandy North", 1.0),
            unit(Some("K-2"), "kandy north", 2.0),
            unit(None, "Galle", 3.0),
        ]).unwrap();

        let names: Vec<_> = store.directory().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["Galle", "Kandy North", "Matara"]);
    }

    #[test]
    fn iteration_keeps_dataset_order() {
        let store = PolygonStore::from_divisions(vec![
            unit(None, "b", 0.0),
            unit(None, "a", 1.0),
        ]).unwrap();
        let names: Vec<_> = store.iter().map(DivisionPolygon::name).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!((&store).into_iter().count(), store.len());
    }
}
