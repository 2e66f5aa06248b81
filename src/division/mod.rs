mod io;
mod polygon;
mod props;
mod store;

pub use polygon::DivisionPolygon;
pub use props::{CODE_KEYS, NAME_KEYS};
pub use store::{DirectoryEntry, LoadReport, PolygonStore};
