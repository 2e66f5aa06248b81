mod coord;
mod resolver;

pub use coord::Coordinate;
pub(crate) use coord::deserialize_location;
pub use resolver::{resolve, DivisionRef, PointResolver, Resolution, Via};
