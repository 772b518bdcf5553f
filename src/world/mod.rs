pub mod spatial;
pub mod statistics;
pub mod store;
pub mod tile;
pub mod topology;

pub use spatial::{BBox, SpatialIndex};
pub use statistics::MapStatistics;
pub use store::TileStore;
pub use tile::{Colour, Tile, TileError, TileId, TileKind};
pub use topology::Direction;
