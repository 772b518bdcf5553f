use std::collections::HashMap;

use glam::DVec2;
use rstar::{AABB, RStarInsertionStrategy, RTree, RTreeObject, RTreeParams};

use crate::world::tile::{Tile, TileId};

// === Bounding box ===

/// Axis-aligned box encoded `[min_x, min_y, max_x, max_y]`.
///
/// Y grows downward in both world and screen space; `min_y` is always the
/// top edge. Edges are inclusive, so touching boxes intersect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Box from a top-left corner and a size.
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Square of side `size` centred on `center`.
    pub fn around(center: DVec2, size: f64) -> Self {
        let half = size / 2.0;
        Self::new(center.x - half, center.y - half, center.x + half, center.y + half)
    }

    pub fn from_point(point: DVec2) -> Self {
        Self::new(point.x, point.y, point.x, point.y)
    }

    /// Box that intersects everything.
    pub fn unbounded() -> Self {
        Self::new(
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::INFINITY,
        )
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        other.min_x <= self.max_x
            && other.min_y <= self.max_y
            && other.max_x >= self.min_x
            && other.max_y >= self.min_y
    }

    pub fn extend(&mut self, other: &BBox) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

// === R-tree ===

/// Node fan-out matching the classic rbush default of 9.
#[derive(Debug, Clone, Copy)]
struct TileParams;

impl RTreeParams for TileParams {
    const MIN_SIZE: usize = 3;
    const MAX_SIZE: usize = 9;
    const REINSERTION_COUNT: usize = 2;
    type DefaultInsertionStrategy = RStarInsertionStrategy;
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    bbox: BBox,
    id: TileId,
}

impl RTreeObject for Entry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bbox.envelope()
    }
}

impl BBox {
    fn envelope(&self) -> AABB<[f64; 2]> {
        AABB::from_corners([self.min_x, self.min_y], [self.max_x, self.max_y])
    }
}

/// Bulk-loaded R-tree over tile footprints, keyed by tile id.
///
/// Built for full rebuilds: the store reloads the whole index after every
/// batch mutation instead of inserting tiles one at a time.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    tree: RTree<Entry, TileParams>,
    /// Footprint per id, so removal can locate the entry by envelope.
    bounds: HashMap<TileId, BBox>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self {
            tree: RTree::new_with_params(),
            bounds: HashMap::new(),
        }
    }

    /// Replace the index contents with a packed tree over `tiles`.
    pub fn load<'a, I>(&mut self, tiles: I)
    where
        I: IntoIterator<Item = &'a Tile>,
    {
        self.bounds = tiles
            .into_iter()
            .map(|t| (t.id.clone(), t.bbox()))
            .collect();
        let entries: Vec<Entry> = self
            .bounds
            .iter()
            .map(|(id, bbox)| Entry {
                bbox: *bbox,
                id: id.clone(),
            })
            .collect();
        self.tree = RTree::bulk_load_with_params(entries);
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new_with_params();
        self.bounds.clear();
    }

    /// Remove the entry for `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &TileId) -> bool {
        let Some(bbox) = self.bounds.remove(id) else {
            return false;
        };
        self.tree
            .remove(&Entry {
                bbox,
                id: id.clone(),
            })
            .is_some()
    }

    /// Ids of all tiles whose footprint intersects `query`. Order is unspecified.
    pub fn query_bbox(&self, query: &BBox) -> Vec<&TileId> {
        self.tree
            .locate_in_envelope_intersecting(&query.envelope())
            .map(|e| &e.id)
            .collect()
    }

    pub fn query_rect(&self, x: f64, y: f64, width: f64, height: f64) -> Vec<&TileId> {
        self.query_bbox(&BBox::from_rect(x, y, width, height))
    }

    pub fn query_point(&self, point: DVec2) -> Vec<&TileId> {
        self.query_bbox(&BBox::from_point(point))
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
