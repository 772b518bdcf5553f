use std::collections::HashMap;

use glam::DVec2;
use tracing::debug;

use crate::world::spatial::{BBox, SpatialIndex};
use crate::world::tile::{Colour, Tile, TileError, TileId, TileKind};
use crate::world::topology::{Direction, neighbor_position, neighbor_positions};

/// Side of the probe box used to resolve taps.
const TAP_PROBE_SIZE: f64 = 1.0;

/// Canonical tile collection with adjacency and a derived spatial index.
///
/// Every mutation rebuilds the index and the adjacency lists synchronously,
/// so queries always observe the latest change.
#[derive(Debug, Clone)]
pub struct TileStore {
    tiles: HashMap<TileId, Tile>,
    index: SpatialIndex,
    selected: Option<TileId>,
    pitch: f64,
    tile_size: f64,
}

impl TileStore {
    pub fn new(pitch: f64, tile_size: f64) -> Self {
        Self {
            tiles: HashMap::new(),
            index: SpatialIndex::new(),
            selected: None,
            pitch,
            tile_size,
        }
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Build a tile sized and aligned for this store.
    pub fn make_tile(
        &self,
        position: DVec2,
        kind: TileKind,
        colour: Colour,
    ) -> Result<Tile, TileError> {
        Tile::new(position, kind, colour, self.tile_size, self.pitch)
    }

    // === Mutation ===

    /// Insert a batch of tiles, overwriting any tile already at the same
    /// position. Returns the ids in insertion order.
    pub fn add_tiles(&mut self, tiles: Vec<Tile>) -> Vec<TileId> {
        let mut ids = Vec::with_capacity(tiles.len());
        for mut tile in tiles {
            // Ids are positional; recompute in case the caller moved the tile.
            tile.id = TileId::from_position(tile.position);
            tile.adjacent.clear();
            if self.selected.as_ref() == Some(&tile.id) {
                self.selected = None;
            }
            if tile.selected {
                self.deselect_current();
                self.selected = Some(tile.id.clone());
            }
            ids.push(tile.id.clone());
            self.tiles.insert(tile.id.clone(), tile);
        }
        self.rebuild();
        debug!(added = ids.len(), total = self.tiles.len(), "Tiles added");
        ids
    }

    /// Remove every tile whose kind is in `kinds`. Returns the removed count.
    pub fn remove_tiles_of_kind(&mut self, kinds: &[TileKind]) -> usize {
        let doomed: Vec<TileId> = self
            .tiles
            .values()
            .filter(|t| kinds.contains(&t.kind))
            .map(|t| t.id.clone())
            .collect();

        for id in &doomed {
            self.tiles.remove(id);
            self.index.remove(id);
            if self.selected.as_ref() == Some(id) {
                self.selected = None;
            }
        }
        if !doomed.is_empty() {
            self.rebuild_adjacency();
        }
        debug!(removed = doomed.len(), total = self.tiles.len(), "Tiles removed");
        doomed.len()
    }

    /// Spawn option tiles next to `origin` in each direction whose cell is
    /// free. An empty `directions` slice means all four. Existing tiles are
    /// never overwritten. Returns the ids of the new option tiles.
    pub fn add_option_tiles(&mut self, origin: &TileId, directions: &[Direction]) -> Vec<TileId> {
        let Some(origin_position) = self.tiles.get(origin).map(|t| t.position) else {
            debug!(origin = %origin, "Option tiles requested for missing tile");
            return Vec::new();
        };

        let directions = if directions.is_empty() {
            &Direction::ALL[..]
        } else {
            directions
        };

        let mut spawned = Vec::new();
        for &direction in directions {
            let position = neighbor_position(origin_position, direction, self.pitch);
            if self.tiles.contains_key(&TileId::from_position(position)) {
                continue;
            }
            // Neighbors of an aligned tile are aligned.
            if let Ok(tile) = self.make_tile(position, TileKind::Option, Colour::new("")) {
                if !spawned.iter().any(|t: &Tile| t.id == tile.id) {
                    spawned.push(tile);
                }
            }
        }

        if spawned.is_empty() {
            return Vec::new();
        }
        self.add_tiles(spawned)
    }

    /// Drop all tiles and the selection.
    pub fn clear(&mut self) {
        self.tiles.clear();
        self.index.clear();
        self.selected = None;
    }

    // === Selection ===

    /// Toggle selection of the tile under `position`, clearing any other
    /// selected tile. Tapping empty space clears the selection.
    pub fn select_tile_at_position(&mut self, position: DVec2) -> Option<&Tile> {
        let hit = self.tile_at_position(position).map(|t| t.id.clone());

        match hit {
            Some(id) => {
                if self.selected.as_ref() != Some(&id) {
                    self.deselect_current();
                }
                let now_selected = match self.tiles.get_mut(&id) {
                    Some(tile) => {
                        tile.selected = !tile.selected;
                        tile.selected
                    }
                    None => false,
                };
                self.selected = now_selected.then_some(id);
            }
            None => self.deselect_current(),
        }
        self.selected_tile()
    }

    pub fn clear_selection(&mut self) {
        self.deselect_current();
    }

    fn deselect_current(&mut self) {
        if let Some(id) = self.selected.take() {
            if let Some(tile) = self.tiles.get_mut(&id) {
                tile.selected = false;
            }
        }
    }

    pub fn selected_id(&self) -> Option<&TileId> {
        self.selected.as_ref()
    }

    pub fn selected_tile(&self) -> Option<&Tile> {
        self.selected.as_ref().and_then(|id| self.tiles.get(id))
    }

    // === Queries ===

    pub fn tile(&self, position: DVec2) -> Option<&Tile> {
        if !position.is_finite() {
            return None;
        }
        self.tiles.get(&TileId::from_position(position))
    }

    pub fn tile_by_id(&self, id: &TileId) -> Option<&Tile> {
        self.tiles.get(id)
    }

    /// Tiles whose footprint intersects `bbox`, in unspecified order.
    pub fn visible_tiles(&self, bbox: &BBox) -> Vec<&Tile> {
        self.index
            .query_bbox(bbox)
            .into_iter()
            .filter_map(|id| self.tiles.get(id))
            .collect()
    }

    /// First tile under a unit probe centred on `position`.
    pub fn tile_at_position(&self, position: DVec2) -> Option<&Tile> {
        if !position.is_finite() {
            return None;
        }
        self.visible_tiles(&BBox::around(position, TAP_PROBE_SIZE))
            .into_iter()
            .next()
    }

    /// Every tile, sorted by id.
    pub fn all_tiles(&self) -> Vec<&Tile> {
        let mut tiles: Vec<&Tile> = self.tiles.values().collect();
        tiles.sort_by(|a, b| a.id.cmp(&b.id));
        tiles
    }

    pub fn tiles_of_kind(&self, kind: TileKind) -> Vec<&Tile> {
        let mut tiles: Vec<&Tile> = self.tiles.values().filter(|t| t.kind == kind).collect();
        tiles.sort_by(|a, b| a.id.cmp(&b.id));
        tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    // === Derived state ===

    fn rebuild(&mut self) {
        self.index.load(self.tiles.values());
        self.rebuild_adjacency();
    }

    /// Recompute every adjacency list from scratch.
    fn rebuild_adjacency(&mut self) {
        let links: Vec<(TileId, Vec<TileId>)> = self
            .tiles
            .values()
            .map(|tile| {
                let adjacent = neighbor_positions(tile.position, self.pitch)
                    .into_iter()
                    .map(TileId::from_position)
                    .filter(|id| self.tiles.contains_key(id))
                    .collect();
                (tile.id.clone(), adjacent)
            })
            .collect();

        for (id, adjacent) in links {
            if let Some(tile) = self.tiles.get_mut(&id) {
                tile.adjacent = adjacent;
            }
        }
    }
}
