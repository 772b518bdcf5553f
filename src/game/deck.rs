use std::fmt;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::world::tile::Colour;

/// Identity of a supply tile. Minted from a counter that never goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SupplyId(pub u64);

impl fmt::Display for SupplyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "supply-{}", self.0)
    }
}

/// A tile waiting in the deck. It has no position until it is placed.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplyTile {
    pub id: SupplyId,
    pub colour: Colour,
}

/// Ordered supply of tiles offered to the player.
#[derive(Debug, Clone)]
pub struct Deck {
    tiles: Vec<SupplyTile>,
    next_id: u64,
    batch_size: usize,
    rng: ChaCha8Rng,
}

impl Deck {
    /// `seed == 0` picks a random seed.
    pub fn new(batch_size: usize, seed: u64) -> Self {
        let seed = if seed == 0 {
            rand::thread_rng().r#gen()
        } else {
            seed
        };
        Self {
            tiles: Vec::with_capacity(batch_size),
            next_id: 0,
            batch_size,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Replace the contents with a fresh batch.
    pub fn initialise(&mut self) -> &[SupplyTile] {
        self.tiles.clear();
        for _ in 0..self.batch_size {
            let tile = self.mint();
            self.tiles.push(tile);
        }
        debug!(count = self.tiles.len(), "Deck initialised");
        &self.tiles
    }

    /// New tile with the next id and a palette colour. Not inserted.
    pub fn mint(&mut self) -> SupplyTile {
        let id = SupplyId(self.next_id);
        self.next_id += 1;
        SupplyTile {
            id,
            colour: Colour::random(&mut self.rng),
        }
    }

    /// Draw a palette colour from the deck's generator.
    pub fn random_colour(&mut self) -> Colour {
        Colour::random(&mut self.rng)
    }

    /// Remove by id, keeping the order of the rest.
    pub fn remove(&mut self, id: SupplyId) -> Option<SupplyTile> {
        let index = self.tiles.iter().position(|t| t.id == id)?;
        Some(self.tiles.remove(index))
    }

    /// Insert at the middle of the deck. Returns the index used.
    pub fn insert(&mut self, tile: SupplyTile) -> usize {
        let index = self.tiles.len() / 2;
        self.tiles.insert(index, tile);
        index
    }

    pub fn get(&self, id: SupplyId) -> Option<&SupplyTile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: SupplyId) -> bool {
        self.get(id).is_some()
    }

    pub fn tiles(&self) -> &[SupplyTile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Empty the deck. Ids keep counting up.
    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}
