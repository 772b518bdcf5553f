use std::fmt;
use std::time::Duration;

use glam::DVec2;
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::game::deck::{Deck, SupplyId, SupplyTile};
use crate::game::events::{CameraRequest, DropRejection, GameEvent};
use crate::world::store::TileStore;
use crate::world::tile::{Colour, ORIGIN_COLOUR, Tile, TileError, TileId, TileKind};
use crate::world::topology::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamePhase {
    Menu,
    Playing,
    Paused,
    GameOver,
}

/// Something went wrong while resolving a touch. Never escapes
/// [`Game::on_touch`].
#[derive(Debug)]
enum TouchFault {
    NonFinitePosition(DVec2),
    Placement(TileError),
}

impl fmt::Display for TouchFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TouchFault::NonFinitePosition(p) => write!(f, "Touch at non-finite position {}", p),
            TouchFault::Placement(e) => write!(f, "Cannot place tile: {}", e),
        }
    }
}

impl From<TileError> for TouchFault {
    fn from(e: TileError) -> Self {
        TouchFault::Placement(e)
    }
}

/// Placement game: owns the tile map, the deck and the phase.
///
/// Camera changes are never applied here; they are emitted as
/// [`GameEvent::CameraRequested`] for whoever owns the viewport.
#[derive(Debug, Clone)]
pub struct Game {
    phase: GamePhase,
    store: TileStore,
    deck: Deck,
    pending_refill: usize,
    events: Vec<GameEvent>,
    focus_offset: f64,
    option_reveal_delay: Duration,
    refill_stagger: Duration,
    tap_to_place: bool,
}

impl Game {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            phase: GamePhase::Menu,
            store: TileStore::new(config.tile_pitch, config.tile_size),
            deck: Deck::new(config.deck_size, config.seed),
            pending_refill: 0,
            events: Vec::new(),
            focus_offset: config.focus_offset,
            option_reveal_delay: Duration::from_millis(config.option_reveal_delay_ms),
            refill_stagger: Duration::from_millis(config.refill_stagger_ms),
            tap_to_place: config.tap_to_place,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn store(&self) -> &TileStore {
        &self.store
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Refill emissions still owed to the deck.
    pub fn pending_refill(&self) -> usize {
        self.pending_refill
    }

    /// Drain events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            info!(from = ?self.phase, to = ?phase, "Phase changed");
            self.phase = phase;
            self.events.push(GameEvent::PhaseChanged { phase });
        }
    }

    // === Phases ===

    /// Reset everything and lay the origin tile.
    pub fn start_game(&mut self) {
        self.store.clear();
        self.deck.clear();
        self.pending_refill = 0;
        self.events.push(GameEvent::GameStarted);
        self.set_phase(GamePhase::Playing);

        let origin = match self.store.make_tile(
            DVec2::ZERO,
            TileKind::Normal,
            Colour::new(ORIGIN_COLOUR),
        ) {
            Ok(tile) => tile,
            Err(e) => {
                warn!(error = %e, "Cannot create origin tile");
                return;
            }
        };
        let ids = self.store.add_tiles(vec![origin]);
        self.events.push(GameEvent::TilesPlaced { ids: ids.clone() });
        if let Some(id) = ids.first() {
            self.focus_on_tile(id);
        }

        let count = self.deck.initialise().len();
        self.events.push(GameEvent::DeckInitialised { count });
        info!(deck = count, "Game started");
    }

    pub fn pause(&mut self) {
        if self.phase == GamePhase::Playing {
            self.set_phase(GamePhase::Paused);
        }
    }

    pub fn resume(&mut self) {
        if self.phase == GamePhase::Paused {
            self.set_phase(GamePhase::Playing);
        }
    }

    pub fn end_game(&mut self) {
        if matches!(self.phase, GamePhase::Playing | GamePhase::Paused) {
            self.set_phase(GamePhase::GameOver);
        }
    }

    /// Add persisted tiles to the map, e.g. an imported layout.
    pub fn import_tiles(&mut self, tiles: Vec<Tile>) -> Vec<TileId> {
        let ids = self.store.add_tiles(tiles);
        if !ids.is_empty() {
            self.events.push(GameEvent::TilesPlaced { ids: ids.clone() });
        }
        ids
    }

    // === Turn actions ===

    /// Centre the camera just below `id` and grow option tiles around it.
    pub fn focus_on_tile(&mut self, id: &TileId) {
        let Some(position) = self.store.tile_by_id(id).map(|t| t.position) else {
            debug!(tile = %id, "Focus requested for missing tile");
            return;
        };

        self.request_camera(position + DVec2::new(0.0, self.focus_offset));

        let ids = self.store.add_option_tiles(id, &Direction::GROWTH);
        if !ids.is_empty() {
            debug!(tile = %id, spawned = ids.len(), "Option tiles spawned");
            self.events.push(GameEvent::OptionTilesSpawned {
                ids,
                reveal_delay: self.option_reveal_delay,
            });
        }
    }

    fn request_camera(&mut self, world_target: DVec2) {
        self.events.push(GameEvent::CameraRequested(CameraRequest {
            world_target,
            scale: None,
        }));
    }

    /// Tap resolution in world space. Faults are logged and dropped.
    pub fn on_touch(&mut self, world: DVec2) {
        if self.phase != GamePhase::Playing {
            debug!(phase = ?self.phase, "Touch ignored outside play");
            return;
        }
        if let Err(fault) = self.try_touch(world) {
            warn!(error = %fault, "Touch handling failed");
        }
    }

    fn try_touch(&mut self, world: DVec2) -> Result<(), TouchFault> {
        if !world.is_finite() {
            return Err(TouchFault::NonFinitePosition(world));
        }

        let Some((id, position, kind)) = self
            .store
            .tile_at_position(world)
            .map(|t| (t.id.clone(), t.position, t.kind))
        else {
            return Ok(());
        };

        debug!(tile = %id, ?kind, "Touched tile");

        match kind {
            TileKind::Normal => self.request_camera(position),
            TileKind::Option if self.tap_to_place => {
                let colour = self.deck.random_colour();
                self.place_tile(position, colour)?;
            }
            TileKind::Option => {}
        }
        Ok(())
    }

    /// Toggle the selection under `world`.
    pub fn select_tile_at(&mut self, world: DVec2) -> Option<TileId> {
        let before = self.store.selected_id().cloned();
        let after = self.store.select_tile_at_position(world).map(|t| t.id.clone());
        if before != after {
            self.events.push(GameEvent::SelectionChanged {
                selected: after.clone(),
            });
        }
        after
    }

    /// Whether dropping onto `target` would be accepted.
    pub fn drag_over_allowed(&self, target: Option<&TileId>) -> bool {
        target
            .and_then(|id| self.store.tile_by_id(id))
            .is_some_and(Tile::is_option)
    }

    /// Commit a drop of a deck tile. Returns false (nothing changes) unless
    /// `target` is an option tile and `dropped` is still in the deck.
    pub fn drag_end(&mut self, dropped: SupplyId, target: Option<&TileId>) -> bool {
        let rejection = if self.phase != GamePhase::Playing {
            Some(DropRejection::NotPlaying)
        } else if target.is_none() {
            Some(DropRejection::NoTarget)
        } else if !self.drag_over_allowed(target) {
            Some(DropRejection::TargetNotOption)
        } else if !self.deck.contains(dropped) {
            Some(DropRejection::NotInDeck)
        } else {
            None
        };

        if let Some(reason) = rejection {
            debug!(tile = %dropped, ?reason, "Drop rejected");
            self.events.push(GameEvent::DropRejected { reason });
            return false;
        }

        let Some(position) = target
            .and_then(|id| self.store.tile_by_id(id))
            .map(|t| t.position)
        else {
            return false;
        };
        let Some(supply) = self.deck.remove(dropped) else {
            return false;
        };

        if let Err(e) = self.place_tile(position, supply.colour.clone()) {
            warn!(error = %e, "Placement failed, returning tile to deck");
            self.deck.insert(supply);
            return false;
        }

        if self.deck.is_empty() {
            // A batch still owed from an earlier refill stays owed.
            let batch = self.deck.batch_size();
            self.pending_refill += batch;
            debug!(batch, owed = self.pending_refill, "Deck refill scheduled");
            self.events.push(GameEvent::DeckRefillScheduled {
                count: batch,
                stagger: self.refill_stagger,
            });
        }
        info!(tile = %dropped, x = position.x, y = position.y, "Tile placed");
        true
    }

    /// Replace all option tiles with a normal tile at `position`.
    fn place_tile(&mut self, position: DVec2, colour: Colour) -> Result<TileId, TileError> {
        let tile = self.store.make_tile(position, TileKind::Normal, colour)?;

        let cleared = self.store.remove_tiles_of_kind(&[TileKind::Option]);
        self.events.push(GameEvent::OptionTilesCleared { count: cleared });

        let ids = self.store.add_tiles(vec![tile]);
        self.events.push(GameEvent::TilesPlaced { ids: ids.clone() });
        if let Some(id) = ids.first() {
            self.focus_on_tile(id);
        }
        Ok(TileId::from_position(position))
    }

    /// Mint and insert the next staggered refill tile, if one is owed.
    pub fn emit_next_refill(&mut self) -> Option<SupplyTile> {
        if self.pending_refill == 0 {
            return None;
        }
        let tile = self.deck.mint();
        let index = self.deck.insert(tile.clone());
        self.pending_refill -= 1;
        debug!(tile = %tile.id, index, remaining = self.pending_refill, "Deck tile arrived");
        self.events.push(GameEvent::DeckTileArrived {
            tile: tile.clone(),
            index,
        });
        Some(tile)
    }
}
