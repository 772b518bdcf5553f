use std::time::Duration;

use glam::DVec2;

use crate::game::deck::SupplyTile;
use crate::game::machine::GamePhase;
use crate::world::tile::TileId;

/// Camera move requested by the game. The owner of the viewport decides
/// when the camera gets there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRequest {
    /// World point to centre on screen.
    pub world_target: DVec2,
    /// Target scale; `None` keeps the current one.
    pub scale: Option<f64>,
}

/// Discrete outcomes of game transitions, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    GameStarted,
    PhaseChanged { phase: GamePhase },
    CameraRequested(CameraRequest),
    TilesPlaced { ids: Vec<TileId> },
    /// Option tiles are already in the map; `reveal_delay` tells the
    /// presentation layer how long to hold them back.
    OptionTilesSpawned { ids: Vec<TileId>, reveal_delay: Duration },
    OptionTilesCleared { count: usize },
    SelectionChanged { selected: Option<TileId> },
    DeckInitialised { count: usize },
    /// `count` tiles will arrive one per `stagger`.
    DeckRefillScheduled { count: usize, stagger: Duration },
    DeckTileArrived { tile: SupplyTile, index: usize },
    DropRejected { reason: DropRejection },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropRejection {
    NoTarget,
    TargetNotOption,
    NotInDeck,
    NotPlaying,
}
