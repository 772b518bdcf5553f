use glam::DVec2;
use tracing::debug;

use crate::config::GameConfig;
use crate::game::deck::{SupplyId, SupplyTile};
use crate::game::events::GameEvent;
use crate::game::machine::{Game, GamePhase};
use crate::view::Viewport;
use crate::world::spatial::BBox;
use crate::world::tile::{Tile, TileId};

/// Where the presentation layer should animate a released deck tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropOutcome {
    /// Accepted; fly the tile to this screen point.
    Placed { screen_target: DVec2 },
    /// Rejected; return the tile to its deck slot.
    SnapBack,
}

/// Gesture-facing front of the game. Translates screen input into world
/// space, owns the viewport and forwards camera requests to it.
#[derive(Debug, Clone)]
pub struct Session {
    game: Game,
    viewport: Viewport,
    events: Vec<GameEvent>,
    dragging: Option<SupplyId>,
    drag_target: Option<TileId>,
    /// Cumulative pinch factor seen at the previous update.
    pinch_scale: Option<f64>,
    drag_probe_offset: f64,
    drag_probe_size: f64,
}

impl Session {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            game: Game::new(config),
            viewport: Viewport::with_scale_limits(
                config.screen_width,
                config.screen_height,
                config.min_scale,
                config.max_scale,
            ),
            events: Vec::new(),
            dragging: None,
            drag_target: None,
            pinch_scale: None,
            drag_probe_offset: config.drag_probe_offset,
            drag_probe_size: config.drag_probe_size,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn phase(&self) -> GamePhase {
        self.game.phase()
    }

    /// Drain events forwarded from the game since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Move game events into our queue, applying camera requests on the way.
    fn pump(&mut self) {
        for event in self.game.take_events() {
            if let GameEvent::CameraRequested(request) = &event {
                self.viewport.move_to_position(request.world_target, request.scale);
            }
            self.events.push(event);
        }
    }

    // === Lifecycle ===

    pub fn start_game(&mut self) {
        self.viewport.reset();
        self.dragging = None;
        self.drag_target = None;
        self.pinch_scale = None;
        self.game.start_game();
        self.pump();
    }

    pub fn pause(&mut self) {
        self.game.pause();
        self.pump();
    }

    pub fn resume(&mut self) {
        self.game.resume();
        self.pump();
    }

    pub fn end_game(&mut self) {
        self.game.end_game();
        self.pump();
    }

    pub fn import_tiles(&mut self, tiles: Vec<Tile>) -> Vec<TileId> {
        let ids = self.game.import_tiles(tiles);
        self.pump();
        ids
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.set_screen_size(width, height);
    }

    /// Jump the camera to its pending target, if any.
    pub fn settle_camera(&mut self) -> bool {
        self.viewport.settle()
    }

    /// Emit every owed refill tile at once. Returns how many arrived.
    pub fn flush_refill(&mut self) -> usize {
        let mut arrived = 0;
        while self.game.emit_next_refill().is_some() {
            arrived += 1;
        }
        self.pump();
        arrived
    }

    /// Emit a single refill tile; for callers running their own stagger timer.
    pub fn emit_next_refill(&mut self) -> Option<SupplyTile> {
        let tile = self.game.emit_next_refill();
        self.pump();
        tile
    }

    // === Inbound gestures ===

    pub fn on_pan_change(&mut self, delta_screen: DVec2) {
        self.viewport.pan(delta_screen);
    }

    pub fn on_tap_end(&mut self, screen: DVec2) {
        if self.dragging.is_some() {
            debug!("Tap ignored during drag");
            return;
        }
        let world = self.viewport.screen_to_world(screen);
        self.game.on_touch(world);
        self.pump();
    }

    /// Toggle the selection under a screen point.
    pub fn select_at(&mut self, screen: DVec2) -> Option<TileId> {
        let world = self.viewport.screen_to_world(screen);
        let selected = self.game.select_tile_at(world);
        self.pump();
        selected
    }

    pub fn on_pinch_start(&mut self) {
        self.pinch_scale = Some(1.0);
    }

    /// `cumulative` is the total scale since the pinch began.
    pub fn on_pinch_update(&mut self, focal_screen: DVec2, cumulative: f64) {
        if !cumulative.is_finite() || cumulative <= 0.0 {
            debug!(cumulative, "Ignoring invalid pinch factor");
            return;
        }
        let previous = self.pinch_scale.unwrap_or(1.0);
        if self.viewport.zoom_on_point(focal_screen, cumulative / previous) {
            self.pinch_scale = Some(cumulative);
        }
    }

    pub fn on_pinch_end(&mut self) {
        self.pinch_scale = None;
    }

    /// Begin dragging a deck tile. Returns false if the tile cannot be dragged.
    pub fn on_drag_start(&mut self, id: SupplyId) -> bool {
        if self.game.phase() != GamePhase::Playing || !self.game.deck().contains(id) {
            debug!(tile = %id, "Drag start refused");
            return false;
        }
        self.dragging = Some(id);
        self.drag_target = None;
        true
    }

    /// Update the live drop target from a finger sample.
    pub fn on_drag_sample(&mut self, screen: DVec2) -> Option<&Tile> {
        self.dragging?;
        let world = self
            .viewport
            .screen_to_world(screen + DVec2::splat(self.drag_probe_offset));
        let probe = BBox::from_rect(world.x, world.y, self.drag_probe_size, self.drag_probe_size);

        let hits = self.game.store().visible_tiles(&probe);
        let hit = hits
            .iter()
            .find(|t| t.is_option())
            .or_else(|| hits.first())
            .map(|t| t.id.clone());
        self.drag_target = hit;
        self.current_drag_target()
    }

    /// Release the dragged tile over the current target.
    pub fn on_drag_end(&mut self) -> DropOutcome {
        let Some(id) = self.dragging.take() else {
            return DropOutcome::SnapBack;
        };
        let target = self.drag_target.take();
        let target_position = target
            .as_ref()
            .and_then(|t| self.game.store().tile_by_id(t))
            .map(|t| t.position);

        let placed = self.game.drag_end(id, target.as_ref());
        self.pump();

        match (placed, target_position) {
            (true, Some(position)) => DropOutcome::Placed {
                screen_target: self.viewport.world_to_screen(position),
            },
            _ => DropOutcome::SnapBack,
        }
    }

    /// Abandon the drag with no target.
    pub fn on_drag_cancel(&mut self) {
        if let Some(id) = self.dragging.take() {
            self.drag_target = None;
            self.game.drag_end(id, None);
            self.pump();
        }
    }

    // === Outbound queries ===

    /// Tiles inside the visible world box.
    pub fn visible_tiles(&self) -> Vec<&Tile> {
        self.game
            .store()
            .visible_tiles(&self.viewport.visible_world_bbox())
    }

    pub fn selected_tile(&self) -> Option<&Tile> {
        self.game.store().selected_tile()
    }

    pub fn deck_tiles(&self) -> &[SupplyTile] {
        self.game.deck().tiles()
    }

    pub fn dragging(&self) -> Option<SupplyId> {
        self.dragging
    }

    pub fn current_drag_target(&self) -> Option<&Tile> {
        self.drag_target
            .as_ref()
            .and_then(|id| self.game.store().tile_by_id(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tile::TileKind;

    fn session() -> Session {
        let config = GameConfig {
            seed: 11,
            ..GameConfig::default()
        };
        let mut s = Session::new(&config);
        s.start_game();
        s.settle_camera();
        s
    }

    fn assert_close(a: DVec2, b: DVec2) {
        assert!(a.abs_diff_eq(b, 1e-9), "expected {:?}, got {:?}", b, a);
    }

    #[test]
    fn start_game_centres_below_origin() {
        let s = session();
        assert_eq!(s.phase(), GamePhase::Playing);
        assert_close(s.viewport().camera_position(), DVec2::new(0.0, 100.0));
        assert_eq!(s.viewport().scale(), 1.0);
        // Screen 400x800 at scale 1 sees all four starting tiles.
        assert_eq!(s.visible_tiles().len(), 4);
        assert_eq!(s.deck_tiles().len(), 5);
    }

    #[test]
    fn restart_resets_panned_camera() {
        let mut s = session();
        s.on_pan_change(DVec2::new(300.0, 0.0));
        s.start_game();
        assert_close(s.viewport().camera_position(), DVec2::ZERO);
        assert!(s.settle_camera());
        assert_close(s.viewport().camera_position(), DVec2::new(0.0, 100.0));
    }

    #[test]
    fn tap_on_normal_tile_moves_camera_target() {
        let mut s = session();
        s.take_events();
        // Screen (200, 300) maps to world (0, 0) with the camera at (0, 100).
        s.on_tap_end(DVec2::new(200.0, 300.0));
        let target = s.viewport().target().unwrap();
        assert_close(target.camera_position, DVec2::ZERO);
        assert!(
            s.take_events()
                .iter()
                .any(|e| matches!(e, GameEvent::CameraRequested(_)))
        );
    }

    #[test]
    fn pan_cancels_pending_camera_target() {
        let mut s = session();
        s.on_tap_end(DVec2::new(200.0, 300.0));
        assert!(s.viewport().target().is_some());
        s.on_pan_change(DVec2::new(10.0, 0.0));
        assert!(s.viewport().target().is_none());
    }

    #[test]
    fn drag_sample_finds_option_tile() {
        let mut s = session();
        let id = s.deck_tiles()[0].id;
        assert!(s.on_drag_start(id));

        // Probe lands at world (0, 100), inside the south option tile.
        let target = s.on_drag_sample(DVec2::new(150.0, 350.0)).unwrap();
        assert_eq!(target.id.as_str(), "0,100");
        assert_eq!(target.kind, TileKind::Option);

        // Far away: no target.
        assert!(s.on_drag_sample(DVec2::new(-2000.0, -2000.0)).is_none());
        assert!(s.current_drag_target().is_none());
    }

    #[test]
    fn drag_sample_without_drag_is_ignored() {
        let mut s = session();
        assert!(s.on_drag_sample(DVec2::new(150.0, 350.0)).is_none());
    }

    #[test]
    fn drop_on_option_returns_screen_target() {
        let mut s = session();
        let dropped = s.deck_tiles()[0].clone();
        s.on_drag_start(dropped.id);
        s.on_drag_sample(DVec2::new(150.0, 350.0));

        let outcome = s.on_drag_end();
        assert_eq!(
            outcome,
            DropOutcome::Placed {
                screen_target: DVec2::new(200.0, 400.0)
            }
        );
        let placed = s.game().store().tile(DVec2::new(0.0, 100.0)).unwrap();
        assert_eq!(placed.kind, TileKind::Normal);
        assert_eq!(placed.colour, dropped.colour);
        assert!(s.dragging().is_none());
        assert!(s.current_drag_target().is_none());

        // Camera heads below the new tile.
        assert!(s.settle_camera());
        assert_close(s.viewport().camera_position(), DVec2::new(0.0, 200.0));
    }

    #[test]
    fn drop_on_nothing_snaps_back() {
        let mut s = session();
        let id = s.deck_tiles()[0].id;
        s.on_drag_start(id);
        s.on_drag_sample(DVec2::new(-2000.0, -2000.0));
        assert_eq!(s.on_drag_end(), DropOutcome::SnapBack);
        assert_eq!(s.deck_tiles().len(), 5);
        assert_eq!(s.game().store().len(), 4);
    }

    #[test]
    fn drop_on_normal_tile_snaps_back() {
        let mut s = session();
        let id = s.deck_tiles()[0].id;
        s.on_drag_start(id);
        // Probe lands at world (0, 0), the origin tile.
        let target = s.on_drag_sample(DVec2::new(150.0, 250.0)).unwrap();
        assert_eq!(target.kind, TileKind::Normal);
        assert_eq!(s.on_drag_end(), DropOutcome::SnapBack);
        assert_eq!(s.game().store().len(), 4);
    }

    #[test]
    fn cancelled_drag_records_rejection() {
        let mut s = session();
        s.take_events();
        let id = s.deck_tiles()[0].id;
        s.on_drag_start(id);
        s.on_drag_cancel();
        assert!(s.dragging().is_none());
        assert!(
            s.take_events()
                .iter()
                .any(|e| matches!(e, GameEvent::DropRejected { .. }))
        );
    }

    #[test]
    fn taps_ignored_while_dragging() {
        let mut s = session();
        s.take_events();
        let id = s.deck_tiles()[0].id;
        s.on_drag_start(id);
        s.on_tap_end(DVec2::new(200.0, 300.0));
        assert!(s.viewport().target().is_none());
        assert!(s.take_events().is_empty());
    }

    #[test]
    fn drag_start_requires_deck_tile_and_play() {
        let mut s = session();
        assert!(!s.on_drag_start(SupplyId(999)));
        s.pause();
        let id = s.deck_tiles()[0].id;
        assert!(!s.on_drag_start(id));
    }

    #[test]
    fn pinch_converts_cumulative_to_incremental() {
        let mut s = session();
        let centre = DVec2::new(200.0, 400.0);
        s.on_pinch_start();
        s.on_pinch_update(centre, 1.5);
        assert!((s.viewport().scale() - 1.5).abs() < 1e-9);
        s.on_pinch_update(centre, 2.0);
        assert!((s.viewport().scale() - 2.0).abs() < 1e-9);
        s.on_pinch_update(centre, f64::NAN);
        s.on_pinch_update(centre, 0.0);
        assert!((s.viewport().scale() - 2.0).abs() < 1e-9);
        s.on_pinch_end();

        // A new pinch starts from the current scale.
        s.on_pinch_start();
        s.on_pinch_update(centre, 0.5);
        assert!((s.viewport().scale() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn pinch_keeps_focal_world_point_fixed() {
        let mut s = session();
        let focal = DVec2::new(120.0, 650.0);
        let before = s.viewport().screen_to_world(focal);
        s.on_pinch_start();
        s.on_pinch_update(focal, 3.0);
        assert_close(s.viewport().world_to_screen(before), focal);
    }

    #[test]
    fn select_at_screen_point() {
        let mut s = session();
        let selected = s.select_at(DVec2::new(200.0, 300.0));
        assert_eq!(selected.unwrap().as_str(), "0,0");
        assert_eq!(s.selected_tile().unwrap().id.as_str(), "0,0");
    }

    #[test]
    fn flush_refill_restores_full_deck() {
        let mut s = session();
        for _ in 0..5 {
            let id = s.deck_tiles()[0].id;
            let target = s
                .game()
                .store()
                .tiles_of_kind(TileKind::Option)
                .first()
                .map(|t| t.id.clone());
            assert!(s.game.drag_end(id, target.as_ref()));
        }
        assert!(s.deck_tiles().is_empty());
        assert_eq!(s.flush_refill(), 5);
        assert_eq!(s.deck_tiles().len(), 5);
        assert_eq!(s.flush_refill(), 0);
    }
}
