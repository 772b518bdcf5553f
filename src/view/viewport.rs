use glam::{DAffine2, DVec2};
use tracing::debug;

use crate::world::spatial::BBox;

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 5.0;

/// Destination camera state. How the camera travels there is up to the
/// presentation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTarget {
    /// Camera position in scaled (camera) space.
    pub camera_position: DVec2,
    pub scale: f64,
}

/// Camera state and the screen <-> world transform derived from it.
///
/// `camera_position` lives in scaled space: a world point `w` is centred on
/// screen when `camera_position == w * scale`.
#[derive(Debug, Clone)]
pub struct Viewport {
    camera_position: DVec2,
    scale: f64,
    screen_size: DVec2,
    min_scale: f64,
    max_scale: f64,
    target: Option<CameraTarget>,
}

impl Viewport {
    pub fn new(screen_width: f64, screen_height: f64) -> Self {
        Self::with_scale_limits(screen_width, screen_height, MIN_SCALE, MAX_SCALE)
    }

    pub fn with_scale_limits(
        screen_width: f64,
        screen_height: f64,
        min_scale: f64,
        max_scale: f64,
    ) -> Self {
        Self {
            camera_position: DVec2::ZERO,
            scale: 1.0_f64.max(min_scale).min(max_scale),
            screen_size: DVec2::new(screen_width, screen_height),
            min_scale,
            max_scale,
            target: None,
        }
    }

    pub fn camera_position(&self) -> DVec2 {
        self.camera_position
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn screen_size(&self) -> DVec2 {
        self.screen_size
    }

    pub fn set_screen_size(&mut self, width: f64, height: f64) {
        self.screen_size = DVec2::new(width, height);
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        if scale.is_finite() {
            scale.max(self.min_scale).min(self.max_scale)
        } else {
            self.scale
        }
    }

    /// Jump straight to a camera state, dropping any pending target.
    pub fn set_position(&mut self, camera_position: DVec2, scale: f64) {
        if camera_position.is_finite() {
            self.camera_position = camera_position;
        }
        self.scale = self.clamp_scale(scale);
        self.target = None;
    }

    /// Back to the origin at scale 1.
    pub fn reset(&mut self) {
        self.set_position(DVec2::ZERO, 1.0);
    }

    // === Matrices ===

    /// World -> screen: translate(screen / 2) * translate(-camera) * scale.
    pub fn forward_matrix(&self) -> DAffine2 {
        DAffine2::from_translation(self.screen_size / 2.0)
            * DAffine2::from_translation(-self.camera_position)
            * DAffine2::from_scale(DVec2::splat(self.scale))
    }

    /// Screen -> world: the forward factors inverted in reverse order.
    pub fn inverse_matrix(&self) -> DAffine2 {
        DAffine2::from_scale(DVec2::splat(1.0 / self.scale))
            * DAffine2::from_translation(self.camera_position)
            * DAffine2::from_translation(-self.screen_size / 2.0)
    }

    pub fn world_to_screen(&self, world: DVec2) -> DVec2 {
        self.forward_matrix().transform_point2(world)
    }

    pub fn screen_to_world(&self, screen: DVec2) -> DVec2 {
        self.inverse_matrix().transform_point2(screen)
    }

    /// World-space box currently covered by the screen.
    pub fn visible_world_bbox(&self) -> BBox {
        self.visible_world_bbox_for(self.screen_size.x, self.screen_size.y)
    }

    pub fn visible_world_bbox_for(&self, screen_width: f64, screen_height: f64) -> BBox {
        let center = self.camera_position / self.scale;
        let half = DVec2::new(screen_width, screen_height) / self.scale / 2.0;
        BBox::new(
            center.x - half.x,
            center.y - half.y,
            center.x + half.x,
            center.y + half.y,
        )
    }

    // === Gestures ===

    /// Pan by a screen-space finger delta. The camera moves against the finger.
    pub fn pan(&mut self, delta_screen: DVec2) {
        if !delta_screen.is_finite() {
            return;
        }
        self.camera_position -= delta_screen;
        self.target = None;
    }

    /// Zoom by `factor` keeping the world point under `focal_screen` fixed
    /// on screen. Returns false when the input is unusable.
    pub fn zoom_on_point(&mut self, focal_screen: DVec2, factor: f64) -> bool {
        if !focal_screen.is_finite() || !factor.is_finite() || factor <= 0.0 {
            debug!(?focal_screen, factor, "Ignoring invalid zoom");
            return false;
        }

        let world_focal = self.screen_to_world(focal_screen);
        let new_scale = self.clamp_scale(self.scale * factor);

        // Solve screen = world * s' - camera' + screen / 2 for camera'.
        self.camera_position = world_focal * new_scale + self.screen_size / 2.0 - focal_screen;
        self.scale = new_scale;
        self.target = None;
        true
    }

    pub fn zoom_on_center(&mut self, factor: f64) -> bool {
        self.zoom_on_point(self.screen_size / 2.0, factor)
    }

    // === Camera targets ===

    /// Request a camera move centring `world_target` at `scale` (current
    /// scale when `None`). Returns the destination.
    pub fn move_to_position(&mut self, world_target: DVec2, scale: Option<f64>) -> CameraTarget {
        let scale = scale.map_or(self.scale, |s| self.clamp_scale(s));
        let target = if world_target.is_finite() {
            CameraTarget {
                camera_position: world_target * scale,
                scale,
            }
        } else {
            CameraTarget {
                camera_position: self.camera_position,
                scale,
            }
        };
        debug!(?world_target, ?target, "Camera move requested");
        self.target = Some(target);
        target
    }

    pub fn target(&self) -> Option<CameraTarget> {
        self.target
    }

    /// Commit the pending target. Returns whether there was one.
    pub fn settle(&mut self) -> bool {
        match self.target.take() {
            Some(target) => {
                self.camera_position = target.camera_position;
                self.scale = target.scale;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_close(a: DVec2, b: DVec2) {
        assert!(
            (a - b).length() < EPS,
            "expected {:?} to be within {} of {:?}",
            a,
            EPS,
            b
        );
    }

    /// A handful of camera states, including clamped extremes.
    fn sample_viewports() -> Vec<Viewport> {
        let mut out = Vec::new();
        for &(cx, cy, s) in &[
            (0.0, 0.0, 1.0),
            (250.0, -75.0, 2.5),
            (-1234.5, 987.25, 0.1),
            (10.0, 10.0, 5.0),
            (3.0, -4.0, 0.37),
        ] {
            let mut v = Viewport::new(400.0, 800.0);
            v.set_position(DVec2::new(cx, cy), s);
            out.push(v);
        }
        out
    }

    #[test]
    fn origin_is_centred_at_scale_one() {
        let v = Viewport::new(400.0, 800.0);
        assert_close(v.world_to_screen(DVec2::ZERO), DVec2::new(200.0, 400.0));
        assert_close(v.screen_to_world(DVec2::new(200.0, 400.0)), DVec2::ZERO);
    }

    #[test]
    fn round_trip_screen_world_screen() {
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(400.0, 800.0),
            DVec2::new(123.4, 567.8),
            DVec2::new(-50.0, 2000.0),
        ];
        for v in sample_viewports() {
            for &p in &points {
                assert_close(v.world_to_screen(v.screen_to_world(p)), p);
                assert_close(v.screen_to_world(v.world_to_screen(p)), p);
            }
        }
    }

    #[test]
    fn inverse_matrix_matches_algebraic_inverse() {
        for v in sample_viewports() {
            let product = v.forward_matrix() * v.inverse_matrix();
            assert!(product.abs_diff_eq(DAffine2::IDENTITY, EPS), "{:?}", product);
        }
    }

    #[test]
    fn scale_is_clamped() {
        let mut v = Viewport::new(400.0, 800.0);
        v.set_position(DVec2::ZERO, 0.0);
        assert_eq!(v.scale(), MIN_SCALE);
        v.set_position(DVec2::ZERO, -3.0);
        assert_eq!(v.scale(), MIN_SCALE);
        v.set_position(DVec2::ZERO, 50.0);
        assert_eq!(v.scale(), MAX_SCALE);
        v.set_position(DVec2::ZERO, f64::NAN);
        assert_eq!(v.scale(), MAX_SCALE, "NaN keeps the previous scale");
    }

    #[test]
    fn zoom_on_screen_centre_scenario() {
        let mut v = Viewport::new(400.0, 800.0);
        let focal = DVec2::new(200.0, 400.0);
        let before = v.screen_to_world(focal);

        assert!(v.zoom_on_point(focal, 2.0));
        assert_eq!(v.scale(), 2.0);
        assert_close(v.screen_to_world(focal), before);
    }

    #[test]
    fn zoom_keeps_focal_world_point_fixed() {
        let focals = [
            DVec2::new(0.0, 0.0),
            DVec2::new(37.0, 712.0),
            DVec2::new(399.0, 1.0),
        ];
        for factor in [0.5, 1.3, 2.0, 0.01, 40.0] {
            for mut v in sample_viewports() {
                for &f in &focals {
                    let before = v.screen_to_world(f);
                    v.zoom_on_point(f, factor);
                    assert_close(v.screen_to_world(f), before);
                    assert!(v.scale() >= MIN_SCALE && v.scale() <= MAX_SCALE);
                }
            }
        }
    }

    #[test]
    fn zoom_rejects_invalid_factor() {
        let mut v = Viewport::new(400.0, 800.0);
        assert!(!v.zoom_on_point(DVec2::new(10.0, 10.0), 0.0));
        assert!(!v.zoom_on_point(DVec2::new(10.0, 10.0), -2.0));
        assert!(!v.zoom_on_point(DVec2::new(10.0, 10.0), f64::INFINITY));
        assert!(!v.zoom_on_point(DVec2::new(f64::NAN, 10.0), 2.0));
        assert_eq!(v.scale(), 1.0);
        assert_eq!(v.camera_position(), DVec2::ZERO);
    }

    #[test]
    fn zoom_on_center_keeps_view_centre() {
        let mut v = Viewport::new(400.0, 800.0);
        v.set_position(DVec2::new(300.0, 300.0), 1.0);
        let centre_world = v.screen_to_world(DVec2::new(200.0, 400.0));
        v.zoom_on_center(3.0);
        assert_close(v.screen_to_world(DVec2::new(200.0, 400.0)), centre_world);
    }

    #[test]
    fn pan_moves_camera_against_finger() {
        let mut v = Viewport::new(400.0, 800.0);
        let world = DVec2::new(100.0, 100.0);
        let before = v.world_to_screen(world);

        v.pan(DVec2::new(30.0, -20.0));
        assert_eq!(v.camera_position(), DVec2::new(-30.0, 20.0));
        // Content follows the finger.
        assert_close(v.world_to_screen(world), before + DVec2::new(30.0, -20.0));
    }

    #[test]
    fn visible_bbox_matches_screen_corners() {
        for v in sample_viewports() {
            let bbox = v.visible_world_bbox();
            assert_close(DVec2::new(bbox.min_x, bbox.min_y), v.screen_to_world(DVec2::ZERO));
            assert_close(
                DVec2::new(bbox.max_x, bbox.max_y),
                v.screen_to_world(DVec2::new(400.0, 800.0)),
            );
            assert!(bbox.min_y <= bbox.max_y);
        }
    }

    #[test]
    fn visible_bbox_at_origin() {
        let v = Viewport::new(400.0, 800.0);
        assert_eq!(v.visible_world_bbox(), BBox::new(-200.0, -400.0, 200.0, 400.0));

        let mut v = Viewport::new(400.0, 800.0);
        v.set_position(DVec2::ZERO, 2.0);
        assert_eq!(v.visible_world_bbox_for(400.0, 800.0), BBox::new(-100.0, -200.0, 100.0, 200.0));
    }

    #[test]
    fn move_to_position_sets_target_until_settled() {
        let mut v = Viewport::new(400.0, 800.0);
        v.set_position(DVec2::ZERO, 2.0);

        let target = v.move_to_position(DVec2::new(0.0, 100.0), None);
        assert_eq!(target.camera_position, DVec2::new(0.0, 200.0));
        assert_eq!(target.scale, 2.0);
        assert_eq!(v.camera_position(), DVec2::ZERO, "request alone does not move");
        assert_eq!(v.target(), Some(target));

        assert!(v.settle());
        assert_eq!(v.camera_position(), DVec2::new(0.0, 200.0));
        assert_close(v.world_to_screen(DVec2::new(0.0, 100.0)), DVec2::new(200.0, 400.0));
        assert!(!v.settle());
    }

    #[test]
    fn move_to_position_clamps_requested_scale() {
        let mut v = Viewport::new(400.0, 800.0);
        let target = v.move_to_position(DVec2::new(10.0, 0.0), Some(9.0));
        assert_eq!(target.scale, MAX_SCALE);
        assert_eq!(target.camera_position, DVec2::new(50.0, 0.0));
    }

    #[test]
    fn user_gesture_cancels_pending_target() {
        let mut v = Viewport::new(400.0, 800.0);
        v.move_to_position(DVec2::new(500.0, 500.0), None);
        v.pan(DVec2::new(1.0, 1.0));
        assert!(v.target().is_none());

        v.move_to_position(DVec2::new(500.0, 500.0), None);
        v.zoom_on_center(1.5);
        assert!(v.target().is_none());
    }
}
