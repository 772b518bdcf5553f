pub mod viewport;

pub use viewport::{CameraTarget, MAX_SCALE, MIN_SCALE, Viewport};
