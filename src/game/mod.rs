pub mod deck;
pub mod events;
pub mod machine;
pub mod session;

pub use deck::{Deck, SupplyId, SupplyTile};
pub use events::{CameraRequest, DropRejection, GameEvent};
pub use machine::{Game, GamePhase};
pub use session::{DropOutcome, Session};
