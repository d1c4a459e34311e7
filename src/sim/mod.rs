//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body ID)
//! - No rendering or platform dependencies

pub mod autoplay;
pub mod merge;
pub mod physics;
pub mod state;
pub mod tick;

pub use autoplay::AutoPlayer;
pub use merge::{merge_contacts, resolve_pending};
pub use physics::{BodyId, Contact, PhysicsWorld};
pub use state::{DropState, Dropper, GameEvent, GamePhase, GameSession, Piece, PieceRegistry};
pub use tick::{FrameInput, FrameOutcome, crossed_danger_line, drop_piece, frame, step};
