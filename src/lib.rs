//! Not Suika - a merge-the-balls drop puzzle
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics world, drop control, merges, game over)
//! - `renderer`: WebGPU rendering pipeline and ring effects
//! - `platform`: Browser/native platform glue (share intent)
//! - `persistence`: Key-value gateway used for the high-score table
//! - `highscores`: Top-3 score table

pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod sim;

pub use highscores::HighScores;
pub use persistence::{MemoryStore, ScoreStore};

/// Game configuration constants
pub mod consts {
    /// Window title and logical size
    pub const WINDOW_TITLE: &str = "Not Suika";
    pub const WINDOW_WIDTH: f32 = 800.0;
    pub const WINDOW_HEIGHT: f32 = 1200.0;

    /// Fixed simulation timestep (200 Hz)
    pub const STEP_SECONDS: f32 = 1.0 / 200.0;
    /// Downward acceleration (y grows downward)
    pub const GRAVITY: f32 = 980.0 * 0.75;

    /// Container geometry, centered on x = 0
    pub const CONTAINER_HALF_WIDTH: f32 = 200.0;
    pub const CONTAINER_FLOOR_Y: f32 = 400.0;
    pub const CONTAINER_TOP_Y: f32 = 0.0;

    /// A settled piece whose top edge reaches this y ends the run
    pub const DANGER_LINE_Y: f32 = 500.0;

    /// Piece sizing: radius(rank) = BASE_RADIUS * RADIUS_GROWTH^rank
    pub const BASE_RADIUS: f32 = 20.0;
    pub const RADIUS_GROWTH: f32 = 1.25;

    /// Highest rank handed to the player (inclusive)
    pub const MAX_DROP_RANK: u32 = 3;

    /// Aim point hovers this far above the highest piece
    pub const AIM_CLEARANCE: f32 = 100.0;
    /// Aim point never goes below this y
    pub const AIM_MAX_Y: f32 = -100.0;
    /// Cursor movement per frame from keys or pointer drag
    pub const CURSOR_SPEED: f32 = 4.0;
    /// Random cursor nudge after each landed piece
    pub const CURSOR_JITTER: f32 = 1.0;

    /// Ring effect lifetime in seconds
    pub const RING_DURATION: f32 = 1.0;
}

/// Radius of a piece of the given rank
#[inline]
pub fn radius(rank: u32) -> f32 {
    consts::BASE_RADIUS * consts::RADIUS_GROWTH.powi(rank.min(i32::MAX as u32) as i32)
}

/// Horizontal range the center of a piece of `rank` may occupy inside the container
#[inline]
pub fn cursor_bounds(rank: u32) -> (f32, f32) {
    let r = radius(rank);
    (
        -consts::CONTAINER_HALF_WIDTH + r,
        consts::CONTAINER_HALF_WIDTH - r,
    )
}

/// Score awarded for a merge that produces `new_rank`
#[inline]
pub fn merge_points(new_rank: u32) -> u64 {
    1u64.checked_shl(new_rank.saturating_sub(1)).unwrap_or(u64::MAX)
}
