//! Game session state
//!
//! Everything that changes during a run lives in `GameSession`: the physics world,
//! the piece registry, the drop controller, score, RNG and the high-score table.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::physics::{BodyId, PhysicsWorld};
use crate::consts::*;
use crate::highscores::HighScores;
use crate::persistence::ScoreStore;
use crate::{cursor_bounds, radius};

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Pieces can be dropped and the world is stepping
    Playing,
    /// Run ended; only retry and share are accepted
    GameOver,
}

/// Whether the player may drop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropState {
    /// No uncommitted piece; a drop is allowed
    Idle,
    /// The last dropped piece has not touched anything yet
    Falling { pending: BodyId },
}

/// Things the presentation layer may react to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// A piece was released at `pos`
    Dropped { id: BodyId, rank: u32, pos: Vec2 },
    /// The pending piece made its first contact
    Landed { id: BodyId },
    /// Two pieces of `rank` at `a` and `b` became one piece of `rank + 1` at `pos`
    Merged {
        rank: u32,
        a: Vec2,
        b: Vec2,
        pos: Vec2,
        points: u64,
    },
    /// The run ended; `place` is the 1-indexed high-score position, if any
    GameOver { score: u64, place: Option<usize> },
}

/// A live piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub rank: u32,
}

/// Live body identity to piece rank, iterated in id order
#[derive(Debug, Clone, Default)]
pub struct PieceRegistry {
    pieces: BTreeMap<BodyId, Piece>,
}

impl PieceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: BodyId, rank: u32) {
        self.pieces.insert(id, Piece { rank });
    }

    pub fn remove(&mut self, id: BodyId) -> Option<Piece> {
        self.pieces.remove(&id)
    }

    pub fn rank(&self, id: BodyId) -> Option<u32> {
        self.pieces.get(&id).map(|p| p.rank)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.pieces.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyId, Piece)> + '_ {
        self.pieces.iter().map(|(id, p)| (*id, *p))
    }

    pub fn ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.pieces.keys().copied()
    }
}

/// Drop controller: what comes next and where it will be released
#[derive(Debug, Clone)]
pub struct Dropper {
    pub state: DropState,
    pub next_rank: u32,
    pub next_next_rank: u32,
    pub cursor_x: f32,
    pub cursor_y: f32,
}

impl Dropper {
    /// Idle dropper with two freshly rolled ranks
    pub fn new(rng: &mut Pcg32) -> Self {
        let next_rank = roll_rank(rng);
        let next_next_rank = roll_rank(rng);
        Self {
            state: DropState::Idle,
            next_rank,
            next_next_rank,
            cursor_x: 0.0,
            cursor_y: AIM_MAX_Y,
        }
    }

    pub fn can_put(&self) -> bool {
        self.state == DropState::Idle
    }

    pub fn pending(&self) -> Option<BodyId> {
        match self.state {
            DropState::Idle => None,
            DropState::Falling { pending } => Some(pending),
        }
    }

    /// Where the next piece would be released
    pub fn spawn_point(&self) -> Vec2 {
        Vec2::new(self.cursor_x, self.cursor_y - radius(self.next_rank))
    }

    /// Keep the next piece fully inside the container
    pub fn clamp_cursor(&mut self) {
        let (lo, hi) = cursor_bounds(self.next_rank);
        self.cursor_x = self.cursor_x.clamp(lo, hi);
    }
}

/// Uniform rank for a new piece, 0..=MAX_DROP_RANK
pub fn roll_rank(rng: &mut Pcg32) -> u32 {
    rng.random_range(0..=MAX_DROP_RANK)
}

/// One run of the game plus the persistent score table
pub struct GameSession {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    pub world: PhysicsWorld,
    pub pieces: PieceRegistry,
    pub dropper: Dropper,
    pub score: u64,
    /// Wall-clock time not yet consumed by fixed steps
    pub accumulator: f32,
    /// Frames processed this run
    pub frames: u64,
    pub high_scores: HighScores,
    /// Events since the host last drained them
    pub events: Vec<GameEvent>,
    store: Box<dyn ScoreStore>,
}

impl GameSession {
    /// New run; loads the high-score table from `store`
    pub fn new(seed: u64, store: Box<dyn ScoreStore>) -> Self {
        let high_scores = HighScores::load(store.as_ref());
        let mut rng = Pcg32::seed_from_u64(seed);
        let dropper = Dropper::new(&mut rng);
        log::info!("Session started with seed {}", seed);
        Self {
            seed,
            rng,
            phase: GamePhase::Playing,
            world: build_container(),
            pieces: PieceRegistry::new(),
            dropper,
            score: 0,
            accumulator: 0.0,
            frames: 0,
            high_scores,
            events: Vec::new(),
            store,
        }
    }

    /// Throw away the run and start over; the score table and gateway are kept
    pub fn restart(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        self.dropper = Dropper::new(&mut self.rng);
        self.phase = GamePhase::Playing;
        self.world = build_container();
        self.pieces = PieceRegistry::new();
        self.score = 0;
        self.accumulator = 0.0;
        self.frames = 0;
        self.events.clear();
        log::info!("Session restarted with seed {}", seed);
    }

    /// Spawn a registered piece
    pub fn spawn_piece(&mut self, pos: Vec2, rank: u32) -> BodyId {
        let id = self.world.create_circle(pos, radius(rank));
        self.pieces.insert(id, rank);
        id
    }

    /// Destroy a registered piece
    pub fn remove_piece(&mut self, id: BodyId) -> Option<Piece> {
        self.world.destroy(id);
        self.pieces.remove(id)
    }

    /// Live pieces with their current centers, in id order
    pub fn piece_positions(&self) -> impl Iterator<Item = (BodyId, Piece, Vec2)> + '_ {
        self.pieces
            .iter()
            .filter_map(|(id, p)| self.world.position(id).map(|pos| (id, p, pos)))
    }

    /// y of the highest piece top edge, if any pieces exist
    pub fn highest_top(&self) -> Option<f32> {
        self.piece_positions()
            .map(|(_, p, pos)| pos.y - radius(p.rank))
            .reduce(f32::min)
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Persist the high-score table through the gateway
    pub fn save_high_scores(&mut self) {
        self.high_scores.save(self.store.as_mut());
    }

    /// Registry keys and live dynamic bodies are the same set
    pub fn registry_matches_world(&self) -> bool {
        self.pieces.ids().eq(self.world.circles())
    }
}

/// Floor and walls of the container
fn build_container() -> PhysicsWorld {
    let mut world = PhysicsWorld::new();
    let w = CONTAINER_HALF_WIDTH;
    world.create_static_line(
        Vec2::new(-w, CONTAINER_FLOOR_Y),
        Vec2::new(w, CONTAINER_FLOOR_Y),
    );
    world.create_static_line(Vec2::new(-w, CONTAINER_TOP_Y), Vec2::new(-w, CONTAINER_FLOOR_Y));
    world.create_static_line(Vec2::new(w, CONTAINER_TOP_Y), Vec2::new(w, CONTAINER_FLOOR_Y));
    world
}
