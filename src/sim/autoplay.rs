//! Idle/demo player
//!
//! Produces `FrameInput`s that aim at an exposed piece of the same rank as the
//! next drop, or at a random spot when there is none, then drops.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::GameSession;
use super::tick::FrameInput;
use crate::cursor_bounds;
use crate::radius;

/// Cursor is considered on target within this distance
const AIM_TOLERANCE: f32 = 2.0;

/// Simple bot driving a session through `FrameInput`s
#[derive(Debug, Clone)]
pub struct AutoPlayer {
    rng: Pcg32,
    target_x: Option<f32>,
}

impl AutoPlayer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            target_x: None,
        }
    }

    /// Input for the next frame
    pub fn next_input(&mut self, session: &GameSession) -> FrameInput {
        let dropper = &session.dropper;
        if !dropper.can_put() {
            self.target_x = None;
            return FrameInput::default();
        }

        let target = match self.target_x {
            Some(x) => x,
            None => {
                let x = self.pick_target(session);
                self.target_x = Some(x);
                x
            }
        };

        let gap = target - dropper.cursor_x;
        if gap.abs() <= AIM_TOLERANCE {
            self.target_x = None;
            return FrameInput {
                confirm_pressed: true,
                ..Default::default()
            };
        }
        FrameInput {
            left_held: gap < 0.0,
            right_held: gap > 0.0,
            ..Default::default()
        }
    }

    /// Highest piece with the next rank, otherwise anywhere the piece fits
    fn pick_target(&mut self, session: &GameSession) -> f32 {
        let rank = session.dropper.next_rank;
        let (lo, hi) = cursor_bounds(rank);
        let matching = session
            .piece_positions()
            .filter(|(_, p, _)| p.rank == rank)
            .min_by(|a, b| {
                (a.2.y - radius(a.1.rank))
                    .partial_cmp(&(b.2.y - radius(b.1.rank)))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(_, _, pos)| pos.x);
        match matching {
            Some(x) => x.clamp(lo, hi),
            None => self.rng.random_range(lo..=hi),
        }
    }
}
