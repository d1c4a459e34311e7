//! Per-frame update
//!
//! Order within a frame: retry/share commands, aiming and dropping, fixed physics
//! steps drained from the time accumulator (each followed by contact resolution),
//! the game-over check, and finally the aim height.

use glam::Vec2;
use rand::Rng;

use super::merge::{merge_contacts, resolve_pending};
use super::state::{DropState, GameEvent, GamePhase, GameSession};
use crate::consts::*;
use crate::radius;

/// Input signals for one frame, already mapped into world coordinates
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Move cursor left (held)
    pub left_held: bool,
    /// Move cursor right (held)
    pub right_held: bool,
    /// Drop (Enter / Space)
    pub confirm_pressed: bool,
    /// Pointer in world coordinates
    pub pointer: Option<Vec2>,
    /// Primary button held this frame
    pub pointer_held: bool,
    /// Primary button went down this frame
    pub pointer_clicked: bool,
    /// Retry button
    pub retry: bool,
    /// Share button
    pub share: bool,
}

/// What the host should do after a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Fixed steps run this frame
    pub steps: u32,
    /// Share was requested; carries the final score
    pub share: Option<u64>,
    /// The run was restarted this frame
    pub retry: bool,
}

/// Advance the session by one rendered frame of `elapsed` wall-clock seconds
pub fn frame(session: &mut GameSession, input: &FrameInput, elapsed: f32) -> FrameOutcome {
    let mut outcome = FrameOutcome::default();

    if input.retry {
        // Next seed comes from the current run so a whole play session replays from one seed
        let seed = session.rng.random::<u64>();
        session.restart(seed);
        outcome.retry = true;
        return outcome;
    }

    if session.phase == GamePhase::GameOver {
        if input.share {
            outcome.share = Some(session.score);
        }
        return outcome;
    }

    session.frames += 1;

    if session.dropper.can_put() {
        aim(session, input);
        if wants_drop(session, input) {
            drop_piece(session);
        }
    }

    session.accumulator += elapsed.max(0.0);
    while session.accumulator >= STEP_SECONDS {
        session.accumulator -= STEP_SECONDS;
        step(session);
        outcome.steps += 1;
    }

    if session.dropper.can_put() && crossed_danger_line(session) {
        end_run(session);
        return outcome;
    }

    update_aim_height(session);
    outcome
}

/// One fixed physics step plus contact resolution
pub fn step(session: &mut GameSession) {
    session.world.step();
    let contacts = session.world.contacts().to_vec();
    if contacts.is_empty() {
        return;
    }
    resolve_pending(session, &contacts);
    merge_contacts(session, &contacts);
}

/// Horizontal cursor movement from keys and pointer drag, clamped for the next piece
fn aim(session: &mut GameSession, input: &FrameInput) {
    let dropper = &mut session.dropper;
    let mut dx = 0.0;
    if input.left_held {
        dx -= CURSOR_SPEED;
    }
    if input.right_held {
        dx += CURSOR_SPEED;
    }

    if input.pointer_held {
        if let Some(p) = input.pointer {
            let band_top = dropper.cursor_y + AIM_CLEARANCE;
            let in_band = band_top <= p.y && p.y <= CONTAINER_FLOOR_Y;
            let above_band = p.y < band_top;
            let half = CONTAINER_HALF_WIDTH;
            if (in_band && p.x < -half) || (above_band && p.x < dropper.cursor_x) {
                dx -= CURSOR_SPEED;
            }
            if (in_band && p.x > half) || (above_band && p.x > dropper.cursor_x) {
                dx += CURSOR_SPEED;
            }
        }
    }

    // Never overshoot a pointer target
    if let (true, Some(p)) = (input.pointer_held, input.pointer) {
        if p.y < dropper.cursor_y + AIM_CLEARANCE && dx != 0.0 {
            let gap = p.x - dropper.cursor_x;
            if gap.signum() == dx.signum() && gap.abs() < dx.abs() {
                dx = gap;
            }
        }
    }

    dropper.cursor_x += dx;
    dropper.clamp_cursor();
}

/// Confirm key, or a click inside the drop zone below the aim point
fn wants_drop(session: &GameSession, input: &FrameInput) -> bool {
    if input.confirm_pressed {
        return true;
    }
    if !input.pointer_clicked {
        return false;
    }
    let Some(p) = input.pointer else {
        return false;
    };
    let half = CONTAINER_HALF_WIDTH;
    (-half..=half).contains(&p.x)
        && (session.dropper.cursor_y + AIM_CLEARANCE..=CONTAINER_FLOOR_Y).contains(&p.y)
}

/// Release the next piece at the cursor; Idle -> Falling
pub fn drop_piece(session: &mut GameSession) -> Option<super::physics::BodyId> {
    if !session.dropper.can_put() {
        return None;
    }
    let rank = session.dropper.next_rank;
    let pos = session.dropper.spawn_point();
    let id = session.spawn_piece(pos, rank);
    session.dropper.state = DropState::Falling { pending: id };
    session.events.push(GameEvent::Dropped { id, rank, pos });
    log::debug!("Dropped rank {} at ({:.1}, {:.1})", rank, pos.x, pos.y);
    Some(id)
}

/// Any piece whose top edge reached the danger line
pub fn crossed_danger_line(session: &GameSession) -> bool {
    session
        .piece_positions()
        .any(|(_, p, pos)| pos.y - radius(p.rank) >= DANGER_LINE_Y)
}

/// Record the score, persist the table and freeze the run
fn end_run(session: &mut GameSession) {
    session.phase = GamePhase::GameOver;
    let score = session.score;
    let place = session.high_scores.record(score);
    session.save_high_scores();
    session.events.push(GameEvent::GameOver { score, place });
    log::info!("Game over with score {} (place {:?})", score, place);
}

/// Aim point hovers above the pile and never sinks below AIM_MAX_Y
fn update_aim_height(session: &mut GameSession) {
    let y = match session.highest_top() {
        Some(top) => (top - AIM_CLEARANCE).min(AIM_MAX_Y),
        None => AIM_MAX_Y,
    };
    session.dropper.cursor_y = y;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor_bounds;
    use crate::persistence::{MemoryStore, ScoreStore};

    fn session(seed: u64) -> GameSession {
        GameSession::new(seed, Box::new(MemoryStore::new()))
    }

    fn confirm() -> FrameInput {
        FrameInput {
            confirm_pressed: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_accumulator_runs_whole_steps() {
        let mut s = session(1);
        let idle = FrameInput::default();
        let out = frame(&mut s, &idle, STEP_SECONDS * 2.5);
        assert_eq!(out.steps, 2);
        let out = frame(&mut s, &idle, STEP_SECONDS * 0.6);
        assert_eq!(out.steps, 1);
        assert_eq!(s.world.steps, 3);

        let out = frame(&mut s, &idle, 0.0);
        assert_eq!(out.steps, 0);
    }

    #[test]
    fn test_total_steps_match_elapsed() {
        let mut s = session(1);
        let idle = FrameInput::default();
        // 600 frames at 60 fps is 10 s, exactly 2000 fixed steps
        let mut total = 0;
        for _ in 0..600 {
            total += frame(&mut s, &idle, 1.0 / 60.0).steps as u64;
        }
        assert_eq!(total, 2000);
        assert_eq!(s.world.steps, 2000);
    }

    #[test]
    fn test_drop_locks_until_first_contact() {
        let mut s = session(3);
        let rank = s.dropper.next_rank;
        frame(&mut s, &confirm(), 0.0);
        let pending = s.dropper.pending().expect("piece should be pending");
        assert_eq!(s.pieces.rank(pending), Some(rank));
        assert!(!s.dropper.can_put());

        // A second drop while falling does nothing
        frame(&mut s, &confirm(), 0.0);
        assert_eq!(s.pieces.len(), 1);

        let mut frames = 0;
        while !s.dropper.can_put() && frames < 600 {
            frame(&mut s, &FrameInput::default(), 1.0 / 60.0);
            assert!(s.registry_matches_world());
            frames += 1;
        }
        assert!(s.dropper.can_put(), "piece never landed");
        assert_eq!(s.phase, GamePhase::Playing);
        assert!(
            s.drain_events()
                .iter()
                .any(|e| *e == GameEvent::Landed { id: pending })
        );
    }

    #[test]
    fn test_spawn_point_is_above_cursor() {
        let mut s = session(5);
        let rank = s.dropper.next_rank;
        let id = drop_piece(&mut s).unwrap();
        let pos = s.world.position(id).unwrap();
        assert!((pos.x - 0.0).abs() < 1e-4);
        assert!((pos.y - (-100.0 - radius(rank))).abs() < 1e-4);
        assert!(drop_piece(&mut s).is_none());
    }

    #[test]
    fn test_cursor_clamped_by_keys() {
        let mut s = session(9);
        let right = FrameInput {
            right_held: true,
            ..Default::default()
        };
        for _ in 0..200 {
            frame(&mut s, &right, 0.0);
            let (lo, hi) = cursor_bounds(s.dropper.next_rank);
            assert!(s.dropper.cursor_x >= lo && s.dropper.cursor_x <= hi);
        }
        let (_, hi) = cursor_bounds(s.dropper.next_rank);
        assert!((s.dropper.cursor_x - hi).abs() < 1e-4);
    }

    #[test]
    fn test_pointer_drag_moves_toward_pointer() {
        let mut s = session(9);
        let drag = FrameInput {
            pointer: Some(Vec2::new(-30.0, -300.0)),
            pointer_held: true,
            ..Default::default()
        };
        for _ in 0..5 {
            frame(&mut s, &drag, 0.0);
        }
        assert!((s.dropper.cursor_x - -20.0).abs() < 1e-4);
        for _ in 0..10 {
            frame(&mut s, &drag, 0.0);
        }
        assert!((s.dropper.cursor_x - -30.0).abs() < 1e-4);
    }

    #[test]
    fn test_pointer_in_band_beyond_wall_moves_cursor() {
        let mut s = session(9);
        let drag = FrameInput {
            pointer: Some(Vec2::new(300.0, 100.0)),
            pointer_held: true,
            ..Default::default()
        };
        frame(&mut s, &drag, 0.0);
        assert!((s.dropper.cursor_x - 4.0).abs() < 1e-4);
        assert!(s.pieces.is_empty());
    }

    #[test]
    fn test_click_inside_drop_zone_drops() {
        let mut s = session(11);
        let outside = FrameInput {
            pointer: Some(Vec2::new(250.0, 100.0)),
            pointer_clicked: true,
            pointer_held: true,
            ..Default::default()
        };
        frame(&mut s, &outside, 0.0);
        assert!(s.dropper.can_put());

        let above = FrameInput {
            pointer: Some(Vec2::new(0.0, -50.0)),
            pointer_clicked: true,
            ..Default::default()
        };
        frame(&mut s, &above, 0.0);
        assert!(s.dropper.can_put());

        let inside = FrameInput {
            pointer: Some(Vec2::new(0.0, 100.0)),
            pointer_clicked: true,
            ..Default::default()
        };
        frame(&mut s, &inside, 0.0);
        assert!(!s.dropper.can_put());
    }

    #[test]
    fn test_game_over_at_danger_line() {
        let mut s = session(13);
        let id = s.spawn_piece(Vec2::new(0.0, 0.0), 0);
        // World is not stepped with zero elapsed time, so the position holds
        s.world.set_position(id, Vec2::new(600.0, DANGER_LINE_Y - 1.0 + radius(0)));
        frame(&mut s, &FrameInput::default(), 0.0);
        assert_eq!(s.phase, GamePhase::Playing);

        s.world.set_position(id, Vec2::new(600.0, DANGER_LINE_Y + radius(0)));
        frame(&mut s, &FrameInput::default(), 0.0);
        assert_eq!(s.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_game_over_waits_for_idle() {
        let mut s = session(13);
        let id = drop_piece(&mut s).unwrap();
        let r = radius(s.pieces.rank(id).unwrap());
        s.world.set_position(id, Vec2::new(600.0, DANGER_LINE_Y + r + 10.0));
        frame(&mut s, &FrameInput::default(), 0.0);
        assert_eq!(s.phase, GamePhase::Playing);
    }

    #[test]
    fn test_game_over_records_and_persists() {
        let store = MemoryStore::with_values([("score0", "300"), ("score1", "100")]);
        let mut s = GameSession::new(17, Box::new(store));
        s.score = 200;
        let id = s.spawn_piece(Vec2::new(0.0, 0.0), 1);
        s.world.set_position(id, Vec2::new(600.0, 700.0));
        frame(&mut s, &FrameInput::default(), 0.0);

        assert_eq!(s.phase, GamePhase::GameOver);
        assert_eq!(s.high_scores.entries, [Some(300), Some(200), Some(100)]);
        assert!(s.drain_events().contains(&GameEvent::GameOver {
            score: 200,
            place: Some(2)
        }));
    }

    #[test]
    fn test_frozen_after_game_over() {
        let mut s = session(19);
        s.score = 150;
        let id = s.spawn_piece(Vec2::new(0.0, 0.0), 0);
        s.world.set_position(id, Vec2::new(600.0, 700.0));
        frame(&mut s, &FrameInput::default(), 0.0);
        assert_eq!(s.phase, GamePhase::GameOver);
        assert_eq!(s.high_scores.entries, [Some(150), None, None]);

        let steps = s.world.steps;
        let out = frame(
            &mut s,
            &FrameInput {
                confirm_pressed: true,
                right_held: true,
                share: true,
                ..Default::default()
            },
            1.0,
        );
        assert_eq!(out.steps, 0);
        assert_eq!(out.share, Some(150));
        assert_eq!(s.world.steps, steps);
        assert_eq!(s.pieces.len(), 1);
    }

    #[test]
    fn test_retry_starts_fresh_run() {
        let mut s = session(31);
        drop_piece(&mut s);
        s.score = 12;
        s.phase = GamePhase::GameOver;
        let out = frame(
            &mut s,
            &FrameInput {
                retry: true,
                ..Default::default()
            },
            0.0,
        );
        assert!(out.retry);
        assert_eq!(s.phase, GamePhase::Playing);
        assert_eq!(s.score, 0);
        assert!(s.pieces.is_empty());
        assert!(s.dropper.can_put());
        assert!(s.registry_matches_world());
        assert_ne!(s.seed, 31);
    }

    #[test]
    fn test_share_ignored_while_playing() {
        let mut s = session(19);
        let out = frame(
            &mut s,
            &FrameInput {
                share: true,
                ..Default::default()
            },
            0.0,
        );
        assert_eq!(out.share, None);
    }

    #[test]
    fn test_aim_height_tracks_pile() {
        let mut s = session(23);
        frame(&mut s, &FrameInput::default(), 0.0);
        assert_eq!(s.dropper.cursor_y, -100.0);

        s.spawn_piece(Vec2::new(0.0, 100.0), 0);
        frame(&mut s, &FrameInput::default(), 0.0);
        assert_eq!(s.dropper.cursor_y, -100.0);

        let id = s.spawn_piece(Vec2::new(0.0, 0.0), 0);
        s.world.set_position(id, Vec2::new(50.0, -20.0));
        frame(&mut s, &FrameInput::default(), 0.0);
        assert!((s.dropper.cursor_y - (-20.0 - 20.0 - 100.0)).abs() < 1e-3);
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = session(99);
        let mut b = session(99);
        let inputs = [confirm(), FrameInput::default(), FrameInput::default()];
        for _ in 0..120 {
            for input in &inputs {
                frame(&mut a, input, 1.0 / 60.0);
                frame(&mut b, input, 1.0 / 60.0);
            }
        }
        assert_eq!(a.score, b.score);
        assert_eq!(a.pieces.len(), b.pieces.len());
        assert_eq!(a.dropper.next_rank, b.dropper.next_rank);
        assert_eq!(a.dropper.cursor_x, b.dropper.cursor_x);
        for ((ia, pa, qa), (ib, pb, qb)) in a.piece_positions().zip(b.piece_positions()) {
            assert_eq!(ia, ib);
            assert_eq!(pa, pb);
            assert_eq!(qa, qb);
        }
    }

    #[test]
    fn test_store_written_on_game_over() {
        struct Spy(std::rc::Rc<std::cell::RefCell<Vec<(String, String)>>>);
        impl ScoreStore for Spy {
            fn get(&self, _key: &str) -> String {
                String::new()
            }
            fn set(&mut self, key: &str, value: &str) {
                self.0.borrow_mut().push((key.to_string(), value.to_string()));
            }
        }

        let writes = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut s = GameSession::new(29, Box::new(Spy(writes.clone())));
        s.score = 150;
        let id = s.spawn_piece(Vec2::new(0.0, 0.0), 0);
        s.world.set_position(id, Vec2::new(600.0, 700.0));
        frame(&mut s, &FrameInput::default(), 0.0);

        let writes = writes.borrow();
        assert_eq!(
            *writes,
            vec![
                ("score0".to_string(), "150".to_string()),
                ("score1".to_string(), String::new()),
                ("score2".to_string(), String::new()),
            ]
        );
    }
}
