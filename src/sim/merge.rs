//! Contact resolution after each fixed step
//!
//! Two passes over the contacts a step produced: first release the drop lock if
//! the pending piece touched anything, then merge equal-rank pairs.

use rand::Rng;

use super::physics::Contact;
use super::state::{DropState, GameEvent, GameSession, roll_rank};
use crate::consts::CURSOR_JITTER;
use crate::merge_points;

/// Release the drop lock if the pending piece appears in `contacts`
pub fn resolve_pending(session: &mut GameSession, contacts: &[Contact]) -> bool {
    let DropState::Falling { pending } = session.dropper.state else {
        return false;
    };
    if !contacts.iter().any(|c| c.involves(pending)) {
        return false;
    }

    let dropper = &mut session.dropper;
    dropper.state = DropState::Idle;
    dropper.next_rank = dropper.next_next_rank;
    dropper.next_next_rank = roll_rank(&mut session.rng);
    dropper.cursor_x += session.rng.random_range(-CURSOR_JITTER..=CURSOR_JITTER);
    dropper.clamp_cursor();

    session.events.push(GameEvent::Landed { id: pending });
    log::trace!("Piece {:?} landed, next rank {}", pending, dropper.next_rank);
    true
}

/// Merge every equal-rank pair in `contacts`; returns the number of merges.
///
/// A piece consumed by an earlier pair is no longer registered, so later pairs
/// naming it are skipped and each piece merges at most once per step.
pub fn merge_contacts(session: &mut GameSession, contacts: &[Contact]) -> usize {
    let mut merges = 0;
    for contact in contacts {
        let (Some(rank_a), Some(rank_b)) = (
            session.pieces.rank(contact.a),
            session.pieces.rank(contact.b),
        ) else {
            continue;
        };
        if rank_a != rank_b || contact.a == contact.b {
            continue;
        }
        let (Some(pos_a), Some(pos_b)) = (
            session.world.position(contact.a),
            session.world.position(contact.b),
        ) else {
            continue;
        };

        let new_rank = rank_a + 1;
        let points = merge_points(new_rank);
        session.score = session.score.saturating_add(points);

        let pos = (pos_a + pos_b) * 0.5;
        session.remove_piece(contact.a);
        session.remove_piece(contact.b);
        let merged = session.spawn_piece(pos, new_rank);

        session.events.push(GameEvent::Merged {
            rank: rank_a,
            a: pos_a,
            b: pos_b,
            pos,
            points,
        });
        log::debug!(
            "Merged {:?}+{:?} (rank {}) into {:?}, score {}",
            contact.a,
            contact.b,
            rank_a,
            merged,
            session.score
        );
        merges += 1;
    }
    merges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::radius;
    use glam::Vec2;

    fn session() -> GameSession {
        GameSession::new(42, Box::new(MemoryStore::new()))
    }

    #[test]
    fn test_two_rank_zero_merge() {
        let mut s = session();
        let a = s.spawn_piece(Vec2::new(-20.0, 300.0), 0);
        let b = s.spawn_piece(Vec2::new(20.0, 300.0), 0);

        let merges = merge_contacts(&mut s, &[Contact::new(a, b)]);
        assert_eq!(merges, 1);
        assert_eq!(s.score, 1);
        assert_eq!(s.pieces.len(), 1);
        let (id, piece) = s.pieces.iter().next().unwrap();
        assert_eq!(piece.rank, 1);
        assert!((s.world.position(id).unwrap() - Vec2::new(0.0, 300.0)).length() < 1e-3);
    }

    #[test]
    fn test_rank_two_merge_at_midpoint() {
        let mut s = session();
        let a = s.spawn_piece(Vec2::new(-40.0, 200.0), 2);
        let b = s.spawn_piece(Vec2::new(20.0, 260.0), 2);

        merge_contacts(&mut s, &[Contact::new(a, b)]);

        assert_eq!(s.score, 4);
        assert!(!s.pieces.contains(a) && !s.pieces.contains(b));
        assert!(!s.world.contains(a) && !s.world.contains(b));
        let (id, piece) = s.pieces.iter().next().unwrap();
        assert_eq!(piece.rank, 3);
        assert!((s.world.position(id).unwrap() - Vec2::new(-10.0, 230.0)).length() < 1e-3);
        assert!(s.registry_matches_world());

        let events = s.drain_events();
        assert!(matches!(
            events.as_slice(),
            [GameEvent::Merged { rank: 2, points: 4, .. }]
        ));
    }

    #[test]
    fn test_unequal_ranks_do_not_merge() {
        let mut s = session();
        let a = s.spawn_piece(Vec2::new(-20.0, 300.0), 0);
        let b = s.spawn_piece(Vec2::new(20.0, 300.0), 1);
        assert_eq!(merge_contacts(&mut s, &[Contact::new(a, b)]), 0);
        assert_eq!(s.score, 0);
        assert_eq!(s.pieces.len(), 2);
    }

    #[test]
    fn test_boundary_contacts_are_ignored() {
        let mut s = session();
        let floor = s.world.boundaries().next().unwrap();
        let a = s.spawn_piece(Vec2::new(0.0, 380.0), 0);
        assert_eq!(merge_contacts(&mut s, &[Contact::new(a, floor)]), 0);
        assert!(s.pieces.contains(a));
    }

    #[test]
    fn test_piece_merges_at_most_once_per_step() {
        let mut s = session();
        let a = s.spawn_piece(Vec2::new(-40.0, 300.0), 1);
        let b = s.spawn_piece(Vec2::new(0.0, 300.0), 1);
        let c = s.spawn_piece(Vec2::new(40.0, 300.0), 1);

        let contacts = [Contact::new(a, b), Contact::new(b, c), Contact::new(a, c)];
        assert_eq!(merge_contacts(&mut s, &contacts), 1);
        assert_eq!(s.score, 2);
        assert!(s.pieces.contains(c));
        assert_eq!(s.pieces.len(), 2);
        assert!(s.registry_matches_world());
    }

    #[test]
    fn test_score_sums_over_merges() {
        let mut s = session();
        let a = s.spawn_piece(Vec2::new(-100.0, 300.0), 0);
        let b = s.spawn_piece(Vec2::new(-60.0, 300.0), 0);
        let c = s.spawn_piece(Vec2::new(60.0, 300.0), 4);
        let d = s.spawn_piece(Vec2::new(120.0, 300.0), 4);
        merge_contacts(&mut s, &[Contact::new(a, b), Contact::new(c, d)]);
        assert_eq!(s.score, 1 + 16);
    }

    #[test]
    fn test_pending_released_on_contact() {
        let mut s = session();
        let floor = s.world.boundaries().next().unwrap();
        let upcoming = s.dropper.next_next_rank;
        let p = s.spawn_piece(Vec2::new(0.0, 0.0), s.dropper.next_rank);
        s.dropper.state = DropState::Falling { pending: p };

        let other = s.spawn_piece(Vec2::new(100.0, 100.0), 0);
        assert!(!resolve_pending(&mut s, &[Contact::new(other, floor)]));
        assert!(!s.dropper.can_put());

        assert!(resolve_pending(&mut s, &[Contact::new(floor, p)]));
        assert!(s.dropper.can_put());
        assert_eq!(s.dropper.next_rank, upcoming);
        let (lo, hi) = crate::cursor_bounds(s.dropper.next_rank);
        assert!(s.dropper.cursor_x >= lo && s.dropper.cursor_x <= hi);
        assert!(s.dropper.cursor_x.abs() <= 1.0);
    }

    #[test]
    fn test_pending_jitter_respects_walls() {
        let mut s = session();
        let p = s.spawn_piece(Vec2::new(0.0, 0.0), 0);
        s.dropper.state = DropState::Falling { pending: p };
        s.dropper.next_next_rank = 3;
        s.dropper.cursor_x = 200.0 - radius(0);
        resolve_pending(&mut s, &[Contact::new(p, p)]);
        assert!(s.dropper.cursor_x <= 200.0 - radius(3));
    }
}
