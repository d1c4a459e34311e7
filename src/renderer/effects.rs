//! Transient merge effects
//!
//! Each effect is updated with its normalized age `t` in `[0, 1]`, emits its
//! vertices and reports whether it is still alive. Effects are purely visual and
//! never feed back into the simulation.

use glam::Vec2;

use super::shapes;
use super::vertex::{Vertex, colors};
use crate::consts::RING_DURATION;
use crate::radius;
use crate::sim::GameEvent;

/// Exponential ease-out, 0 at t=0 and 1 at t=1
pub fn ease_out_expo(t: f32) -> f32 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2f32.powf(-10.0 * t.max(0.0))
    }
}

/// Expanding ring left behind by a merged piece
#[derive(Debug, Clone, PartialEq)]
pub struct RingEffect {
    pub pos: Vec2,
    pub rank: u32,
    /// Seconds since spawn
    pub age: f32,
}

impl RingEffect {
    pub fn new(pos: Vec2, rank: u32) -> Self {
        Self { pos, rank, age: 0.0 }
    }

    /// Draw at normalized time `t`; false once finished
    pub fn update(&self, t: f32, out: &mut Vec<Vertex>) -> bool {
        let e = ease_out_expo(t);
        let outer = e * radius(self.rank) * 1.5;
        let stroke = 20.0 * (1.0 - e);
        if stroke > 0.0 && outer > 0.0 {
            let color = colors::with_alpha(colors::piece(self.rank), 0.75);
            out.extend(shapes::ring(
                self.pos,
                outer - stroke,
                outer,
                color,
                shapes::segments_for(outer),
            ));
        }
        t < 1.0
    }
}

/// Active effects owned by the render layer
#[derive(Debug, Clone, Default)]
pub struct Effects {
    rings: Vec<RingEffect>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, ring: RingEffect) {
        self.rings.push(ring);
    }

    /// Spawn effects for simulation events
    pub fn handle_event(&mut self, event: &GameEvent) {
        if let GameEvent::Merged { rank, a, b, .. } = *event {
            self.add(RingEffect::new(a, rank));
            self.add(RingEffect::new(b, rank));
        }
    }

    /// Advance every effect by `dt` seconds, draw it, and drop the finished ones
    pub fn update(&mut self, dt: f32, out: &mut Vec<Vertex>) {
        self.rings.retain_mut(|ring| {
            ring.age += dt;
            ring.update(ring.age / RING_DURATION, out)
        });
    }

    pub fn clear(&mut self) {
        self.rings.clear();
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_out_expo_bounds() {
        assert_eq!(ease_out_expo(0.0), 0.0);
        assert_eq!(ease_out_expo(1.0), 1.0);
        assert!(ease_out_expo(0.5) > 0.9);
        assert!(ease_out_expo(0.2) < ease_out_expo(0.3));
    }

    #[test]
    fn test_merge_event_spawns_two_rings() {
        let mut effects = Effects::new();
        effects.handle_event(&GameEvent::Merged {
            rank: 2,
            a: Vec2::new(-10.0, 0.0),
            b: Vec2::new(10.0, 0.0),
            pos: Vec2::ZERO,
            points: 4,
        });
        assert_eq!(effects.len(), 2);
    }

    #[test]
    fn test_rings_expire_after_duration() {
        let mut effects = Effects::new();
        effects.add(RingEffect::new(Vec2::ZERO, 0));
        let mut out = Vec::new();

        effects.update(RING_DURATION * 0.5, &mut out);
        assert_eq!(effects.len(), 1);
        assert!(!out.is_empty());

        out.clear();
        effects.update(RING_DURATION * 0.6, &mut out);
        assert!(effects.is_empty());
    }
}
