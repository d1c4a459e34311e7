//! Scene assembly: turns a session into world-space triangles

use glam::Vec2;

use super::effects::Effects;
use super::shapes;
use super::vertex::{Vertex, colors};
use crate::platform::screen_to_world;
use crate::radius;
use crate::sim::GameSession;

/// Boundary stroke width
const BOUNDARY_THICKNESS: f32 = 4.0;
/// Where the next-next preview sits, in logical window pixels
pub const PREVIEW_SCREEN_POS: Vec2 = Vec2::new(700.0, 920.0);

/// Build every triangle for one frame. Effects are advanced by `dt` while drawing.
pub fn build(session: &GameSession, effects: &mut Effects, dt: f32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(4096);

    for (_, piece, pos) in session.piece_positions() {
        let r = radius(piece.rank);
        vertices.extend(shapes::circle(
            pos,
            r,
            colors::piece(piece.rank),
            shapes::segments_for(r),
        ));
    }

    let dropper = &session.dropper;
    if dropper.can_put() {
        let r = radius(dropper.next_rank);
        vertices.extend(shapes::circle(
            dropper.spawn_point(),
            r,
            colors::piece(dropper.next_rank),
            shapes::segments_for(r),
        ));
    }

    for id in session.world.boundaries() {
        if let Some((a, b)) = session.world.segment(id) {
            vertices.extend(shapes::line(a, b, BOUNDARY_THICKNESS, colors::BOUNDARY));
        }
    }

    effects.update(dt, &mut vertices);

    let preview_rank = dropper.next_next_rank;
    let r = radius(preview_rank);
    vertices.extend(shapes::circle(
        screen_to_world(PREVIEW_SCREEN_POS),
        r,
        colors::piece(preview_rank),
        shapes::segments_for(r),
    ));

    vertices
}
