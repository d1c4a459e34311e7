//! Shape generation for 2D primitives

use glam::Vec2;
use std::f32::consts::PI;

use super::vertex::Vertex;

/// Segments used for a circle of `radius`: more for bigger pieces, never fewer than 16
pub fn segments_for(radius: f32) -> u32 {
    ((radius * 0.8) as u32).clamp(16, 96)
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}

/// Generate vertices for a ring (hollow circle)
pub fn ring(
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    color: [f32; 4],
    segments: u32,
) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 6) as usize);
    let inner_radius = inner_radius.max(0.0);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;
        let dir1 = Vec2::new(theta1.cos(), theta1.sin());
        let dir2 = Vec2::new(theta2.cos(), theta2.sin());

        let inner1 = center + dir1 * inner_radius;
        let outer1 = center + dir1 * outer_radius;
        let inner2 = center + dir2 * inner_radius;
        let outer2 = center + dir2 * outer_radius;

        // Two triangles per segment
        vertices.push(Vertex::new(inner1.x, inner1.y, color));
        vertices.push(Vertex::new(outer1.x, outer1.y, color));
        vertices.push(Vertex::new(inner2.x, inner2.y, color));

        vertices.push(Vertex::new(inner2.x, inner2.y, color));
        vertices.push(Vertex::new(outer1.x, outer1.y, color));
        vertices.push(Vertex::new(outer2.x, outer2.y, color));
    }

    vertices
}

/// Generate vertices for a thick line segment
pub fn line(start: Vec2, end: Vec2, thickness: f32, color: [f32; 4]) -> Vec<Vertex> {
    let dir = (end - start).normalize_or_zero();
    if dir == Vec2::ZERO {
        return Vec::new();
    }
    let perp = Vec2::new(-dir.y, dir.x) * (thickness * 0.5);

    let a = start + perp;
    let b = start - perp;
    let c = end + perp;
    let d = end - perp;

    vec![
        Vertex::new(a.x, a.y, color),
        Vertex::new(b.x, b.y, color),
        Vertex::new(c.x, c.y, color),
        Vertex::new(c.x, c.y, color),
        Vertex::new(b.x, b.y, color),
        Vertex::new(d.x, d.y, color),
    ]
}
