//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for game elements
pub mod colors {
    /// Piece colors, indexed by rank mod 10
    pub const PIECES: [[f32; 4]; 10] = [
        [1.0, 0.0, 0.0, 1.0],       // red
        [1.0, 0.647, 0.0, 1.0],     // orange
        [1.0, 1.0, 0.0, 1.0],       // yellow
        [0.0, 0.749, 1.0, 1.0],     // deep sky blue
        [0.0, 0.0, 1.0, 1.0],       // blue
        [0.678, 1.0, 0.184, 1.0],   // green yellow
        [0.0, 0.502, 0.0, 1.0],     // green
        [1.0, 0.753, 0.796, 1.0],   // pink
        [1.0, 0.078, 0.576, 1.0],   // deep pink
        [0.502, 0.0, 0.502, 1.0],   // purple
    ];
    pub const BOUNDARY: [f32; 4] = [0.529, 0.808, 0.922, 1.0]; // sky blue
    pub const BACKGROUND: [f32; 4] = [0.02, 0.02, 0.05, 1.0];

    /// Color of a piece of `rank`
    pub fn piece(rank: u32) -> [f32; 4] {
        PIECES[(rank % 10) as usize]
    }

    /// Same color with a different alpha
    pub fn with_alpha(mut color: [f32; 4], alpha: f32) -> [f32; 4] {
        color[3] = alpha;
        color
    }
}
