/// Full-screen quad: 2 triangles covering [-1,1] in clip space.
/// UV origin is top-left, so v runs opposite to clip-space y.
#[rustfmt::skip]
pub const FULLSCREEN_QUAD: [f32; 24] = [
    // pos.x, pos.y, uv.x, uv.y
    -1.0, -1.0, 0.0, 1.0,
     1.0, -1.0, 1.0, 1.0,
     1.0,  1.0, 1.0, 0.0,
    -1.0, -1.0, 0.0, 1.0,
     1.0,  1.0, 1.0, 0.0,
    -1.0,  1.0, 0.0, 0.0,
];

pub const QUAD_VERTEX_COUNT: u32 = 6;
/// pos2 + uv2, f32.
pub const QUAD_STRIDE: u64 = 16;

/// Vertices as (position, uv) pairs.
pub fn quad_vertices() -> impl Iterator<Item = ([f32; 2], [f32; 2])> {
    FULLSCREEN_QUAD
        .chunks_exact(4)
        .map(|v| ([v[0], v[1]], [v[2], v[3]]))
}
