use super::vertex::{v, Vertex};

/// Unit quad in the XY plane, centred on the origin, facing +Z.
pub fn quad_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let verts = vec![
        v([-0.5, -0.5, 0.0], [0.0, 1.0]),
        v([0.5, -0.5, 0.0], [1.0, 1.0]),
        v([0.5, 0.5, 0.0], [1.0, 0.0]),
        v([-0.5, 0.5, 0.0], [0.0, 0.0]),
    ];
    let indices = vec![0, 1, 2, 2, 3, 0];
    (verts, indices)
}
