use bytemuck::{Pod, Zeroable};

/// Interleaved vertex: position, texture coordinates, normal.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x2,
        2 => Float32x3,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

const fn v(position: [f32; 3], tex_coords: [f32; 2], normal: [f32; 3]) -> Vertex {
    Vertex {
        position,
        tex_coords,
        normal,
    }
}

/// Indexed triangle list on the CPU.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// A thin slab, 1 wide, 2.5 tall and 0.1 deep, four vertices per face so
/// every face carries its own normal and full texture.
pub fn textured_cube() -> MeshData {
    const FRONT: [f32; 3] = [0.0, 0.0, 1.0];
    const BACK: [f32; 3] = [0.0, 0.0, -1.0];
    const RIGHT: [f32; 3] = [1.0, 0.0, 0.0];
    const LEFT: [f32; 3] = [-1.0, 0.0, 0.0];
    const UP: [f32; 3] = [0.0, 1.0, 0.0];
    const DOWN: [f32; 3] = [0.0, -1.0, 0.0];

    #[rustfmt::skip]
    let vertices = vec![
        // front
        v([-0.5, -0.5, 0.5], [0.0, 0.0], FRONT),
        v([ 0.5, -0.5, 0.5], [1.0, 0.0], FRONT),
        v([ 0.5,  2.0, 0.5], [1.0, 1.0], FRONT),
        v([-0.5,  2.0, 0.5], [0.0, 1.0], FRONT),
        // right
        v([0.5,  2.0, 0.5], [0.0, 0.0], RIGHT),
        v([0.5,  2.0, 0.4], [1.0, 0.0], RIGHT),
        v([0.5, -0.5, 0.4], [1.0, 1.0], RIGHT),
        v([0.5, -0.5, 0.5], [0.0, 1.0], RIGHT),
        // back
        v([-0.5, -0.5, 0.4], [0.0, 0.0], BACK),
        v([ 0.5, -0.5, 0.4], [1.0, 0.0], BACK),
        v([ 0.5,  2.0, 0.4], [1.0, 1.0], BACK),
        v([-0.5,  2.0, 0.4], [0.0, 1.0], BACK),
        // left
        v([-0.5, -0.5, 0.4], [0.0, 0.0], LEFT),
        v([-0.5, -0.5, 0.5], [1.0, 0.0], LEFT),
        v([-0.5,  2.0, 0.5], [1.0, 1.0], LEFT),
        v([-0.5,  2.0, 0.4], [0.0, 1.0], LEFT),
        // top
        v([ 0.5, 2.0, 0.5], [0.0, 0.0], UP),
        v([-0.5, 2.0, 0.5], [1.0, 0.0], UP),
        v([-0.5, 2.0, 0.4], [1.0, 1.0], UP),
        v([ 0.5, 2.0, 0.4], [0.0, 1.0], UP),
        // bottom
        v([-0.5, -0.5, 0.4], [0.0, 0.0], DOWN),
        v([ 0.5, -0.5, 0.4], [1.0, 0.0], DOWN),
        v([ 0.5, -0.5, 0.5], [1.0, 1.0], DOWN),
        v([-0.5, -0.5, 0.5], [0.0, 1.0], DOWN),
    ];
    #[rustfmt::skip]
    let indices = vec![
        0, 1, 2, 0, 2, 3,         // front
        4, 5, 6, 4, 6, 7,         // right
        8, 9, 10, 8, 10, 11,      // back
        12, 14, 13, 12, 15, 14,   // left
        16, 18, 17, 16, 19, 18,   // top
        20, 22, 21, 20, 23, 22,   // bottom
    ];
    MeshData { vertices, indices }
}

/// 100x100 ground quad at y = -0.5. The texture repeats 50 times per side.
pub fn textured_plane() -> MeshData {
    const UP: [f32; 3] = [0.0, 1.0, 0.0];
    let vertices = vec![
        v([-50.0, -0.5, -50.0], [0.0, 0.0], UP),
        v([50.0, -0.5, -50.0], [50.0, 0.0], UP),
        v([50.0, -0.5, 50.0], [50.0, 50.0], UP),
        v([-50.0, -0.5, 50.0], [0.0, 50.0], UP),
    ];
    let indices = vec![0, 2, 1, 0, 3, 2];
    MeshData { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_indices_in_range(mesh: &MeshData) {
        let len = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < len));
        assert_eq!(mesh.indices.len() % 3, 0);
    }

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        let layout = Vertex::layout();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes[1].offset, 12);
        assert_eq!(layout.attributes[2].offset, 20);
    }

    #[test]
    fn cube_counts() {
        let cube = textured_cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.index_count(), 36);
        assert_indices_in_range(&cube);
    }

    #[test]
    fn cube_spans_its_slab() {
        let cube = textured_cube();
        let (mut min, mut max) = ([f32::MAX; 3], [f32::MIN; 3]);
        for vertex in &cube.vertices {
            for axis in 0..3 {
                min[axis] = min[axis].min(vertex.position[axis]);
                max[axis] = max[axis].max(vertex.position[axis]);
            }
        }
        assert_eq!(min, [-0.5, -0.5, 0.4]);
        assert_eq!(max, [0.5, 2.0, 0.5]);
    }

    #[test]
    fn cube_normals_are_unit_axes() {
        for vertex in textured_cube().vertices {
            let [x, y, z] = vertex.normal;
            assert_eq!(x.abs() + y.abs() + z.abs(), 1.0);
        }
    }

    #[test]
    fn plane_counts() {
        let plane = textured_plane();
        assert_eq!(plane.vertices.len(), 4);
        assert_eq!(plane.index_count(), 6);
        assert_indices_in_range(&plane);
        assert!(plane.vertices.iter().all(|v| v.position[1] == -0.5));
    }
}
