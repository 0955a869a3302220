//! Static meshes: the tessellated display grid and the fullscreen quad.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Display grid vertex: `(x, z)` on the ground plane plus heightmap `(u, v)`.
/// Height is looked up in the vertex shader, never stored.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GridVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl GridVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GridVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Clip-space vertex of the simulation quad
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
}

impl QuadVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Quad covering the whole render target
pub const FULLSCREEN_QUAD: [QuadVertex; 4] = [
    QuadVertex { position: [-1.0, -1.0] }, // bottom left
    QuadVertex { position: [1.0, -1.0] },  // bottom right
    QuadVertex { position: [1.0, 1.0] },   // top right
    QuadVertex { position: [-1.0, 1.0] },  // top left
];

pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Regular `grid_size × grid_size` grid on the XZ plane
#[derive(Debug, Clone)]
pub struct GridMesh {
    pub vertices: Vec<GridVertex>,
    pub indices: Vec<u32>,
}

impl GridMesh {
    /// Grid of side `extent` centred on the origin; `uv` spans `[0, 1]` so that
    /// vertex `(i, j)` samples field texel `(i, j)`
    pub fn new(grid_size: u32, extent: f32) -> Self {
        let n = grid_size as usize;
        let last = (n - 1) as f32;
        let half = extent / 2.0;

        let mut vertices = Vec::with_capacity(n * n);
        for z in 0..n {
            for x in 0..n {
                let u = x as f32 / last;
                let v = z as f32 / last;
                vertices.push(GridVertex {
                    position: [u * extent - half, v * extent - half],
                    uv: [u, v],
                });
            }
        }

        // Two triangles per cell, counter-clockwise seen from +Y
        let mut indices = Vec::with_capacity((n - 1) * (n - 1) * 6);
        for z in 0..n - 1 {
            for x in 0..n - 1 {
                let top_left = (z * n + x) as u32;
                let top_right = top_left + 1;
                let bottom_left = ((z + 1) * n + x) as u32;
                let bottom_right = bottom_left + 1;

                indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_right,
                    top_right,
                    bottom_left,
                    bottom_right,
                ]);
            }
        }

        Self { vertices, indices }
    }
}

/// Vertex + index buffers uploaded once at startup
pub struct MeshBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffers {
    pub fn upload<V: Pod>(
        device: &wgpu::Device,
        label: &str,
        vertices: &[V],
        indices: &[u32],
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    pub fn grid(device: &wgpu::Device, mesh: &GridMesh) -> Self {
        Self::upload(device, "Grid", &mesh.vertices, &mesh.indices)
    }

    pub fn fullscreen_quad(device: &wgpu::Device) -> Self {
        Self::upload(device, "Fullscreen Quad", &FULLSCREEN_QUAD, &QUAD_INDICES)
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_counts() {
        let mesh = GridMesh::new(50, 4.0);

        // Check vertex count: grid_size^2
        assert_eq!(mesh.vertices.len(), 50 * 50);

        // Check index count: (grid_size - 1)^2 cells * 2 triangles * 3 indices
        assert_eq!(mesh.indices.len(), 49 * 49 * 6);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn test_grid_spans_extent_and_uv() {
        let mesh = GridMesh::new(5, 4.0);
        let first = mesh.vertices[0];
        let last = mesh.vertices[24];
        assert_eq!(first.position, [-2.0, -2.0]);
        assert_eq!(first.uv, [0.0, 0.0]);
        assert_eq!(last.position, [2.0, 2.0]);
        assert_eq!(last.uv, [1.0, 1.0]);

        // Vertex (i, j) maps onto texel (i, j)
        let v = mesh.vertices[2 * 5 + 3];
        assert_eq!((v.uv[0] * 4.0).round() as u32, 3);
        assert_eq!((v.uv[1] * 4.0).round() as u32, 2);
    }

    #[test]
    fn test_quad_triangles_cover_clip_space() {
        let area: f32 = QUAD_INDICES
            .chunks(3)
            .map(|tri| {
                let [a, b, c] =
                    [tri[0], tri[1], tri[2]].map(|i| FULLSCREEN_QUAD[i as usize].position);
                ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])).abs() / 2.0
            })
            .sum();
        assert_eq!(area, 4.0);
    }
}
