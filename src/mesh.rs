//! Static grid meshes. The ocean mesh stays flat on the CPU; animation comes
//! entirely from the baked displacement map sampled in the vertex stage.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Vertex data for grid meshes (position + UV coordinates)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };
}

/// Flat XZ grid centered at the origin, UVs spanning [0,1]
pub struct GridMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl GridMesh {
    /// `extent_m` is the side length; `tessellation` the subdivisions per side.
    pub fn new(extent_m: f32, tessellation: usize) -> Self {
        let n = tessellation;
        let spacing = extent_m / n as f32;
        let half = extent_m / 2.0;

        let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
        for z in 0..=n {
            for x in 0..=n {
                vertices.push(Vertex {
                    position: [x as f32 * spacing - half, 0.0, z as f32 * spacing - half],
                    uv: [x as f32 / n as f32, z as f32 / n as f32],
                });
            }
        }

        // Counter-clockwise winding, two triangles per cell
        let mut indices = Vec::with_capacity(n * n * 6);
        for z in 0..n {
            for x in 0..n {
                let top_left = (z * (n + 1) + x) as u32;
                let top_right = top_left + 1;
                let bottom_left = ((z + 1) * (n + 1) + x) as u32;
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

    /// Upload to GPU buffers
    pub fn upload(&self, device: &wgpu::Device, label: &str) -> GpuMesh {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

/// Uploaded mesh, ready to bind in a render pass
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_mesh_counts() {
        let mesh = GridMesh::new(100.0, 16);

        // (tessellation + 1)^2 vertices, tessellation^2 * 2 triangles
        assert_eq!(mesh.vertices.len(), 17 * 17);
        assert_eq!(mesh.indices.len(), 16 * 16 * 6);
    }

    #[test]
    fn test_grid_mesh_is_centered_and_flat() {
        let mesh = GridMesh::new(50.0, 4);
        for v in &mesh.vertices {
            assert_eq!(v.position[1], 0.0);
            assert!(v.position[0].abs() <= 25.0 + 1e-4);
            assert!(v.position[2].abs() <= 25.0 + 1e-4);
        }
        assert_eq!(mesh.vertices.first().unwrap().uv, [0.0, 0.0]);
        assert_eq!(mesh.vertices.last().unwrap().uv, [1.0, 1.0]);
    }
}
