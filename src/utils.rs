use wgpu::util::DeviceExt;
use bytemuck::NoUninit;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, NoUninit)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub uv: [f32; 2],
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

/// Square plane of edge `size` centred on the origin, lying in y = 0
pub fn create_plane_mesh(size: f32) -> Mesh {
    let h = size / 2.0;
    let vertices = vec![
        Vertex { pos: [-h, 0.0, -h], uv: [0.0, 0.0] },
        Vertex { pos: [-h, 0.0, h], uv: [0.0, 1.0] },
        Vertex { pos: [h, 0.0, h], uv: [1.0, 1.0] },
        Vertex { pos: [h, 0.0, -h], uv: [1.0, 0.0] },
    ];
    let indices = vec![0, 1, 2, 0, 2, 3];

    Mesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn plane_is_flat_and_faces_up() {
        let mesh = create_plane_mesh(10_000.0);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert!(mesh.vertices.iter().all(|v| v.pos[1] == 0.0));
        assert!(mesh.vertices.iter().all(|v| v.pos[0].abs() == 5_000.0 && v.pos[2].abs() == 5_000.0));

        // Counter-clockwise seen from above
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.vertices[i as usize].pos));
            let normal = (b - a).cross(c - a);
            assert!(normal.y > 0.0);
        }
    }
}
