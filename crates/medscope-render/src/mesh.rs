//! CPU-side triangle meshes and a few procedural shapes.

use glam::Vec3;
use medscope_core::Axis;

/// Interleaved vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
}

impl Vertex {
    /// Vertex buffer layout matching `mesh.wgsl`.
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }

    /// Returns the buffer layout descriptor.
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// Vertices.
    pub vertices: Vec<Vertex>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Returns the number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns the axis-aligned bounds, or `None` for an empty mesh.
    #[must_use]
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self.vertices.iter().map(|v| Vec3::from_array(v.position));
        let first = points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Returns the area-weighted surface centroid in object space.
    ///
    /// Degenerate meshes fall back to the vertex mean.
    #[must_use]
    pub fn center_of_mass(&self) -> Vec3 {
        let mut weighted = Vec3::ZERO;
        let mut total = 0.0;
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from_array(self.vertices[i as usize].position));
            let area = 0.5 * (b - a).cross(c - a).length();
            weighted += area * (a + b + c) / 3.0;
            total += area;
        }
        if total > f32::EPSILON {
            return weighted / total;
        }
        if self.vertices.is_empty() {
            return Vec3::ZERO;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.vertices.len() as f32;
        self.vertices
            .iter()
            .map(|v| Vec3::from_array(v.position))
            .sum::<Vec3>()
            / count
    }

    fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3) {
        #[allow(clippy::cast_possible_truncation)]
        let base = self.vertices.len() as u32;
        self.vertices
            .extend(corners.iter().map(|&p| Vertex::new(p, normal)));
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Axis-aligned box centered at the origin.
    #[must_use]
    pub fn cuboid(half_extents: Vec3) -> Self {
        let mut mesh = Self::default();
        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            for sign in [1.0, -1.0] {
                let n = axis * sign;
                let (u, v) = tangents(n);
                let c = n * half_extents;
                let du = u * half_extents;
                let dv = v * half_extents;
                mesh.push_quad([c - du - dv, c + du - dv, c + du + dv, c - du + dv], n);
            }
        }
        mesh
    }

    /// Unit square spanning `[0, 1]` in the two axes orthogonal to `normal`.
    ///
    /// This is the local frame clip planes slide in.
    #[must_use]
    pub fn unit_quad(normal: Axis) -> Self {
        let n = normal.direction();
        let (u, v) = tangents(n);
        let (u, v) = (u.abs(), v.abs());
        let mut mesh = Self::default();
        mesh.push_quad([Vec3::ZERO, u, u + v, v], n);
        mesh
    }

    /// UV sphere centered at the origin.
    #[must_use]
    pub fn uv_sphere(radius: f32, stacks: u32, slices: u32) -> Self {
        let stacks = stacks.max(2);
        let slices = slices.max(3);
        let mut mesh = Self::default();
        for i in 0..=stacks {
            #[allow(clippy::cast_precision_loss)]
            let phi = std::f32::consts::PI * i as f32 / stacks as f32;
            for j in 0..=slices {
                #[allow(clippy::cast_precision_loss)]
                let theta = std::f32::consts::TAU * j as f32 / slices as f32;
                let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                mesh.vertices.push(Vertex::new(n * radius, n));
            }
        }
        let row = slices + 1;
        for i in 0..stacks {
            for j in 0..slices {
                let a = i * row + j;
                let b = a + row;
                mesh.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        mesh
    }

    /// Torus around `axis`, used for rotation handles.
    #[must_use]
    pub fn ring(axis: Axis, radius: f32, tube: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let sides = 8;
        let n = axis.direction();
        let (u, v) = tangents(n);
        let mut mesh = Self::default();
        for i in 0..=segments {
            #[allow(clippy::cast_precision_loss)]
            let theta = std::f32::consts::TAU * i as f32 / segments as f32;
            let radial = u * theta.cos() + v * theta.sin();
            let center = radial * radius;
            for j in 0..=sides {
                #[allow(clippy::cast_precision_loss)]
                let psi = std::f32::consts::TAU * j as f32 / sides as f32;
                let normal = radial * psi.cos() + n * psi.sin();
                mesh.vertices.push(Vertex::new(center + normal * tube, normal));
            }
        }
        let row = sides + 1;
        for i in 0..segments {
            for j in 0..sides {
                let a = i * row + j;
                let b = a + row;
                mesh.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        mesh
    }
}

/// Two unit vectors spanning the plane orthogonal to an axis-aligned `n`.
fn tangents(n: Vec3) -> (Vec3, Vec3) {
    let a = n.abs();
    if a.x > 0.5 {
        (Vec3::Y * n.x.signum(), Vec3::Z)
    } else if a.y > 0.5 {
        (Vec3::Z * n.y.signum(), Vec3::X)
    } else {
        (Vec3::X * n.z.signum(), Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_shape() {
        let mesh = MeshData::cuboid(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        let (lo, hi) = mesh.bounds().unwrap();
        assert_eq!(lo, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(hi, Vec3::new(1.0, 2.0, 3.0));
        assert!(mesh.center_of_mass().length() < 1e-5);
    }

    #[test]
    fn test_unit_quad_lies_on_axis_plane() {
        let mesh = MeshData::unit_quad(Axis::Z);
        assert!(mesh.vertices.iter().all(|v| v.position[2] == 0.0));
        let (lo, hi) = mesh.bounds().unwrap();
        assert_eq!(lo, Vec3::ZERO);
        assert_eq!(hi, Vec3::new(1.0, 1.0, 0.0));
        assert!((mesh.center_of_mass() - Vec3::new(0.5, 0.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_sphere_normals_are_unit() {
        let mesh = MeshData::uv_sphere(2.0, 8, 12);
        for v in &mesh.vertices {
            assert!((Vec3::from_array(v.normal).length() - 1.0).abs() < 1e-5);
            assert!((Vec3::from_array(v.position).length() - 2.0).abs() < 1e-5);
        }
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn test_ring_surrounds_axis() {
        let mesh = MeshData::ring(Axis::X, 1.0, 0.05, 32);
        let (lo, hi) = mesh.bounds().unwrap();
        assert!(hi.x <= 0.05 + 1e-5 && lo.x >= -0.05 - 1e-5);
        assert!(hi.y > 1.0 && hi.z > 1.0);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = MeshData::default();
        assert!(mesh.bounds().is_none());
        assert_eq!(mesh.center_of_mass(), Vec3::ZERO);
    }

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
    }
}
