//! Primitive meshes the scene is built from.
//!
//! All shapes are unit sized around the origin so draw transforms alone set
//! their placement: the cube and square span `[-1, 1]`, the sphere has radius
//! 1, and the capped cylinder has radius 1 and runs along Z over `[-0.5, 0.5]`.

use bytemuck::{Pod, Zeroable};

/// Shape a draw call refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Cube,
    Sphere,
    Square,
    Cylinder,
}

impl MeshKind {
    pub const ALL: [MeshKind; 4] = [
        MeshKind::Cube,
        MeshKind::Sphere,
        MeshKind::Square,
        MeshKind::Cylinder,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MeshKind::Cube => "cube",
            MeshKind::Sphere => "sphere",
            MeshKind::Square => "square",
            MeshKind::Cylinder => "cylinder",
        }
    }

    /// Build the CPU-side geometry.
    pub fn build(self) -> MeshData {
        match self {
            MeshKind::Cube => cube(),
            MeshKind::Sphere => uv_sphere(16, 24),
            MeshKind::Square => square(),
            MeshKind::Cylinder => capped_cylinder(24),
        }
    }
}

/// Position + normal vertex, 24 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

static_assertions::assert_eq_size!(MeshVertex, [u8; 24]);

/// Indexed triangle list.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push(&mut self, position: [f32; 3], normal: [f32; 3]) -> u32 {
        self.vertices.push(MeshVertex { position, normal });
        (self.vertices.len() - 1) as u32
    }
}

fn cube() -> MeshData {
    // (normal, u, v) with u × v = normal so corners wind counter-clockwise.
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
    ];

    let mut mesh = MeshData::default();
    for (n, u, v) in FACES {
        let corner = |su: f32, sv: f32| {
            [
                n[0] + su * u[0] + sv * v[0],
                n[1] + su * u[1] + sv * v[1],
                n[2] + su * u[2] + sv * v[2],
            ]
        };
        let a = mesh.push(corner(-1.0, -1.0), n);
        let b = mesh.push(corner(1.0, -1.0), n);
        let c = mesh.push(corner(1.0, 1.0), n);
        let d = mesh.push(corner(-1.0, 1.0), n);
        mesh.indices.extend_from_slice(&[a, b, c, a, c, d]);
    }
    mesh
}

fn square() -> MeshData {
    let n = [0.0, 0.0, 1.0];
    let mut mesh = MeshData::default();
    mesh.push([-1.0, -1.0, 0.0], n);
    mesh.push([1.0, -1.0, 0.0], n);
    mesh.push([1.0, 1.0, 0.0], n);
    mesh.push([-1.0, 1.0, 0.0], n);
    mesh.indices = vec![0, 1, 2, 0, 2, 3];
    mesh
}

fn uv_sphere(rings: u32, segments: u32) -> MeshData {
    use std::f32::consts::{PI, TAU};

    let mut mesh = MeshData::default();
    for i in 0..=rings {
        let theta = PI * i as f32 / rings as f32;
        for j in 0..=segments {
            let phi = TAU * j as f32 / segments as f32;
            let p = [theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()];
            mesh.push(p, p);
        }
    }

    let stride = segments + 1;
    for i in 0..rings {
        for j in 0..segments {
            let a = i * stride + j;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            mesh.indices.extend_from_slice(&[a, b, c, b, d, c]);
        }
    }
    mesh
}

fn capped_cylinder(segments: u32) -> MeshData {
    use std::f32::consts::TAU;

    let mut mesh = MeshData::default();
    let ring = |j: u32| {
        let phi = TAU * j as f32 / segments as f32;
        (phi.cos(), phi.sin())
    };

    // Side wall: bottom and top rings share a column per segment.
    for j in 0..=segments {
        let (x, y) = ring(j);
        mesh.push([x, y, -0.5], [x, y, 0.0]);
        mesh.push([x, y, 0.5], [x, y, 0.0]);
    }
    for j in 0..segments {
        let a = 2 * j;
        let c = a + 1;
        let b = a + 2;
        let d = a + 3;
        mesh.indices.extend_from_slice(&[a, b, c, b, d, c]);
    }

    for (z, nz) in [(0.5_f32, 1.0_f32), (-0.5, -1.0)] {
        let normal = [0.0, 0.0, nz];
        let center = mesh.push([0.0, 0.0, z], normal);
        let first = center + 1;
        for j in 0..=segments {
            let (x, y) = ring(j);
            mesh.push([x, y, z], normal);
        }
        for j in 0..segments {
            let (r0, r1) = (first + j, first + j + 1);
            if nz > 0.0 {
                mesh.indices.extend_from_slice(&[center, r0, r1]);
            } else {
                mesh.indices.extend_from_slice(&[center, r1, r0]);
            }
        }
    }
    mesh
}
