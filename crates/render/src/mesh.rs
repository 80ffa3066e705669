use bubble_ecs::MeshHandle;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Indexed triangle list.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl Mesh {
    /// Unit cube centred on the origin, counter-clockwise outward faces.
    pub fn unit_cube() -> Self {
        let p = 0.5_f32;
        #[rustfmt::skip]
        let vertices = vec![
            // +Z face
            Vertex { position: [-p, -p,  p], normal: [0.0, 0.0, 1.0] },
            Vertex { position: [ p, -p,  p], normal: [0.0, 0.0, 1.0] },
            Vertex { position: [ p,  p,  p], normal: [0.0, 0.0, 1.0] },
            Vertex { position: [-p,  p,  p], normal: [0.0, 0.0, 1.0] },
            // -Z face
            Vertex { position: [ p, -p, -p], normal: [0.0, 0.0, -1.0] },
            Vertex { position: [-p, -p, -p], normal: [0.0, 0.0, -1.0] },
            Vertex { position: [-p,  p, -p], normal: [0.0, 0.0, -1.0] },
            Vertex { position: [ p,  p, -p], normal: [0.0, 0.0, -1.0] },
            // +X face
            Vertex { position: [ p, -p,  p], normal: [1.0, 0.0, 0.0] },
            Vertex { position: [ p, -p, -p], normal: [1.0, 0.0, 0.0] },
            Vertex { position: [ p,  p, -p], normal: [1.0, 0.0, 0.0] },
            Vertex { position: [ p,  p,  p], normal: [1.0, 0.0, 0.0] },
            // -X face
            Vertex { position: [-p, -p, -p], normal: [-1.0, 0.0, 0.0] },
            Vertex { position: [-p, -p,  p], normal: [-1.0, 0.0, 0.0] },
            Vertex { position: [-p,  p,  p], normal: [-1.0, 0.0, 0.0] },
            Vertex { position: [-p,  p, -p], normal: [-1.0, 0.0, 0.0] },
            // +Y face
            Vertex { position: [-p,  p,  p], normal: [0.0, 1.0, 0.0] },
            Vertex { position: [ p,  p,  p], normal: [0.0, 1.0, 0.0] },
            Vertex { position: [ p,  p, -p], normal: [0.0, 1.0, 0.0] },
            Vertex { position: [-p,  p, -p], normal: [0.0, 1.0, 0.0] },
            // -Y face
            Vertex { position: [-p, -p, -p], normal: [0.0, -1.0, 0.0] },
            Vertex { position: [ p, -p, -p], normal: [0.0, -1.0, 0.0] },
            Vertex { position: [ p, -p,  p], normal: [0.0, -1.0, 0.0] },
            Vertex { position: [-p, -p,  p], normal: [0.0, -1.0, 0.0] },
        ];
        #[rustfmt::skip]
        let indices: Vec<u16> = vec![
            0,1,2, 2,3,0,       // +Z
            4,5,6, 6,7,4,       // -Z
            8,9,10, 10,11,8,    // +X
            12,13,14, 14,15,12, // -X
            16,17,18, 18,19,16, // +Y
            20,21,22, 22,23,20, // -Y
        ];
        Self { vertices, indices }
    }

    /// Iterate triangles as vertex index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
    }
}

/// Meshes addressable by [`MeshHandle`]. Starts with the built-in cube.
#[derive(Debug, Clone)]
pub struct MeshLibrary {
    meshes: BTreeMap<MeshHandle, Mesh>,
}

impl MeshLibrary {
    pub fn new() -> Self {
        let mut meshes = BTreeMap::new();
        meshes.insert(MeshHandle::CUBE, Mesh::unit_cube());
        Self { meshes }
    }

    /// Register a mesh under the next free handle.
    pub fn insert(&mut self, mesh: Mesh) -> MeshHandle {
        let next = self
            .meshes
            .keys()
            .next_back()
            .map_or(0, |h| h.0 + 1);
        let handle = MeshHandle(next);
        self.meshes.insert(handle, mesh);
        handle
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(&handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeshHandle, &Mesh)> {
        self.meshes.iter().map(|(h, m)| (*h, m))
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl Default for MeshLibrary {
    fn default() -> Self {
        Self::new()
    }
}
