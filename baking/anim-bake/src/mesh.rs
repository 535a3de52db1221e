//! Source and baked mesh descriptions

use glam::{Vec2, Vec3, Vec4};

use crate::bounds::{Aabb, calculate_aabb};
use crate::error::{BakeError, Result};
use crate::skeleton::BoneBinding;

/// Number of texture coordinate channels carried by a mesh
pub const UV_CHANNEL_COUNT: usize = 8;

/// Channel receiving the bind-space bone anchor `(x, y)`
pub const SKIN_OFFSET_CHANNEL: usize = 2;

/// Channel receiving `(z, bone row coordinate)`
pub const SKIN_BONE_CHANNEL: usize = 3;

/// Texture coordinate channels; an empty channel is absent
pub type UvChannels = [Vec<Vec2>; UV_CHANNEL_COUNT];

/// Primitive topology of a submesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Triangles,
    Quads,
    Lines,
    LineStrip,
    Points,
}

impl Topology {
    /// Index count must be a multiple of this
    pub fn primitive_size(self) -> usize {
        match self {
            Self::Triangles => 3,
            Self::Quads => 4,
            Self::Lines => 2,
            Self::LineStrip | Self::Points => 1,
        }
    }
}

/// Opaque material reference, resolved by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    pub topology: Topology,
    pub indices: Vec<u32>,
}

impl SubMesh {
    pub fn new(topology: Topology, indices: Vec<u32>) -> Self {
        Self { topology, indices }
    }
}

/// A skinned mesh as handed over by the host
///
/// Optional vertex channels are empty when absent. Each vertex is influenced
/// by exactly one bone, named by `bone_indices` as an index into `bones`.
#[derive(Debug, Clone, Default)]
pub struct SourceMesh {
    pub name: String,
    pub bones: Vec<BoneBinding>,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec4>,
    pub colors: Vec<Vec4>,
    pub uvs: UvChannels,
    pub bone_indices: Vec<u32>,
    pub submeshes: Vec<SubMesh>,
    pub materials: Vec<MaterialId>,
}

impl SourceMesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Check the mesh for inconsistencies that would corrupt a bake
    pub fn validate(&self) -> Result<()> {
        let count = self.vertex_count();

        if self.bone_indices.len() != count {
            return Err(BakeError::InvalidInput(format!(
                "mesh '{}': {} bone indices for {} vertices",
                self.name,
                self.bone_indices.len(),
                count
            )));
        }
        if let Some((vertex, bone)) = self
            .bone_indices
            .iter()
            .enumerate()
            .find(|(_, bone)| **bone as usize >= self.bones.len())
        {
            return Err(BakeError::InvalidInput(format!(
                "mesh '{}': vertex {} references bone {} but the mesh has {} bones",
                self.name,
                vertex,
                bone,
                self.bones.len()
            )));
        }

        self.check_channel("normals", self.normals.len())?;
        self.check_channel("tangents", self.tangents.len())?;
        self.check_channel("colors", self.colors.len())?;
        for (channel, uv) in self.uvs.iter().enumerate() {
            self.check_channel(&format!("uv{channel}"), uv.len())?;
        }

        for (index, submesh) in self.submeshes.iter().enumerate() {
            if submesh.indices.len() % submesh.topology.primitive_size() != 0 {
                return Err(BakeError::InvalidInput(format!(
                    "mesh '{}': submesh {} has {} indices, not a multiple of {:?} primitives",
                    self.name,
                    index,
                    submesh.indices.len(),
                    submesh.topology
                )));
            }
            if let Some(bad) = submesh.indices.iter().find(|i| **i as usize >= count) {
                return Err(BakeError::InvalidInput(format!(
                    "mesh '{}': submesh {} references vertex {} of {}",
                    self.name, index, bad, count
                )));
            }
        }

        if self.materials.len() != self.submeshes.len() {
            return Err(BakeError::InvalidInput(format!(
                "mesh '{}': {} materials for {} submeshes",
                self.name,
                self.materials.len(),
                self.submeshes.len()
            )));
        }

        Ok(())
    }

    fn check_channel(&self, channel: &str, len: usize) -> Result<()> {
        if len != 0 && len != self.vertex_count() {
            return Err(BakeError::InvalidInput(format!(
                "mesh '{}': {} has {} entries for {} vertices",
                self.name,
                channel,
                len,
                self.vertex_count()
            )));
        }
        Ok(())
    }
}

/// Per-vertex skinning data packed into the two skin channels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinVertex {
    /// Bind-space anchor of the vertex's bone
    pub offset: Vec3,
    /// Normalized row of the bone inside its clip region
    pub bone_coord: f32,
}

impl SkinVertex {
    /// Split into the values of [`SKIN_OFFSET_CHANNEL`] and [`SKIN_BONE_CHANNEL`]
    pub fn to_channels(self) -> (Vec2, Vec2) {
        (
            Vec2::new(self.offset.x, self.offset.y),
            Vec2::new(self.offset.z, self.bone_coord),
        )
    }

    pub fn from_channels(offset_xy: Vec2, offset_z_coord: Vec2) -> Self {
        Self {
            offset: Vec3::new(offset_xy.x, offset_xy.y, offset_z_coord.x),
            bone_coord: offset_z_coord.y,
        }
    }
}

/// Static mesh annotated for vertex-shader skinning
///
/// Created once by the bake and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedMesh {
    name: String,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    tangents: Vec<Vec4>,
    colors: Vec<Vec4>,
    uvs: UvChannels,
    submeshes: Vec<SubMesh>,
    materials: Vec<MaterialId>,
    bounds: Aabb,
}

impl BakedMesh {
    /// Copy the geometry of `source` and install the skin channels
    pub(crate) fn from_source(
        source: &SourceMesh,
        skin: &[SkinVertex],
        materials: Vec<MaterialId>,
    ) -> Self {
        let mut uvs = source.uvs.clone();
        let (offsets, coords): (Vec<Vec2>, Vec<Vec2>) =
            skin.iter().map(|vertex| vertex.to_channels()).unzip();
        uvs[SKIN_OFFSET_CHANNEL] = offsets;
        uvs[SKIN_BONE_CHANNEL] = coords;

        Self {
            name: format!("{}_Baked", source.name),
            positions: source.positions.clone(),
            normals: source.normals.clone(),
            tangents: source.tangents.clone(),
            colors: source.colors.clone(),
            uvs,
            submeshes: source.submeshes.clone(),
            materials,
            bounds: calculate_aabb(&source.positions).unwrap_or_default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn tangents(&self) -> &[Vec4] {
        &self.tangents
    }

    pub fn colors(&self) -> &[Vec4] {
        &self.colors
    }

    /// Texture coordinates of `channel`; empty when absent
    pub fn uv(&self, channel: usize) -> &[Vec2] {
        self.uvs.get(channel).map_or(&[], Vec::as_slice)
    }

    pub fn uvs(&self) -> &UvChannels {
        &self.uvs
    }

    pub fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }

    pub fn materials(&self) -> &[MaterialId] {
        &self.materials
    }

    /// Bounds of the mesh in its bind pose
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Decode the skin channels of vertex `index`
    pub fn skin_vertex(&self, index: usize) -> Option<SkinVertex> {
        let offset = self.uvs[SKIN_OFFSET_CHANNEL].get(index)?;
        let coord = self.uvs[SKIN_BONE_CHANNEL].get(index)?;
        Some(SkinVertex::from_channels(*offset, *coord))
    }
}
