//! Per-vertex bind encoding
//!
//! Every vertex of a baked mesh carries the data a vertex shader needs to find
//! its bone inside a clip region: the bind-space anchor of the bone and the
//! normalized row of the bone's position texel.
//!
//! A clip region is `2 * bone_count` texels high, position rows first and
//! rotation rows after them. The row coordinate is therefore normalized
//! against the full region height:
//!
//! ```text
//! coord = 0.5 * (index + 0.5) / bone_count
//!       = (index + 0.5) / (2 * bone_count)
//! ```
//!
//! which lands on the center of the bone's position row. The rotation row is
//! found by adding `0.5`.

use std::collections::HashMap;

use log::debug;

use crate::error::{BakeError, Result};
use crate::mesh::{BakedMesh, MaterialId, SkinVertex, SourceMesh};
use crate::skeleton::{BoneIndexMap, Skeleton};

/// Normalized region row of the position texel of bone `index`
pub fn bone_row_coord(index: usize, bone_count: usize) -> f32 {
    0.5 * ((index as f32 + 0.5) / bone_count as f32)
}

/// Region row (in texels) addressed by a normalized row coordinate
pub fn row_from_coord(coord: f32, bone_count: usize) -> usize {
    (coord * (2 * bone_count) as f32).floor() as usize
}

/// Produces baked meshes against a merged skeleton
#[derive(Debug, Clone, Copy)]
pub struct BindEncoder<'a> {
    skeleton: &'a Skeleton,
    material_remap: &'a HashMap<MaterialId, MaterialId>,
}

impl<'a> BindEncoder<'a> {
    pub fn new(skeleton: &'a Skeleton, material_remap: &'a HashMap<MaterialId, MaterialId>) -> Self {
        Self {
            skeleton,
            material_remap,
        }
    }

    /// Skin data of every vertex of `mesh`
    pub fn skin_vertices(&self, mesh: &SourceMesh, map: &BoneIndexMap) -> Result<Vec<SkinVertex>> {
        let bone_count = self.skeleton.len();

        mesh.bone_indices
            .iter()
            .enumerate()
            .map(|(vertex, local)| {
                let global = map.get(*local as usize).ok_or_else(|| {
                    BakeError::InvalidInput(format!(
                        "mesh '{}': vertex {} references bone {} absent from its bone list",
                        mesh.name, vertex, local
                    ))
                })?;
                let offset = self.skeleton.bind_position(global).ok_or_else(|| {
                    BakeError::InternalError(format!(
                        "bone index {global} outside a skeleton of {bone_count} bones"
                    ))
                })?;
                Ok(SkinVertex {
                    offset,
                    bone_coord: bone_row_coord(global, bone_count),
                })
            })
            .collect()
    }

    /// Material after remapping, unchanged when the table has no entry
    pub fn remap_material(&self, material: MaterialId) -> MaterialId {
        self.material_remap
            .get(&material)
            .copied()
            .unwrap_or(material)
    }

    /// Build the baked snapshot of `mesh`
    pub fn encode(&self, mesh: &SourceMesh, map: &BoneIndexMap) -> Result<BakedMesh> {
        let skin = self.skin_vertices(mesh, map)?;
        let materials = mesh
            .materials
            .iter()
            .map(|material| self.remap_material(*material))
            .collect();

        debug!(
            "Encoded mesh '{}': {} vertices, {} submeshes",
            mesh.name,
            mesh.vertex_count(),
            mesh.submeshes.len()
        );

        Ok(BakedMesh::from_source(mesh, &skin, materials))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{SKIN_BONE_CHANNEL, SKIN_OFFSET_CHANNEL, SubMesh, Topology};
    use crate::skeleton::{BoneBinding, BoneId, SkeletonBuilder};
    use glam::{Mat4, Vec2, Vec3};
    use test_case::test_case;

    fn bound(raw: u64, origin: Vec3) -> BoneBinding {
        BoneBinding::new(BoneId::new(raw), Mat4::from_translation(origin).inverse())
    }

    fn two_bone_mesh() -> SourceMesh {
        let mut mesh = SourceMesh::new("arm");
        mesh.bones = vec![bound(10, Vec3::ZERO), bound(11, Vec3::new(0.0, 2.0, 0.0))];
        mesh.positions = vec![Vec3::ZERO, Vec3::X, Vec3::new(0.0, 2.0, 0.0)];
        mesh.bone_indices = vec![0, 0, 1];
        mesh.uvs[0] = vec![Vec2::ZERO, Vec2::X, Vec2::Y];
        mesh.uvs[SKIN_OFFSET_CHANNEL] = vec![Vec2::splat(9.0); 3];
        mesh.submeshes = vec![SubMesh::new(Topology::Triangles, vec![0, 1, 2])];
        mesh.materials = vec![MaterialId(3)];
        mesh
    }

    #[test_case(0, 2 => 0.125 ; "first of two")]
    #[test_case(1, 2 => 0.375 ; "second of two")]
    #[test_case(0, 1 => 0.25 ; "single bone")]
    fn test_bone_row_coord(index: usize, count: usize) -> f32 {
        bone_row_coord(index, count)
    }

    #[test]
    fn test_row_coord_hits_position_and_rotation_rows() {
        let count = 5;
        for index in 0..count {
            let coord = bone_row_coord(index, count);
            assert_eq!(row_from_coord(coord, count), index);
            assert_eq!(row_from_coord(coord + 0.5, count), index + count);
        }
    }

    #[test]
    fn test_encode_writes_skin_channels() {
        let mesh = two_bone_mesh();
        let mut builder = SkeletonBuilder::new();
        builder.add_mesh(&mesh.bones);
        let (skeleton, maps) = builder.build();
        let remap = HashMap::new();

        let baked = BindEncoder::new(&skeleton, &remap)
            .encode(&mesh, &maps[0])
            .unwrap();

        assert_eq!(baked.name(), "arm_Baked");
        assert_eq!(baked.uv(0), mesh.uvs[0].as_slice());
        assert_eq!(baked.uv(SKIN_OFFSET_CHANNEL)[2], Vec2::new(0.0, 2.0));
        assert_eq!(baked.uv(SKIN_BONE_CHANNEL)[2], Vec2::new(0.0, 0.375));

        let skin = baked.skin_vertex(0).unwrap();
        assert_eq!(skin.offset, Vec3::ZERO);
        assert_eq!(skin.bone_coord, 0.125);
        assert_eq!(baked.materials(), &[MaterialId(3)]);
        assert_eq!(mesh.uvs[SKIN_OFFSET_CHANNEL][0], Vec2::splat(9.0));
    }

    #[test]
    fn test_material_remap() {
        let mesh = two_bone_mesh();
        let mut builder = SkeletonBuilder::new();
        builder.add_mesh(&mesh.bones);
        let (skeleton, maps) = builder.build();
        let remap = HashMap::from([(MaterialId(3), MaterialId(30))]);

        let baked = BindEncoder::new(&skeleton, &remap)
            .encode(&mesh, &maps[0])
            .unwrap();
        assert_eq!(baked.materials(), &[MaterialId(30)]);
    }

    #[test]
    fn test_shared_skeleton_coordinates() {
        let first = two_bone_mesh();
        let mut second = SourceMesh::new("hand");
        second.bones = vec![bound(12, Vec3::new(0.0, 3.0, 0.0)), bound(11, Vec3::new(0.0, 2.0, 0.0))];
        second.positions = vec![Vec3::ZERO, Vec3::ONE];
        second.bone_indices = vec![0, 1];

        let mut builder = SkeletonBuilder::new();
        builder.add_mesh(&first.bones);
        builder.add_mesh(&second.bones);
        let (skeleton, maps) = builder.build();
        let remap = HashMap::new();

        let baked = BindEncoder::new(&skeleton, &remap)
            .encode(&second, &maps[1])
            .unwrap();
        assert_eq!(baked.skin_vertex(0).unwrap().bone_coord, bone_row_coord(2, 3));
        assert_eq!(baked.skin_vertex(1).unwrap().bone_coord, bone_row_coord(1, 3));
    }

    #[test]
    fn test_unmapped_bone_is_invalid_input() {
        let mut mesh = two_bone_mesh();
        mesh.bone_indices[1] = 5;
        let mut builder = SkeletonBuilder::new();
        builder.add_mesh(&mesh.bones);
        let (skeleton, maps) = builder.build();
        let remap = HashMap::new();

        let result = BindEncoder::new(&skeleton, &remap).encode(&mesh, &maps[0]);
        assert!(matches!(result, Err(BakeError::InvalidInput(_))));
    }
}
