//! JSON scene files
//!
//! A scene describes one character: its rig, the meshes skinned to it and
//! keyframed clips. Vectors are arrays, quaternions are `[x, y, z, w]`.
//!
//! ```json
//! {
//!   "bones": [
//!     { "id": 1, "name": "hips" },
//!     { "id": 2, "name": "spine", "parent": 0, "translation": [0, 1, 0] }
//!   ],
//!   "meshes": [{
//!     "name": "body",
//!     "bones": [1, 2],
//!     "positions": [[0, 0, 0], [0, 1, 0], [1, 1, 0]],
//!     "bone_indices": [0, 1, 1],
//!     "submeshes": [{ "topology": "triangles", "indices": [0, 1, 2] }],
//!     "materials": [0]
//!   }],
//!   "clips": [{
//!     "name": "bend", "duration": 1.0, "sample_rate": 30,
//!     "tracks": [{ "bone": 2, "rotation": { "times": [0, 1], "values": [[0, 0, 0, 1], [0, 0, 0.7071, 0.7071]] } }]
//!   }]
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anim_bake::{
    AnimationClip, BakeConfig, BoneId, BoneTracks, Interpolation, KeyframeTrack, KeyframedClip,
    MaterialId, Rig, RigBone, SourceMesh, SubMesh, Topology,
};
use anyhow::{Context, Result, bail};
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    #[serde(default)]
    pub root: Transform,
    pub bones: Vec<BoneDef>,
    pub meshes: Vec<MeshDef>,
    pub clips: Vec<ClipDef>,
    #[serde(default)]
    pub material_remap: HashMap<u32, u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Transform {
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: identity_rotation(),
            scale: unit_scale(),
        }
    }
}

impl Transform {
    fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::from(self.scale),
            Quat::from_array(self.rotation).normalize(),
            Vec3::from(self.translation),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoneDef {
    pub id: u64,
    pub name: String,
    pub parent: Option<usize>,
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeshDef {
    pub name: String,
    /// Bone ids, indexed by `bone_indices`
    pub bones: Vec<u64>,
    pub positions: Vec<[f32; 3]>,
    pub bone_indices: Vec<u32>,
    #[serde(default)]
    pub normals: Vec<[f32; 3]>,
    #[serde(default)]
    pub tangents: Vec<[f32; 4]>,
    #[serde(default)]
    pub colors: Vec<[f32; 4]>,
    /// Texture coordinates by channel
    #[serde(default)]
    pub uvs: HashMap<usize, Vec<[f32; 2]>>,
    #[serde(default)]
    pub submeshes: Vec<SubMeshDef>,
    #[serde(default)]
    pub materials: Vec<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubMeshDef {
    pub topology: TopologyDef,
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyDef {
    Triangles,
    Quads,
    Lines,
    LineStrip,
    Points,
}

impl From<TopologyDef> for Topology {
    fn from(topology: TopologyDef) -> Self {
        match topology {
            TopologyDef::Triangles => Self::Triangles,
            TopologyDef::Quads => Self::Quads,
            TopologyDef::Lines => Self::Lines,
            TopologyDef::LineStrip => Self::LineStrip,
            TopologyDef::Points => Self::Points,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClipDef {
    pub name: String,
    pub duration: f32,
    pub sample_rate: f32,
    #[serde(default)]
    pub tracks: Vec<TrackDef>,
    pub root_motion: Option<KeysDef<[f32; 3]>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackDef {
    pub bone: u64,
    pub translation: Option<KeysDef<[f32; 3]>>,
    pub rotation: Option<KeysDef<[f32; 4]>>,
    pub scale: Option<KeysDef<[f32; 3]>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeysDef<T> {
    #[serde(default)]
    pub interpolation: InterpolationDef,
    pub times: Vec<f32>,
    pub values: Vec<T>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationDef {
    Step,
    #[default]
    Linear,
}

impl From<InterpolationDef> for Interpolation {
    fn from(interpolation: InterpolationDef) -> Self {
        match interpolation {
            InterpolationDef::Step => Self::Step,
            InterpolationDef::Linear => Self::Linear,
        }
    }
}

fn identity_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn unit_scale() -> [f32; 3] {
    [1.0; 3]
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene file: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Failed to parse scene file: {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build the rig and bake input described by the scene
    pub fn into_config(self) -> Result<BakeConfig> {
        let bones = self
            .bones
            .iter()
            .map(|bone| {
                let mut rig_bone = RigBone::new(BoneId::new(bone.id), bone.name.clone())
                    .with_translation(Vec3::from(bone.translation))
                    .with_rotation(Quat::from_array(bone.rotation).normalize())
                    .with_scale(Vec3::from(bone.scale));
                rig_bone.parent = bone.parent;
                rig_bone
            })
            .collect();
        let rig = Arc::new(Rig::new(self.root.to_mat4(), bones).context("Invalid rig")?);

        let meshes = self
            .meshes
            .into_iter()
            .map(|mesh| build_mesh(&rig, mesh))
            .collect::<Result<Vec<_>>>()?;
        let clips = self
            .clips
            .into_iter()
            .map(|clip| build_clip(&rig, clip))
            .collect::<Result<Vec<_>>>()?;
        let remap = self
            .material_remap
            .into_iter()
            .map(|(from, to)| (MaterialId(from), MaterialId(to)))
            .collect();

        Ok(BakeConfig::new(meshes, clips).with_material_remap(remap))
    }
}

fn build_mesh(rig: &Rig, def: MeshDef) -> Result<SourceMesh> {
    let ids: Vec<BoneId> = def.bones.iter().map(|id| BoneId::new(*id)).collect();

    let mut mesh = SourceMesh::new(def.name);
    mesh.bones = rig
        .bindings_for(&ids)
        .with_context(|| format!("Mesh '{}' references an unknown bone", mesh.name))?;
    mesh.positions = def.positions.into_iter().map(Vec3::from).collect();
    mesh.normals = def.normals.into_iter().map(Vec3::from).collect();
    mesh.tangents = def.tangents.into_iter().map(Vec4::from).collect();
    mesh.colors = def.colors.into_iter().map(Vec4::from).collect();
    mesh.bone_indices = def.bone_indices;

    for (channel, uvs) in def.uvs {
        let Some(slot) = mesh.uvs.get_mut(channel) else {
            bail!(
                "Mesh '{}' has UV channel {} but only {} channels exist",
                mesh.name,
                channel,
                mesh.uvs.len()
            );
        };
        *slot = uvs.into_iter().map(Vec2::from).collect();
    }

    mesh.submeshes = def
        .submeshes
        .into_iter()
        .map(|submesh| SubMesh::new(submesh.topology.into(), submesh.indices))
        .collect();
    mesh.materials = def.materials.into_iter().map(MaterialId).collect();
    Ok(mesh)
}

fn build_clip(rig: &Arc<Rig>, def: ClipDef) -> Result<AnimationClip> {
    let mut clip = KeyframedClip::new(rig.clone());

    for track in def.tracks {
        let tracks = BoneTracks {
            translation: track
                .translation
                .map(|keys| build_track(keys, Vec3::from))
                .transpose()?,
            rotation: track
                .rotation
                .map(|keys| build_track(keys, |q| Quat::from_array(q).normalize()))
                .transpose()?,
            scale: track
                .scale
                .map(|keys| build_track(keys, Vec3::from))
                .transpose()?,
        };
        clip = clip
            .with_tracks(BoneId::new(track.bone), tracks)
            .with_context(|| format!("Clip '{}' animates an unknown bone", def.name))?;
    }

    if let Some(keys) = def.root_motion {
        clip = clip.with_root_motion(build_track(keys, Vec3::from)?);
    }

    Ok(clip.into_animation(def.name, def.duration, def.sample_rate))
}

fn build_track<S, T: anim_bake::rig::Lerp>(
    keys: KeysDef<S>,
    convert: impl Fn(S) -> T,
) -> Result<KeyframeTrack<T>> {
    let values = keys.values.into_iter().map(convert).collect();
    Ok(KeyframeTrack::new(
        keys.interpolation.into(),
        keys.times,
        values,
    )?)
}
