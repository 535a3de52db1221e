//! Per-frame clip sampling
//!
//! A clip is sampled into a block of texels laid out exactly like its atlas
//! region: one column per frame, then `bone_count` position rows followed by
//! `bone_count` rotation rows.
//!
//! Position texels hold the bone origin in the character root's local space.
//! Rotation texels hold the bone's world rotation composed with its bind
//! rotation, which is the identity whenever the bone is at rest.
//!
//! The two halves are in different spaces: the root's rotation is removed
//! from positions but kept in rotations. Shading `position + rotation *
//! (vertex - anchor)` is exact only while the sampled root carries no
//! rotation; a rotated root turns every vertex offset by that rotation.
//!
//! The block is owned by the caller until every clip has finished, so a
//! cancelled clip never leaves partial data in the atlas.

use glam::{Mat4, Quat};
use log::{debug, trace};

use crate::bounds::{Aabb, BoundsAccumulator};
use crate::error::{BakeError, Result};
use crate::mesh::SourceMesh;
use crate::pose::{AnimationClip, Pose};
use crate::progress::CancellationToken;
use crate::skeleton::{BoneIndexMap, Skeleton};
use crate::texel::{Texel, ZERO_TEXEL, encode_position, encode_rotation};

/// Sampled texels and animated bounds of one clip
#[derive(Debug, Clone, PartialEq)]
pub struct ClipBake {
    pub frame_count: u32,
    pub bone_count: usize,
    /// Row-major, `frame_count` wide and `2 * bone_count` high
    pub texels: Vec<Texel>,
    /// Zero box when no mesh has vertices
    pub bounds: Aabb,
}

impl ClipBake {
    pub fn position_texel(&self, frame: u32, bone: usize) -> Option<Texel> {
        self.texel_at(frame, bone)
    }

    pub fn rotation_texel(&self, frame: u32, bone: usize) -> Option<Texel> {
        self.texel_at(frame, bone + self.bone_count)
    }

    fn texel_at(&self, frame: u32, row: usize) -> Option<Texel> {
        if frame >= self.frame_count || row >= 2 * self.bone_count {
            return None;
        }
        self.texels
            .get(row * self.frame_count as usize + frame as usize)
            .copied()
    }
}

/// Samples clips against a merged skeleton
#[derive(Debug)]
pub struct AnimationSampler<'a> {
    skeleton: &'a Skeleton,
    meshes: &'a [SourceMesh],
    maps: &'a [BoneIndexMap],
    bind_rotations: Vec<Quat>,
}

impl<'a> AnimationSampler<'a> {
    /// `maps[i]` must be the bone map of `meshes[i]`
    pub fn new(skeleton: &'a Skeleton, meshes: &'a [SourceMesh], maps: &'a [BoneIndexMap]) -> Self {
        let bind_rotations = (0..skeleton.len())
            .filter_map(|index| skeleton.bind_rotation(index))
            .collect();
        Self {
            skeleton,
            meshes,
            maps,
            bind_rotations,
        }
    }

    /// Sample every frame of `clip`
    ///
    /// Checks `cancel` before the clip and before each frame.
    pub fn sample_clip(&self, clip: &AnimationClip, cancel: &CancellationToken) -> Result<ClipBake> {
        cancel.check()?;

        let frame_count = clip.frame_count();
        let bone_count = self.skeleton.len();
        let width = frame_count as usize;
        let mut texels = vec![ZERO_TEXEL; width * 2 * bone_count];
        let mut bounds = BoundsAccumulator::new();

        for frame in 0..frame_count {
            cancel.check()?;

            let time = clip.frame_time(frame);
            let pose = clip.sampler.sample(time);
            let worlds = self.bone_worlds(clip, &pose)?;
            let to_root = pose.root.inverse();

            for (bone, world) in worlds.iter().enumerate() {
                let (_, rotation, translation) = world.to_scale_rotation_translation();
                let position = to_root.transform_point3(translation);
                let rotation = rotation * self.bind_rotations[bone];

                let column = frame as usize;
                texels[bone * width + column] = encode_position(position);
                texels[(bone + bone_count) * width + column] = encode_rotation(rotation);
            }

            self.accumulate_bounds(&mut bounds, &to_root, &worlds);
            trace!("Sampled '{}' frame {} at {:.4}s", clip.name, frame, time);
        }

        let bounds = bounds.finish().unwrap_or_default();
        debug!(
            "Sampled clip '{}': {} frames x {} bones, bounds center {:?} extents {:?}",
            clip.name, frame_count, bone_count, bounds.center, bounds.extents
        );

        Ok(ClipBake {
            frame_count,
            bone_count,
            texels,
            bounds,
        })
    }

    /// World transform of every skeleton bone, in skeleton order
    fn bone_worlds(&self, clip: &AnimationClip, pose: &Pose) -> Result<Vec<Mat4>> {
        self.skeleton
            .bones()
            .iter()
            .map(|bone| {
                pose.world(*bone).ok_or_else(|| {
                    BakeError::InvalidInput(format!(
                        "clip '{}': sampled pose has no transform for bone {:?}",
                        clip.name, bone
                    ))
                })
            })
            .collect()
    }

    /// Skin every mesh with its own bind poses and grow `bounds` in root space
    fn accumulate_bounds(&self, bounds: &mut BoundsAccumulator, to_root: &Mat4, worlds: &[Mat4]) {
        for (mesh, map) in self.meshes.iter().zip(self.maps) {
            let skin: Vec<Mat4> = mesh
                .bones
                .iter()
                .zip(map.as_slice())
                .map(|(binding, global)| *to_root * worlds[*global] * binding.bind_pose)
                .collect();

            for (position, local) in mesh.positions.iter().zip(&mesh.bone_indices) {
                if let Some(matrix) = skin.get(*local as usize) {
                    bounds.add_point(matrix.transform_point3(*position));
                }
            }
        }
    }
}
