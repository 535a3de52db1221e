//! Keyframed skeletal rigs
//!
//! A self-contained pose source for hosts that do not evaluate animation
//! themselves. A [`Rig`] describes a bone hierarchy at rest; a
//! [`KeyframedClip`] animates it with per-bone keyframe tracks and implements
//! [`PoseSampler`](crate::pose::PoseSampler).
//!
//! Transforms are composed the usual way: a bone's model transform is its
//! parent's model transform times its local `translation * rotation * scale`,
//! and its world transform is the rig root times its model transform.

mod clip;
mod track;

pub use clip::{BoneTracks, KeyframedClip};
pub use track::{Interpolation, KeyframeTrack, Lerp, find_keyframe};

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

use crate::error::{BakeError, Result};
use crate::pose::Pose;
use crate::skeleton::{BoneBinding, BoneId};

/// One bone of a rig at rest
#[derive(Debug, Clone, PartialEq)]
pub struct RigBone {
    pub id: BoneId,
    pub name: String,
    /// Index of the parent bone, which must come earlier in the rig
    pub parent: Option<usize>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl RigBone {
    pub fn new(id: BoneId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    pub fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local rest transform relative to the parent
    pub fn local_transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Bone hierarchy with its character root transform
#[derive(Debug, Clone, PartialEq)]
pub struct Rig {
    root: Mat4,
    bones: Vec<RigBone>,
    lookup: HashMap<BoneId, usize>,
}

impl Rig {
    /// Build a rig; parents must precede their children and ids be unique
    pub fn new(root: Mat4, bones: Vec<RigBone>) -> Result<Self> {
        let mut lookup = HashMap::with_capacity(bones.len());

        for (index, bone) in bones.iter().enumerate() {
            if let Some(parent) = bone.parent
                && parent >= index
            {
                return Err(BakeError::InvalidInput(format!(
                    "rig bone '{}' ({}) has parent {} that does not precede it",
                    bone.name, index, parent
                )));
            }
            if lookup.insert(bone.id, index).is_some() {
                return Err(BakeError::InvalidInput(format!(
                    "rig bone id {:?} appears more than once",
                    bone.id
                )));
            }
        }

        Ok(Self {
            root,
            bones,
            lookup,
        })
    }

    pub fn root(&self) -> Mat4 {
        self.root
    }

    pub fn bones(&self) -> &[RigBone] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn index_of(&self, id: BoneId) -> Option<usize> {
        self.lookup.get(&id).copied()
    }

    /// Compose per-bone local transforms into model-space transforms
    ///
    /// `locals` is indexed like the rig's bones.
    pub fn model_transforms(&self, locals: &[Mat4]) -> Vec<Mat4> {
        let mut model: Vec<Mat4> = Vec::with_capacity(self.bones.len());
        for (index, bone) in self.bones.iter().enumerate() {
            let local = locals.get(index).copied().unwrap_or(Mat4::IDENTITY);
            let transform = match bone.parent {
                Some(parent) => model[parent] * local,
                None => local,
            };
            model.push(transform);
        }
        model
    }

    /// Model-space transforms at rest
    pub fn rest_model_transforms(&self) -> Vec<Mat4> {
        let locals: Vec<Mat4> = self.bones.iter().map(RigBone::local_transform).collect();
        self.model_transforms(&locals)
    }

    /// Inverse rest transform of every bone, in rig order
    pub fn bind_poses(&self) -> Vec<Mat4> {
        self.rest_model_transforms()
            .iter()
            .map(Mat4::inverse)
            .collect()
    }

    /// Bindings for all bones, suitable as a mesh bone list
    pub fn bindings(&self) -> Vec<BoneBinding> {
        self.bones
            .iter()
            .zip(self.bind_poses())
            .map(|(bone, bind_pose)| BoneBinding::new(bone.id, bind_pose))
            .collect()
    }

    /// Bindings for a subset of bones, in the given order
    pub fn bindings_for(&self, bones: &[BoneId]) -> Result<Vec<BoneBinding>> {
        let bind_poses = self.bind_poses();
        bones
            .iter()
            .map(|id| {
                let index = self.index_of(*id).ok_or_else(|| {
                    BakeError::InvalidInput(format!("bone {id:?} is not part of the rig"))
                })?;
                Ok(BoneBinding::new(*id, bind_poses[index]))
            })
            .collect()
    }

    /// Pose of the rig at rest
    pub fn rest_pose(&self) -> Pose {
        self.pose_from_model(self.root, &self.rest_model_transforms())
    }

    pub(crate) fn pose_from_model(&self, root: Mat4, model: &[Mat4]) -> Pose {
        let bones = self
            .bones
            .iter()
            .zip(model)
            .map(|(bone, transform)| (bone.id, root * *transform))
            .collect();
        Pose { root, bones }
    }
}
