//! Skeleton merging across source meshes
//!
//! Each source mesh is skinned against its own bone list. Meshes of one
//! character usually share most of their bones, so before baking, all bone
//! lists are merged into a single ordered skeleton and every mesh gets a table
//! mapping its local bone indices to indices in that skeleton.
//!
//! Bones are compared by identity ([`BoneId`]), never by name: two distinct
//! bones that happen to share a name stay distinct.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};
use log::{debug, warn};

use crate::mesh::SourceMesh;

/// Tolerance used when comparing bind poses of a bone shared between meshes
const BIND_POSE_TOLERANCE: f32 = 1e-4;

/// Opaque bone identity
///
/// Equality is identity: the host allocates one id per bone object, names
/// play no part in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneId(u64);

impl BoneId {
    /// Create an id from a host-allocated raw handle
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw handle
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// A bone referenced by a source mesh together with its bind pose
///
/// The bind pose maps model space into the bone's local space at rest
/// (the "inverse bind matrix").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneBinding {
    pub bone: BoneId,
    pub bind_pose: Mat4,
}

impl BoneBinding {
    pub const fn new(bone: BoneId, bind_pose: Mat4) -> Self {
        Self { bone, bind_pose }
    }
}

/// Ordered set of unique bones with their bind poses
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<BoneId>,
    bind_poses: Vec<Mat4>,
    lookup: HashMap<BoneId, usize>,
}

impl Skeleton {
    /// Number of bones
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// Whether the skeleton has no bones
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Bones in skeleton order
    pub fn bones(&self) -> &[BoneId] {
        &self.bones
    }

    /// Bind poses in skeleton order
    pub fn bind_poses(&self) -> &[Mat4] {
        &self.bind_poses
    }

    /// Bind pose of the bone at `index`
    pub fn bind_pose(&self, index: usize) -> Option<Mat4> {
        self.bind_poses.get(index).copied()
    }

    /// Global index of a bone
    pub fn index_of(&self, bone: BoneId) -> Option<usize> {
        self.lookup.get(&bone).copied()
    }

    /// Position of the bone's origin in model space at rest
    ///
    /// This is the translation column of the inverse of the bind pose.
    pub fn bind_position(&self, index: usize) -> Option<Vec3> {
        self.bind_poses
            .get(index)
            .map(|bind| bind.inverse().w_axis.truncate())
    }

    /// Rotation part of the bind pose
    ///
    /// Since the bind pose is the inverse of the rest transform, this is the
    /// inverse of the bone's rest rotation.
    pub fn bind_rotation(&self, index: usize) -> Option<Quat> {
        self.bind_poses.get(index).map(|bind| {
            let (_, rotation, _) = bind.to_scale_rotation_translation();
            rotation.normalize()
        })
    }

    fn push(&mut self, bone: BoneId, bind_pose: Mat4) -> usize {
        let index = self.bones.len();
        self.bones.push(bone);
        self.bind_poses.push(bind_pose);
        self.lookup.insert(bone, index);
        index
    }
}

/// Maps a source mesh's local bone indices to global skeleton indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoneIndexMap {
    globals: Vec<usize>,
}

impl BoneIndexMap {
    /// Global index for a local bone index
    pub fn get(&self, local: usize) -> Option<usize> {
        self.globals.get(local).copied()
    }

    /// Number of local bones
    pub fn len(&self) -> usize {
        self.globals.len()
    }

    /// Whether the mesh referenced no bones
    pub fn is_empty(&self) -> bool {
        self.globals.is_empty()
    }

    /// Global indices ordered by local index
    pub fn as_slice(&self) -> &[usize] {
        &self.globals
    }
}

/// Incrementally merges the bone lists of source meshes
///
/// Meshes must be added in a deterministic order: the skeleton order is the
/// order in which bones are first encountered.
#[derive(Debug, Default)]
pub struct SkeletonBuilder {
    skeleton: Skeleton,
    maps: Vec<BoneIndexMap>,
}

impl SkeletonBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one mesh's bone list, returning the index of its map
    pub fn add_mesh(&mut self, bones: &[BoneBinding]) -> usize {
        let mut globals = Vec::with_capacity(bones.len());

        for binding in bones {
            let global = match self.skeleton.index_of(binding.bone) {
                Some(existing) => {
                    let known = self.skeleton.bind_poses[existing];
                    if !known.abs_diff_eq(binding.bind_pose, BIND_POSE_TOLERANCE) {
                        warn!(
                            "Bone {:?} has conflicting bind poses across meshes, keeping the first",
                            binding.bone
                        );
                    }
                    existing
                }
                None => self.skeleton.push(binding.bone, binding.bind_pose),
            };
            globals.push(global);
        }

        self.maps.push(BoneIndexMap { globals });
        self.maps.len() - 1
    }

    /// Finish merging
    pub fn build(self) -> (Skeleton, Vec<BoneIndexMap>) {
        debug!(
            "Merged {} bone lists into a skeleton of {} bones",
            self.maps.len(),
            self.skeleton.len()
        );
        (self.skeleton, self.maps)
    }
}

/// Merge the bone lists of `meshes`, in order
pub fn build_skeleton(meshes: &[SourceMesh]) -> (Skeleton, Vec<BoneIndexMap>) {
    let mut builder = SkeletonBuilder::new();
    for mesh in meshes {
        builder.add_mesh(&mesh.bones);
    }
    builder.build()
}
