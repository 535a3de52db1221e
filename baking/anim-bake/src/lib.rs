//! Baking of skinned character animation for GPU instancing
//!
//! This crate turns skinned meshes and their animation clips into data a
//! vertex shader can animate on its own:
//!
//! - static meshes whose texture coordinate channels 2 and 3 carry, per
//!   vertex, the bind-space anchor of its bone and the bone's row inside a
//!   clip region
//! - one RGBA16F texture atlas holding, for every clip, a region of
//!   `frame_count` columns and `2 * bone_count` rows: bone positions in the
//!   character root's space, then bone rotations
//! - per clip, its region and the bounds it sweeps
//!
//! Each vertex follows exactly one bone.
//!
//! ## Features
//!
//! - Merge the bone lists of several meshes into one skeleton by identity
//! - Deterministic half-float encoding, so identical input bakes to
//!   identical bytes
//! - Guillotine packing of all clips into one atlas
//! - Cancellation and progress reporting
//! - Keyframed rigs as a built-in pose source
//! - Parallel clip sampling (with `parallel` feature)
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use anim_bake::{
//!     BakeConfig, Baker, BoneId, KeyframedClip, Rig, RigBone, SourceMesh,
//! };
//! use glam::{Mat4, Vec3};
//!
//! # fn main() -> anim_bake::Result<()> {
//! let rig = Arc::new(Rig::new(
//!     Mat4::IDENTITY,
//!     vec![RigBone::new(BoneId::new(1), "root")],
//! )?);
//!
//! let mut mesh = SourceMesh::new("body");
//! mesh.bones = rig.bindings();
//! mesh.positions = vec![Vec3::ZERO, Vec3::Y];
//! mesh.bone_indices = vec![0, 0];
//!
//! let idle = KeyframedClip::new(rig).into_animation("idle", 1.0, 30.0);
//! let output = Baker::new().bake(&BakeConfig::new(vec![mesh], vec![idle]))?;
//!
//! assert_eq!(output.animations[0].region.width, 30);
//! assert_eq!(output.animations[0].region.height, 2);
//! # Ok(())
//! # }
//! ```

pub mod atlas;
pub mod bake;
pub mod bind;
pub mod bounds;
pub mod error;
pub mod mesh;
pub mod pose;
pub mod progress;
pub mod rig;
pub mod sampler;
pub mod skeleton;
pub mod texel;

// Re-export common types
pub use atlas::{Atlas, AtlasPacker, ClipRegion, PackOptions, PackResult, Rect};
pub use bake::{BakeConfig, BakeOutput, BakedAnimation, Baker};
pub use bind::{BindEncoder, bone_row_coord};
pub use bounds::{Aabb, BoundsAccumulator};
pub use error::{BakeError, Result};
pub use mesh::{BakedMesh, MaterialId, SkinVertex, SourceMesh, SubMesh, Topology};
pub use pose::{AnimationClip, Pose, PoseSampler};
pub use progress::{BakeStage, CancellationToken, NoProgress, ProgressSink};
pub use rig::{BoneTracks, Interpolation, KeyframeTrack, KeyframedClip, Rig, RigBone};
pub use sampler::{AnimationSampler, ClipBake};
pub use skeleton::{BoneBinding, BoneId, BoneIndexMap, Skeleton, SkeletonBuilder};
pub use texel::Texel;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
