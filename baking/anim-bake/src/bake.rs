//! Bake orchestration
//!
//! [`Baker::bake`] runs the whole pipeline for one character:
//!
//! 1. validate every mesh and clip
//! 2. merge the mesh bone lists into one skeleton
//! 3. encode each mesh
//! 4. pack one region per clip
//! 5. sample each clip, then copy all samples into the atlas
//!
//! Either the full output is returned or an error is; cancellation is
//! reported as [`BakeError::Cancelled`] and nothing else is kept.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};

use crate::atlas::{Atlas, AtlasPacker, ClipRegion, PackOptions, PackResult};
use crate::bind::BindEncoder;
use crate::bounds::Aabb;
use crate::error::{BakeError, Result};
use crate::mesh::{BakedMesh, MaterialId, SourceMesh};
use crate::pose::AnimationClip;
use crate::progress::{BakeStage, CancellationToken, NoProgress, ProgressSink};
use crate::sampler::{AnimationSampler, ClipBake};
use crate::skeleton::{BoneIndexMap, Skeleton, build_skeleton};

/// Everything one bake consumes
#[derive(Debug, Default)]
pub struct BakeConfig {
    /// Source meshes; their order fixes the skeleton order
    pub meshes: Vec<SourceMesh>,
    pub clips: Vec<AnimationClip>,
    /// Replacement materials; unmapped materials are kept
    pub material_remap: HashMap<MaterialId, MaterialId>,
    pub pack: PackOptions,
}

impl BakeConfig {
    pub fn new(meshes: Vec<SourceMesh>, clips: Vec<AnimationClip>) -> Self {
        Self {
            meshes,
            clips,
            ..Default::default()
        }
    }

    pub fn with_material_remap(mut self, remap: HashMap<MaterialId, MaterialId>) -> Self {
        self.material_remap = remap;
        self
    }

    pub fn with_pack_options(mut self, pack: PackOptions) -> Self {
        self.pack = pack;
        self
    }

    /// Reject input that cannot produce a complete bake
    pub fn validate(&self) -> Result<()> {
        if self.meshes.is_empty() {
            return Err(BakeError::InvalidInput("no source meshes".to_string()));
        }
        if self.clips.is_empty() {
            return Err(BakeError::InvalidInput("no animation clips".to_string()));
        }
        self.pack.validate()?;
        for mesh in &self.meshes {
            mesh.validate()?;
        }
        for clip in &self.clips {
            clip.validate()?;
        }
        Ok(())
    }
}

/// A baked clip: where its texels live and how far it reaches
#[derive(Debug, Clone, PartialEq)]
pub struct BakedAnimation {
    pub name: String,
    /// Length in seconds
    pub length: f32,
    pub sample_rate: f32,
    pub frame_count: u32,
    pub region: ClipRegion,
    /// Bounds in the character root's space over the whole clip
    pub bounds: Aabb,
}

/// Complete result of a bake
#[derive(Debug, Clone, PartialEq)]
pub struct BakeOutput {
    pub meshes: Vec<BakedMesh>,
    pub animations: Vec<BakedAnimation>,
    pub atlas: Atlas,
    /// Packed layout of the atlas; `layout.regions[i]` is the region of `animations[i]`
    pub layout: PackResult,
    pub bone_count: usize,
}

/// Runs bakes, reporting progress and honouring cancellation
#[derive(Clone)]
pub struct Baker {
    progress: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
}

impl Default for Baker {
    fn default() -> Self {
        Self {
            progress: Arc::new(NoProgress),
            cancel: CancellationToken::new(),
        }
    }
}

impl std::fmt::Debug for Baker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Baker")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Baker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, progress: impl ProgressSink + 'static) -> Self {
        self.progress = Arc::new(progress);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn bake(&self, config: &BakeConfig) -> Result<BakeOutput> {
        info!(
            "Starting bake: {} meshes, {} clips",
            config.meshes.len(),
            config.clips.len()
        );

        config.validate()?;

        let (skeleton, maps) = build_skeleton(&config.meshes);
        if skeleton.is_empty() {
            return Err(BakeError::InvalidInput(
                "source meshes reference no bones".to_string(),
            ));
        }

        let meshes = self.bake_meshes(config, &skeleton, &maps)?;
        let layout = pack_clips(config, &skeleton)?;

        self.cancel.check()?;
        let sampler = AnimationSampler::new(&skeleton, &config.meshes, &maps);
        let bakes = sample_clips(&sampler, &config.clips, &self.cancel, self.progress.as_ref())?;

        let mut atlas = Atlas::new(layout.width, layout.height);
        let mut animations = Vec::with_capacity(bakes.len());
        for ((clip, bake), region) in config.clips.iter().zip(bakes).zip(&layout.regions) {
            atlas.write_region(region, &bake.texels)?;
            animations.push(BakedAnimation {
                name: clip.name.clone(),
                length: clip.duration,
                sample_rate: clip.sample_rate,
                frame_count: bake.frame_count,
                region: *region,
                bounds: bake.bounds,
            });
        }

        info!(
            "Bake finished: {} meshes, {} bones, {} clips, atlas {}x{} ({:.1}% used)",
            meshes.len(),
            skeleton.len(),
            animations.len(),
            atlas.width(),
            atlas.height(),
            layout.efficiency() * 100.0
        );

        Ok(BakeOutput {
            meshes,
            animations,
            atlas,
            layout,
            bone_count: skeleton.len(),
        })
    }

    fn bake_meshes(
        &self,
        config: &BakeConfig,
        skeleton: &Skeleton,
        maps: &[BoneIndexMap],
    ) -> Result<Vec<BakedMesh>> {
        let encoder = BindEncoder::new(skeleton, &config.material_remap);
        let total = config.meshes.len();
        let mut baked = Vec::with_capacity(total);

        for (index, (mesh, map)) in config.meshes.iter().zip(maps).enumerate() {
            self.cancel.check()?;
            baked.push(encoder.encode(mesh, map)?);
            self.progress
                .report(BakeStage::Meshes, index + 1, total, &mesh.name);
        }

        Ok(baked)
    }
}

/// Lay out one region per clip
fn pack_clips(config: &BakeConfig, skeleton: &Skeleton) -> Result<PackResult> {
    let height = u32::try_from(2 * skeleton.len()).map_err(|_| {
        BakeError::InvalidInput(format!("{} bones do not fit an atlas", skeleton.len()))
    })?;
    let sizes: Vec<(u32, u32)> = config
        .clips
        .iter()
        .map(|clip| (clip.frame_count(), height))
        .collect();

    let layout = AtlasPacker::new(config.pack).pack(&sizes)?;
    debug!(
        "Atlas layout {}x{} for {} clips",
        layout.width,
        layout.height,
        layout.regions.len()
    );
    Ok(layout)
}

/// Sample every clip, in clip order
#[cfg(not(feature = "parallel"))]
fn sample_clips(
    sampler: &AnimationSampler<'_>,
    clips: &[AnimationClip],
    cancel: &CancellationToken,
    progress: &dyn ProgressSink,
) -> Result<Vec<ClipBake>> {
    let total = clips.len();
    let mut bakes = Vec::with_capacity(total);

    for (index, clip) in clips.iter().enumerate() {
        bakes.push(sampler.sample_clip(clip, cancel)?);
        progress.report(BakeStage::Animations, index + 1, total, &clip.name);
    }

    Ok(bakes)
}

/// Sample clips on the rayon pool
///
/// Results come back in clip order; the first failing clip decides the
/// error.
#[cfg(feature = "parallel")]
fn sample_clips(
    sampler: &AnimationSampler<'_>,
    clips: &[AnimationClip],
    cancel: &CancellationToken,
    progress: &dyn ProgressSink,
) -> Result<Vec<ClipBake>> {
    use rayon::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let total = clips.len();
    let done = AtomicUsize::new(0);

    let results: Vec<Result<ClipBake>> = clips
        .par_iter()
        .map(|clip| -> Result<ClipBake> {
            let bake = sampler.sample_clip(clip, cancel)?;
            let current = done.fetch_add(1, Ordering::AcqRel) + 1;
            progress.report(BakeStage::Animations, current, total, &clip.name);
            Ok(bake)
        })
        .collect();

    results.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Pose;
    use crate::skeleton::{BoneBinding, BoneId};
    use glam::{Mat4, Vec3};

    fn mesh() -> SourceMesh {
        let mut mesh = SourceMesh::new("body");
        mesh.bones = vec![BoneBinding::new(BoneId::new(1), Mat4::IDENTITY)];
        mesh.positions = vec![Vec3::ZERO];
        mesh.bone_indices = vec![0];
        mesh
    }

    fn clip(name: &str, duration: f32) -> AnimationClip {
        AnimationClip::new(name, duration, 10.0, |_: f32| {
            Pose::new(Mat4::IDENTITY).with_bone(BoneId::new(1), Mat4::IDENTITY)
        })
    }

    #[test]
    fn test_bake_single_clip() {
        let config = BakeConfig::new(vec![mesh()], vec![clip("idle", 0.5)]);
        let output = Baker::new().bake(&config).unwrap();

        assert_eq!(output.bone_count, 1);
        assert_eq!(output.meshes.len(), 1);
        assert_eq!(output.animations[0].frame_count, 5);
        assert_eq!(output.animations[0].region, ClipRegion::new(0, 0, 5, 2));
        assert_eq!((output.atlas.width(), output.atlas.height()), (5, 2));
        assert_eq!(output.layout.regions, vec![ClipRegion::new(0, 0, 5, 2)]);
        assert_eq!(output.layout.efficiency(), 1.0);
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let baker = Baker::new();
        let no_clips = BakeConfig::new(vec![mesh()], Vec::new());
        assert!(matches!(baker.bake(&no_clips), Err(BakeError::InvalidInput(_))));

        let no_meshes = BakeConfig::new(Vec::new(), vec![clip("idle", 1.0)]);
        assert!(matches!(baker.bake(&no_meshes), Err(BakeError::InvalidInput(_))));
    }

    #[test]
    fn test_boneless_meshes_rejected() {
        let config = BakeConfig::new(vec![SourceMesh::new("prop")], vec![clip("idle", 1.0)]);
        let err = Baker::new().bake(&config).unwrap_err();
        assert_eq!(
            err,
            BakeError::InvalidInput("source meshes reference no bones".to_string())
        );
    }

    #[test]
    fn test_invalid_fill_factor_rejected() {
        let config = BakeConfig::new(vec![mesh()], vec![clip("idle", 1.0)])
            .with_pack_options(PackOptions { fill_factor: 0.0 });
        assert!(Baker::new().bake(&config).is_err());
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let config = BakeConfig::new(vec![mesh()], vec![clip("idle", 1.0)]);
        let result = Baker::new().with_cancellation(token).bake(&config);
        assert_eq!(result, Err(BakeError::Cancelled));
    }
}
