//! Clip descriptors and sampled poses

use std::collections::HashMap;
use std::fmt;

use glam::Mat4;

use crate::error::{BakeError, Result};
use crate::skeleton::BoneId;

/// World transforms of a character at one instant
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pose {
    /// Transform of the character root
    pub root: Mat4,
    /// World transform of each bone
    pub bones: HashMap<BoneId, Mat4>,
}

impl Pose {
    pub fn new(root: Mat4) -> Self {
        Self {
            root,
            bones: HashMap::new(),
        }
    }

    pub fn with_bone(mut self, bone: BoneId, world: Mat4) -> Self {
        self.bones.insert(bone, world);
        self
    }

    pub fn world(&self, bone: BoneId) -> Option<Mat4> {
        self.bones.get(&bone).copied()
    }
}

/// Evaluates a clip at a time in seconds
pub trait PoseSampler: Send + Sync {
    fn sample(&self, time: f32) -> Pose;
}

impl<F> PoseSampler for F
where
    F: Fn(f32) -> Pose + Send + Sync,
{
    fn sample(&self, time: f32) -> Pose {
        self(time)
    }
}

/// An animation clip handed over for baking
pub struct AnimationClip {
    pub name: String,
    /// Length in seconds
    pub duration: f32,
    /// Frames per second
    pub sample_rate: f32,
    pub sampler: Box<dyn PoseSampler>,
}

impl fmt::Debug for AnimationClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationClip")
            .field("name", &self.name)
            .field("duration", &self.duration)
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

impl AnimationClip {
    pub fn new(
        name: impl Into<String>,
        duration: f32,
        sample_rate: f32,
        sampler: impl PoseSampler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            duration,
            sample_rate,
            sampler: Box::new(sampler),
        }
    }

    /// `round(duration * sample_rate)`
    ///
    /// Saturates at `u32::MAX`; [`validate`](Self::validate) rejects such clips.
    pub fn frame_count(&self) -> u32 {
        (self.duration * self.sample_rate).round() as u32
    }

    /// Time of `frame`; the last frame stops one step short of the duration
    pub fn frame_time(&self, frame: u32) -> f32 {
        let count = self.frame_count();
        if count == 0 {
            return 0.0;
        }
        frame as f32 / count as f32 * self.duration
    }

    pub fn validate(&self) -> Result<()> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(BakeError::InvalidInput(format!(
                "clip '{}': duration {} must be a positive number of seconds",
                self.name, self.duration
            )));
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(BakeError::InvalidInput(format!(
                "clip '{}': sample rate {} must be positive",
                self.name, self.sample_rate
            )));
        }
        let frames = (self.duration as f64 * self.sample_rate as f64).round();
        if frames < 1.0 || self.frame_count() == 0 {
            return Err(BakeError::InvalidInput(format!(
                "clip '{}': {}s at {} fps rounds to zero frames",
                self.name, self.duration, self.sample_rate
            )));
        }
        if frames > u32::MAX as f64 {
            return Err(BakeError::InvalidInput(format!(
                "clip '{}': {}s at {} fps needs {} frames, more than an atlas row holds",
                self.name, self.duration, self.sample_rate, frames
            )));
        }
        Ok(())
    }
}
