//! Clips evaluated from keyframe tracks

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use super::Rig;
use super::track::KeyframeTrack;
use crate::error::{BakeError, Result};
use crate::pose::{AnimationClip, Pose, PoseSampler};
use crate::skeleton::BoneId;

/// Animated channels of one bone; missing channels hold the rest value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneTracks {
    pub translation: Option<KeyframeTrack<Vec3>>,
    pub rotation: Option<KeyframeTrack<Quat>>,
    pub scale: Option<KeyframeTrack<Vec3>>,
}

impl BoneTracks {
    fn end_time(&self) -> f32 {
        [
            self.translation.as_ref().and_then(KeyframeTrack::end_time),
            self.rotation.as_ref().and_then(KeyframeTrack::end_time),
            self.scale.as_ref().and_then(KeyframeTrack::end_time),
        ]
        .into_iter()
        .flatten()
        .fold(0.0, f32::max)
    }
}

/// A clip animating a [`Rig`]
#[derive(Debug, Clone)]
pub struct KeyframedClip {
    rig: Arc<Rig>,
    tracks: HashMap<usize, BoneTracks>,
    root_motion: Option<KeyframeTrack<Vec3>>,
}

impl KeyframedClip {
    pub fn new(rig: Arc<Rig>) -> Self {
        Self {
            rig,
            tracks: HashMap::new(),
            root_motion: None,
        }
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    /// Animate `bone`, replacing any tracks it already had
    pub fn with_tracks(mut self, bone: BoneId, tracks: BoneTracks) -> Result<Self> {
        let index = self.rig.index_of(bone).ok_or_else(|| {
            BakeError::InvalidInput(format!("animated bone {bone:?} is not part of the rig"))
        })?;
        self.tracks.insert(index, tracks);
        Ok(self)
    }

    /// Translate the character root over time
    pub fn with_root_motion(mut self, track: KeyframeTrack<Vec3>) -> Self {
        self.root_motion = Some(track);
        self
    }

    /// Time of the last keyframe in any track
    pub fn end_time(&self) -> f32 {
        let bones = self.tracks.values().map(BoneTracks::end_time);
        let root = self.root_motion.as_ref().and_then(KeyframeTrack::end_time);
        bones.chain(root).fold(0.0, f32::max)
    }

    /// Evaluate every bone at `time`, parents first
    pub fn evaluate(&self, time: f32) -> Pose {
        let locals: Vec<Mat4> = self
            .rig
            .bones()
            .iter()
            .enumerate()
            .map(|(index, bone)| match self.tracks.get(&index) {
                Some(tracks) => {
                    let translation = sample_or(tracks.translation.as_ref(), time, bone.translation);
                    let rotation = sample_or(tracks.rotation.as_ref(), time, bone.rotation);
                    let scale = sample_or(tracks.scale.as_ref(), time, bone.scale);
                    Mat4::from_scale_rotation_translation(scale, rotation.normalize(), translation)
                }
                None => bone.local_transform(),
            })
            .collect();

        let root = match &self.root_motion {
            Some(track) => {
                let offset = track.sample(time).unwrap_or(Vec3::ZERO);
                self.rig.root() * Mat4::from_translation(offset)
            }
            None => self.rig.root(),
        };

        self.rig
            .pose_from_model(root, &self.rig.model_transforms(&locals))
    }

    /// Wrap into a bakeable clip
    pub fn into_animation(
        self,
        name: impl Into<String>,
        duration: f32,
        sample_rate: f32,
    ) -> AnimationClip {
        AnimationClip::new(name, duration, sample_rate, self)
    }
}

impl PoseSampler for KeyframedClip {
    fn sample(&self, time: f32) -> Pose {
        self.evaluate(time)
    }
}

fn sample_or<T: super::Lerp>(track: Option<&KeyframeTrack<T>>, time: f32, rest: T) -> T {
    track.and_then(|track| track.sample(time)).unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::super::{Interpolation, RigBone};
    use super::*;

    fn arm() -> Arc<Rig> {
        Arc::new(
            Rig::new(
                Mat4::IDENTITY,
                vec![
                    RigBone::new(BoneId::new(1), "shoulder"),
                    RigBone::new(BoneId::new(2), "hand")
                        .with_parent(0)
                        .with_translation(Vec3::X),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_unanimated_clip_is_rest_pose() {
        let rig = arm();
        let clip = KeyframedClip::new(rig.clone());
        assert_eq!(clip.evaluate(0.3), rig.rest_pose());
        assert_eq!(clip.end_time(), 0.0);
    }

    #[test]
    fn test_parent_rotation_moves_child() {
        let rotation = KeyframeTrack::new(
            Interpolation::Linear,
            vec![0.0, 1.0],
            vec![
                Quat::IDENTITY,
                Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            ],
        )
        .unwrap();
        let clip = KeyframedClip::new(arm())
            .with_tracks(
                BoneId::new(1),
                BoneTracks {
                    rotation: Some(rotation),
                    ..Default::default()
                },
            )
            .unwrap();

        let hand = clip.evaluate(1.0).world(BoneId::new(2)).unwrap();
        assert!(hand.w_axis.truncate().abs_diff_eq(Vec3::Y, 1e-5));
        assert_eq!(clip.end_time(), 1.0);
    }

    #[test]
    fn test_root_motion() {
        let track = KeyframeTrack::new(
            Interpolation::Linear,
            vec![0.0, 2.0],
            vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0)],
        )
        .unwrap();
        let clip = KeyframedClip::new(arm()).with_root_motion(track);
        let pose = clip.sample(1.0);

        assert!(pose.root.w_axis.truncate().abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-6));
        let hand = pose.world(BoneId::new(2)).unwrap();
        assert!(hand.w_axis.truncate().abs_diff_eq(Vec3::new(1.0, 0.0, 2.0), 1e-6));
    }

    #[test]
    fn test_unknown_bone() {
        let result = KeyframedClip::new(arm()).with_tracks(BoneId::new(42), BoneTracks::default());
        assert!(matches!(result, Err(BakeError::InvalidInput(_))));
    }

    #[test]
    fn test_into_animation() {
        let clip = KeyframedClip::new(arm()).into_animation("idle", 1.0, 30.0);
        assert_eq!(clip.frame_count(), 30);
        assert_eq!(clip.sampler.sample(0.0).bones.len(), 2);
    }
}
