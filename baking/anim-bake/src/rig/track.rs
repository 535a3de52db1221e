//! Keyframe tracks

use glam::{Quat, Vec3};

use crate::error::{BakeError, Result};

/// Interpolation between neighbouring keyframes
pub trait Lerp: Copy {
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Vec3 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec3::lerp(*self, *other, t)
    }
}

impl Lerp for Quat {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        // Spherical, so rotations keep unit length
        self.slerp(*other, t)
    }
}

/// How values between keyframes are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    /// Hold the earlier keyframe
    Step,
    #[default]
    Linear,
}

/// Find the index of the keyframe at or before `time`
///
/// Returns `None` for an empty track. Times before the first key map to the
/// first key; times at or past the last key map to the last key.
pub fn find_keyframe(times: &[f32], time: f32) -> Option<usize> {
    let last = times.len().checked_sub(1)?;
    if time >= times[last] {
        return Some(last);
    }

    // Largest index whose time is <= `time`
    let mut low = 0;
    let mut high = last;
    while low < high {
        let mid = (low + high).div_ceil(2);
        if times[mid] <= time {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    Some(low)
}

/// Timed values of one animated property
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeTrack<T> {
    interpolation: Interpolation,
    times: Vec<f32>,
    values: Vec<T>,
}

impl<T: Lerp> KeyframeTrack<T> {
    /// Build a track; times must be finite and non-decreasing
    pub fn new(interpolation: Interpolation, times: Vec<f32>, values: Vec<T>) -> Result<Self> {
        if times.len() != values.len() {
            return Err(BakeError::InvalidInput(format!(
                "keyframe track has {} times but {} values",
                times.len(),
                values.len()
            )));
        }
        if times.iter().any(|time| !time.is_finite()) {
            return Err(BakeError::InvalidInput(
                "keyframe track has a non-finite time".to_string(),
            ));
        }
        if times.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(BakeError::InvalidInput(
                "keyframe times must not decrease".to_string(),
            ));
        }

        Ok(Self {
            interpolation,
            times,
            values,
        })
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time of the last keyframe
    pub fn end_time(&self) -> Option<f32> {
        self.times.last().copied()
    }

    /// Value at `time`, clamped to the key range; `None` for an empty track
    pub fn sample(&self, time: f32) -> Option<T> {
        let index = find_keyframe(&self.times, time)?;
        let current = self.values[index];

        let Some(&next_time) = self.times.get(index + 1) else {
            return Some(current);
        };
        if self.interpolation == Interpolation::Step {
            return Some(current);
        }

        let start = self.times[index];
        let t = if next_time > start {
            ((time - start) / (next_time - start)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some(current.lerp(&self.values[index + 1], t))
    }
}
