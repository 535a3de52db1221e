//! Half-precision texel encoding
//!
//! Texels are four IEEE 754 binary16 channels stored as raw bits. Conversion
//! from `f32` rounds to nearest, ties to even, so identical inputs always
//! produce identical bits.

use glam::{Quat, Vec3, Vec4};
use half::f16;

/// One RGBA16F texel as raw half-float bits
pub type Texel = [u16; 4];

/// Bytes occupied by one texel
pub const TEXEL_SIZE: usize = 8;

/// All channels zero
pub const ZERO_TEXEL: Texel = [0; 4];

pub fn encode_texel(value: Vec4) -> Texel {
    value.to_array().map(|channel| f16::from_f32(channel).to_bits())
}

pub fn decode_texel(texel: Texel) -> Vec4 {
    Vec4::from_array(texel.map(|bits| f16::from_bits(bits).to_f32()))
}

/// Position texel, `w` fixed at zero
pub fn encode_position(position: Vec3) -> Texel {
    encode_texel(position.extend(0.0))
}

pub fn decode_position(texel: Texel) -> Vec3 {
    decode_texel(texel).truncate()
}

/// Rotation texel holding a unit quaternion as `xyzw`
pub fn encode_rotation(rotation: Quat) -> Texel {
    encode_texel(Vec4::from(rotation.normalize()))
}

/// Decode a rotation texel, renormalizing after the precision loss
pub fn decode_rotation(texel: Texel) -> Quat {
    Quat::from_vec4(decode_texel(texel)).normalize()
}
