//! Formatting utilities

use anim_bake::{Aabb, Rect};
use glam::Vec3;
use humansize::{DECIMAL, format_size};

/// Format a byte count in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a ratio in `[0, 1]` as a percentage
pub fn format_percentage(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

pub fn format_vec3(v: Vec3) -> String {
    format!("({:.3}, {:.3}, {:.3})", v.x, v.y, v.z)
}

/// `x,y wxh`
pub fn format_rect(rect: &Rect) -> String {
    format!("{},{} {}x{}", rect.x, rect.y, rect.width, rect.height)
}

pub fn format_bounds(bounds: &Aabb) -> String {
    format!(
        "{} ± {}",
        format_vec3(bounds.center),
        format_vec3(bounds.extents)
    )
}
