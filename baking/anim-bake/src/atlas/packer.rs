//! Guillotine rectangle packing
//!
//! Clip regions all share one height but vary in width. The packer picks an
//! atlas width from the total area, then places the widest regions first into
//! a list of free rectangles that starts as one column of unbounded height.
//! Each placement splits its free rectangle in two along a guillotine cut.

use std::cmp::Reverse;

use log::debug;

use crate::error::{BakeError, Result};

/// Default target occupancy of the atlas
pub const DEFAULT_FILL_FACTOR: f32 = 0.95;

/// A placed rectangle, in texels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Region of one clip inside the atlas
pub type ClipRegion = Rect;

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge, saturating at `u32::MAX`
    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge, saturating at `u32::MAX`
    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub const fn overlaps(&self, other: &Self) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Whether `self` lies within a `width` x `height` area at the origin
    pub const fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}

/// Packing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackOptions {
    /// Expected share of the atlas covered by regions, in `(0, 1]`
    pub fill_factor: f32,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            fill_factor: DEFAULT_FILL_FACTOR,
        }
    }
}

impl PackOptions {
    pub fn with_fill_factor(fill_factor: f32) -> Result<Self> {
        let options = Self { fill_factor };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.fill_factor > 0.0 && self.fill_factor <= 1.0) {
            return Err(BakeError::InvalidInput(format!(
                "fill factor {} is outside (0, 1]",
                self.fill_factor
            )));
        }
        Ok(())
    }
}

/// Placement of every input rectangle, in input order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackResult {
    pub regions: Vec<Rect>,
    pub width: u32,
    pub height: u32,
}

impl PackResult {
    /// Texels covered by regions
    pub fn used_area(&self) -> u64 {
        self.regions.iter().map(Rect::area).sum()
    }

    pub fn total_area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Share of the atlas covered by regions, `0.0` for an empty atlas
    pub fn efficiency(&self) -> f64 {
        match self.total_area() {
            0 => 0.0,
            total => self.used_area() as f64 / total as f64,
        }
    }
}

/// Free space; `height` is `None` for the unbounded column
#[derive(Debug, Clone, Copy)]
struct FreeRect {
    x: u32,
    y: u32,
    width: u32,
    height: Option<u32>,
}

impl FreeRect {
    fn fits(&self, width: u32, height: u32) -> bool {
        width <= self.width && self.height.is_none_or(|free| height <= free)
    }
}

/// Packs fixed-height, variable-width regions into one atlas
#[derive(Debug, Clone, Copy, Default)]
pub struct AtlasPacker {
    options: PackOptions,
}

impl AtlasPacker {
    pub fn new(options: PackOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> PackOptions {
        self.options
    }

    /// Atlas width chosen before placement
    ///
    /// Fails when the summed area does not fit in a `u64`. The width is
    /// capped at `u32::MAX`.
    pub fn initial_width(&self, sizes: &[(u32, u32)]) -> Result<u32> {
        let widest = sizes.iter().map(|(width, _)| *width).max().unwrap_or(0);
        let total_area = sizes
            .iter()
            .try_fold(0u64, |total, (width, height)| {
                total.checked_add(*width as u64 * *height as u64)
            })
            .ok_or_else(|| {
                BakeError::InvalidInput(format!(
                    "total area of {} rectangles overflows a 64-bit texel count",
                    sizes.len()
                ))
            })?;
        let target = (total_area as f64 / self.options.fill_factor as f64)
            .sqrt()
            .ceil()
            .min(u32::MAX as f64) as u32;
        Ok(widest.max(target))
    }

    /// Place every `(width, height)` rectangle
    ///
    /// Regions are returned in input order. An empty input yields a 0x0
    /// atlas.
    pub fn pack(&self, sizes: &[(u32, u32)]) -> Result<PackResult> {
        self.options.validate()?;

        if let Some((index, (width, height))) = sizes
            .iter()
            .enumerate()
            .find(|(_, (width, height))| *width == 0 || *height == 0)
        {
            return Err(BakeError::InvalidInput(format!(
                "rectangle {index} has an empty size {width}x{height}"
            )));
        }
        if sizes.is_empty() {
            return Ok(PackResult::default());
        }

        let atlas_width = self.initial_width(sizes)?;
        let mut free = vec![FreeRect {
            x: 0,
            y: 0,
            width: atlas_width,
            height: None,
        }];

        let mut order: Vec<usize> = (0..sizes.len()).collect();
        order.sort_by_key(|&index| Reverse(sizes[index].0));

        let mut regions = vec![Rect::default(); sizes.len()];
        let (mut used_width, mut used_height) = (0, 0);

        for index in order {
            let (width, height) = sizes[index];
            let slot = (0..free.len())
                .rev()
                .find(|&slot| free[slot].fits(width, height))
                .ok_or(BakeError::PackingError {
                    width,
                    height,
                    atlas_width,
                })?;

            let target = free[slot];
            if target.x.checked_add(width).is_none() || target.y.checked_add(height).is_none() {
                return Err(BakeError::InvalidInput(format!(
                    "region {index} ({width}x{height}) at ({}, {}) overflows 32-bit texel coordinates",
                    target.x, target.y
                )));
            }
            let placed = Rect::new(target.x, target.y, width, height);
            split(&mut free, slot, placed);

            debug!(
                "Placed region {} ({}x{}) at ({}, {})",
                index, width, height, placed.x, placed.y
            );

            used_width = used_width.max(placed.right());
            used_height = used_height.max(placed.bottom());
            regions[index] = placed;
        }

        debug!(
            "Packed {} regions into {}x{} (initial width {})",
            regions.len(),
            used_width,
            used_height,
            atlas_width
        );

        Ok(PackResult {
            regions,
            width: used_width,
            height: used_height,
        })
    }
}

/// Cut `placed` out of `free[slot]`
///
/// `placed` must lie within `u32` coordinates.
fn split(free: &mut Vec<FreeRect>, slot: usize, placed: Rect) {
    let target = free[slot];

    if placed.width == target.width {
        // Whole row consumed
        let remaining = target.height.map(|height| height - placed.height);
        if remaining == Some(0) {
            free.remove(slot);
        } else {
            free[slot].y += placed.height;
            free[slot].height = remaining;
        }
    } else if target.height == Some(placed.height) {
        free[slot].x += placed.width;
        free[slot].width -= placed.width;
    } else {
        free[slot] = FreeRect {
            x: target.x,
            y: target.y + placed.height,
            width: target.width,
            height: target.height.map(|height| height - placed.height),
        };
        free.push(FreeRect {
            x: target.x + placed.width,
            y: target.y,
            width: target.width - placed.width,
            height: Some(placed.height),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_disjoint(result: &PackResult) {
        for (i, a) in result.regions.iter().enumerate() {
            assert!(a.fits_within(result.width, result.height), "{a:?} out of bounds");
            for b in &result.regions[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_empty_input() {
        let result = AtlasPacker::default().pack(&[]).unwrap();
        assert_eq!(result, PackResult::default());
        assert_eq!(result.efficiency(), 0.0);
    }

    #[test]
    fn test_single_region_fills_atlas() {
        let result = AtlasPacker::default().pack(&[(30, 8)]).unwrap();
        assert_eq!(result.regions, vec![Rect::new(0, 0, 30, 8)]);
        assert_eq!((result.width, result.height), (30, 8));
        assert_eq!(result.efficiency(), 1.0);
    }

    #[test]
    fn test_initial_width() {
        let packer = AtlasPacker::default();
        // 160 / 0.95 = 168.4.., sqrt = 12.97..
        assert_eq!(packer.initial_width(&[(10, 8), (4, 8), (6, 8)]).unwrap(), 13);
        assert_eq!(packer.initial_width(&[(100, 2)]).unwrap(), 100);
    }

    #[test]
    fn test_area_overflow_is_invalid() {
        let huge = 4_000_000_000;
        let err = AtlasPacker::default()
            .pack(&[(huge, huge), (huge, huge)])
            .unwrap_err();
        assert!(matches!(err, BakeError::InvalidInput(_)));
    }

    #[test]
    fn test_coordinate_overflow_is_invalid() {
        // The second region would start at y = 3e9 and end past u32::MAX
        let big = 3_000_000_000;
        let err = AtlasPacker::default()
            .pack(&[(big, big), (big, big)])
            .unwrap_err();
        assert!(matches!(err, BakeError::InvalidInput(_)));
    }

    #[test]
    fn test_largest_single_region() {
        let result = AtlasPacker::default()
            .pack(&[(u32::MAX, u32::MAX)])
            .unwrap();
        assert_eq!(result.regions, vec![Rect::new(0, 0, u32::MAX, u32::MAX)]);
        assert_eq!((result.width, result.height), (u32::MAX, u32::MAX));
    }

    #[test]
    fn test_three_clips() {
        let result = AtlasPacker::default()
            .pack(&[(10, 8), (4, 8), (6, 8)])
            .unwrap();

        // Width 13: the 10 goes first, the 6 and the 4 land below it side by side
        assert_eq!(
            result.regions,
            vec![
                Rect::new(0, 0, 10, 8),
                Rect::new(6, 8, 4, 8),
                Rect::new(0, 8, 6, 8),
            ]
        );
        assert_eq!((result.width, result.height), (10, 16));
        assert_disjoint(&result);
    }

    #[test]
    fn test_equal_widths_keep_input_order() {
        let result = AtlasPacker::default().pack(&[(5, 4), (5, 4), (5, 4)]).unwrap();
        let xs: Vec<u32> = result.regions.iter().map(|r| r.x).collect();
        let ys: Vec<u32> = result.regions.iter().map(|r| r.y).collect();
        // Initial width 8: each region starts a new row below the previous one
        assert_eq!(xs, vec![0, 0, 0]);
        assert_eq!(ys, vec![0, 4, 8]);
        assert_disjoint(&result);
    }

    #[test]
    fn test_zero_size_is_invalid() {
        let err = AtlasPacker::default().pack(&[(4, 4), (0, 4)]).unwrap_err();
        assert!(matches!(err, BakeError::InvalidInput(_)));
    }

    #[test]
    fn test_fill_factor_bounds() {
        assert!(PackOptions::with_fill_factor(0.0).is_err());
        assert!(PackOptions::with_fill_factor(1.5).is_err());
        assert!(PackOptions::with_fill_factor(f32::NAN).is_err());
        assert!(PackOptions::with_fill_factor(1.0).is_ok());
    }

    #[test]
    fn test_overlap_edges() {
        let a = Rect::new(0, 0, 4, 4);
        assert!(!a.overlaps(&Rect::new(4, 0, 4, 4)));
        assert!(!a.overlaps(&Rect::new(0, 4, 4, 4)));
        assert!(a.overlaps(&Rect::new(3, 3, 4, 4)));
    }
}
